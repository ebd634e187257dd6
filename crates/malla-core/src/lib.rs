//! malla-core - the grid interpreter, its snapshot pool, and the lock-free
//! queue that ferries ownership of a snapshot between an editor thread and
//! an audio thread.
//!
//! # Model
//!
//! - [`model::Model`] - one full program snapshot: frame counter, RNG state,
//!   36 registers, and the `WIDTH`x`HEIGHT` cell grid.
//! - [`model::Value`] - the token occupying one cell or register: a [`model::Tag`],
//!   a power flag, a render-only pulse flag, and a literal payload.
//! - [`model::Graph`] - the per-step record of what every operator read and wrote,
//!   kept purely for introspection.
//!
//! # Evaluation
//!
//! - [`interp::step`] - advance a [`model::Model`] by one beat.
//!
//! # Persistence
//!
//! - [`storage::ModelStorage`] - bit-exact on-disk encoding of a [`model::Model`]'s
//!   registers and map.
//!
//! # Concurrency
//!
//! - [`queue::Producer`]/[`queue::Consumer`] - the split halves of a
//!   fixed-capacity lock-free single-producer/single-consumer ring buffer.
//! - [`pool::SnapshotProducer`]/[`pool::SnapshotConsumer`] - N pre-allocated
//!   [`model::Model`] slots, circulated between threads by moving ownership
//!   through a pair of [`queue`]s.
//! - [`message`] - the control- and input-queue message types passed across
//!   that boundary.
//!
//! # Shared DSP primitives
//!
//! - [`one_pole::OnePole`] - one-pole lowpass, the envelope and reverb damping building block.
//! - [`delay::FixedDelayLine`], [`delay::InterpolatedDelay`] - delay lines with
//!   optional fractional-sample interpolation.
//! - [`tempo::beat_period_samples`] - BPM to samples-per-beat conversion.
//! - [`rng::Pcg32`] - the PCG32 generator embedded in every `Model`.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature in
//! your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! malla-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod delay;
pub mod interp;
pub mod math;
pub mod message;
pub mod model;
pub mod one_pole;
#[cfg(feature = "std")]
pub mod pool;
#[cfg(feature = "std")]
pub mod queue;
pub mod rng;
#[cfg(feature = "std")]
pub mod storage;
pub mod tempo;

pub use delay::{FixedDelayLine, InterpolatedDelay, Interpolation};
pub use interp::step;
pub use math::{clamp, flush_denormal, lerp, wet_dry_mix, wet_dry_mix_stereo};
pub use message::{ControlMessage, InputMessage};
pub use model::{
    Direction, Graph, GraphEdge, GraphEdgeTag, Model, Point, RADIX, Tag, Value, GRAPH_EDGES,
    HEIGHT, WIDTH,
};
pub use one_pole::OnePole;
#[cfg(feature = "std")]
pub use pool::{SnapshotConsumer, SnapshotProducer};
#[cfg(feature = "std")]
pub use queue::{Consumer, Producer};
pub use rng::Pcg32;
#[cfg(feature = "std")]
pub use storage::{ModelStorage, StorageError};
pub use tempo::beat_period_samples;
