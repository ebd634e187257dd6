//! AHR envelope generator, synth/sampler voice pools, and the audio-thread
//! mixer step for the malla live-coded instrument.
//!
//! # Envelope
//!
//! - [`AhrEnvelope`] / [`EnvelopeStage`] - one-shot attack/hold/release
//!
//! ```rust
//! use malla_synth::AhrEnvelope;
//!
//! let mut env = AhrEnvelope::new(0.0625, 0.144_764_8);
//! env.trigger(10, 5, 20);
//! let level = env.advance();
//! ```
//!
//! # Voices
//!
//! - [`SynthVoice`] / [`SynthVoicePool`] - sine-tone voices driven by `SYNTH` cells
//! - [`SamplerVoice`] / [`SamplerVoicePool`] - playback voices driven by `SAMPLER` cells
//! - [`SoundSource`] - decouples sampler playback from sound storage
//!
//! # Engine
//!
//! [`AudioEngine`] ties the grid interpreter, the beat clock, and both voice
//! pools together into the one call a real-time audio callback makes per
//! sample. With the `std` feature, [`engine::editor`] additionally provides
//! [`engine::editor::EditorHandle`] and [`engine::editor::AudioHandle`], a
//! lock-free pair of handles built by [`engine::editor::channel`] that split
//! ownership of a snapshot pool and message queues between an editor thread
//! and the audio thread.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! malla-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod engine;
pub mod envelope;
pub mod voice;

pub use engine::AudioEngine;
pub use envelope::{AhrEnvelope, EnvelopeStage};
pub use voice::{
    SamplerVoice, SamplerVoicePool, SoundSource, SynthVoice, SynthVoicePool, semitone_to_freq,
};
