//! The 8-tap modulated-delay reverb for the malla live-coded instrument.
//!
//! - [`Reverb`] - eight randomly-drifting delay lines cross-fed between the
//!   two output channels, each damped by a one-pole lowpass and read through
//!   cubic interpolation.
//!
//! ```rust
//! use malla_effects::Reverb;
//!
//! let mut reverb = Reverb::new(48000);
//! reverb.set_size(0.93);
//! reverb.set_cutoff(10000.0);
//! reverb.set_mix(0.3);
//!
//! let (l, r) = reverb.tick(0.5, 0.5);
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! malla-effects = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod reverb;

pub use reverb::Reverb;
