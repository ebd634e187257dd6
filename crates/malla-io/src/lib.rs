//! Audio device plumbing, sound loading, and program file I/O for the malla
//! live-coded instrument.
//!
//! - [`device`] — `cpal`-backed output device enumeration and realtime
//!   streaming ([`AudioStream`]).
//! - [`palette`] — loaded [`palette::Sound`]s and the [`palette::Palette`]
//!   that feeds `malla-synth`'s sampler voices.
//! - [`program`] — [`program::load_program`]/[`program::save_program`],
//!   wrapping `malla-core`'s on-disk codec with real file handles.

pub mod device;
pub mod palette;
pub mod program;

pub use device::{AudioDevice, AudioStream, StreamConfig, default_device, list_devices};
pub use palette::{Palette, Sound};
pub use program::{load_program, save_program};

/// Errors from device setup, sound loading, or program file I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("no audio output device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Persisted-program codec error.
    #[error(transparent)]
    Storage(#[from] malla_core::storage::StorageError),

    /// Standard I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
