//! Persisted defaults for the malla instrument's DSP global state.
//!
//! [`DspConfig`] mirrors the fields of the instrument's DSP global state
//! (tempo, global volume, AHR envelope shape, reverb) as a `serde`-derived
//! struct loaded from a TOML file on startup. It never talks to the audio
//! thread directly; `malla-cli` loads it, validates it, and turns it into
//! an initial batch of `malla_core::message::ControlMessage`s pushed onto
//! the control queue before the stream starts.

mod error;

/// Platform-specific paths for the user config file.
pub mod paths;

/// Range validation for [`DspConfig`] fields.
pub mod validation;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};

/// The DSP global state's initial/persisted values.
///
/// Every field defaults independently (`#[serde(default)]`), so a config
/// file only needs to name the fields it wants to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DspConfig {
    /// Tempo, in beats (quarter notes) per minute.
    #[serde(default = "defaults::tempo_bpm")]
    pub tempo_bpm: u32,

    /// Output gain applied after mixing, where `1.0` is unity.
    #[serde(default = "defaults::global_volume")]
    pub global_volume: f32,

    /// AHR envelope time-constant scale `c` in `tau = c * e^(e * p)`.
    #[serde(default = "defaults::envelope_coefficient")]
    pub envelope_coefficient: f32,

    /// AHR envelope per-segment exponent `e` in `tau = c * e^(e * p)`.
    #[serde(default = "defaults::envelope_exponent")]
    pub envelope_exponent: f32,

    /// Whether the reverb send is active.
    #[serde(default)]
    pub reverb_on: bool,

    /// Reverb wet/dry mix, `0.0` dry to `1.0` fully wet.
    #[serde(default)]
    pub reverb_mix: f32,

    /// Reverb feedback/size parameter, `0.0` to just under `1.0`.
    #[serde(default = "defaults::reverb_size")]
    pub reverb_size: f32,

    /// Reverb damping filter cutoff, in Hz.
    #[serde(default = "defaults::reverb_cutoff_hz")]
    pub reverb_cutoff_hz: f32,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: defaults::tempo_bpm(),
            global_volume: defaults::global_volume(),
            envelope_coefficient: defaults::envelope_coefficient(),
            envelope_exponent: defaults::envelope_exponent(),
            reverb_on: false,
            reverb_mix: 0.0,
            reverb_size: defaults::reverb_size(),
            reverb_cutoff_hz: defaults::reverb_cutoff_hz(),
        }
    }
}

impl DspConfig {
    /// Parse a config from TOML text, without validating it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load and validate a config file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Range-check every field, matching the ranges spec.md and the
    /// original's message handlers implicitly assume.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

mod defaults {
    pub fn tempo_bpm() -> u32 {
        120
    }
    pub fn global_volume() -> f32 {
        1.0
    }
    /// Recovered from `sim_init`'s envelope defaults.
    pub fn envelope_coefficient() -> f32 {
        0.0625
    }
    pub fn envelope_exponent() -> f32 {
        0.144_764_8
    }
    pub fn reverb_size() -> f32 {
        0.93
    }
    pub fn reverb_cutoff_hz() -> f32 {
        10000.0
    }
}
