//! Range checks for [`crate::DspConfig`] fields.

use crate::{DspConfig, Error, Result};

/// Validate every field of `config`, returning the first violation found.
pub fn validate(config: &DspConfig) -> Result<()> {
    if config.tempo_bpm == 0 {
        return Err(Error::Validation {
            field: "tempo_bpm",
            reason: "must be greater than zero",
        });
    }
    if !(0.0..=1.0).contains(&config.global_volume) {
        return Err(Error::Validation {
            field: "global_volume",
            reason: "must be between 0.0 and 1.0",
        });
    }
    if !(0.0..=1.0).contains(&config.reverb_mix) {
        return Err(Error::Validation {
            field: "reverb_mix",
            reason: "must be between 0.0 and 1.0",
        });
    }
    if !(0.0..1.0).contains(&config.reverb_size) {
        return Err(Error::Validation {
            field: "reverb_size",
            reason: "must be between 0.0 and just under 1.0",
        });
    }
    if config.reverb_cutoff_hz <= 0.0 {
        return Err(Error::Validation {
            field: "reverb_cutoff_hz",
            reason: "must be greater than zero",
        });
    }
    if config.envelope_coefficient <= 0.0 {
        return Err(Error::Validation {
            field: "envelope_coefficient",
            reason: "must be greater than zero",
        });
    }
    Ok(())
}
