//! Loaded sounds: the data a `SAMPLER` cell reads from.
//!
//! A [`Sound`] is an immutable, interleaved-stereo buffer loaded once from a
//! WAV file and handed to the audio thread via a control message; per spec
//! it is never mutated again for the lifetime of its use. A [`Palette`] maps
//! the 36 register digits to at most one [`Sound`] each and implements
//! [`SoundSource`] so `malla-synth`'s sampler voices never need to know how
//! sounds were loaded.

use malla_core::model::RADIX;
use malla_synth::SoundSource;

use crate::{Error, Result};

/// An immutable, interleaved-stereo sample buffer.
#[derive(Debug, Clone)]
pub struct Sound {
    frames: u32,
    samples: Vec<f32>,
}

impl Sound {
    /// Build a sound from already-interleaved stereo samples.
    ///
    /// `samples.len()` must be even (`frames = samples.len() / 2`).
    pub fn from_interleaved_stereo(samples: Vec<f32>) -> Self {
        let frames = (samples.len() / 2) as u32;
        Self { frames, samples }
    }

    /// Number of stereo frames.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// The raw interleaved `[L0, R0, L1, R1, ...]` buffer.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Load a sound from a WAV file.
    ///
    /// Per spec, mono sources are rejected by the loader before they ever
    /// reach the audio thread; only stereo files are accepted.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path).map_err(Error::Wav)?;
        let spec = reader.spec();

        if spec.channels != 2 {
            return Err(Error::UnsupportedFormat(format!(
                "{}: sampler sounds must be stereo, found {} channel(s)",
                path.display(),
                spec.channels
            )));
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(Error::Wav)?,
            hound::SampleFormat::Int => {
                let max = f64::from(1i64 << (spec.bits_per_sample - 1));
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| (f64::from(v) / max) as f32))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(Error::Wav)?
            }
        };

        tracing::info!(
            path = %path.display(),
            frames = samples.len() / 2,
            sample_rate = spec.sample_rate,
            "loaded sampler sound"
        );

        Ok(Self::from_interleaved_stereo(samples))
    }
}

/// The 36 sampler slots, each holding at most one loaded [`Sound`].
#[derive(Debug, Clone, Default)]
pub struct Palette {
    sounds: Vec<Option<Sound>>,
}

impl Palette {
    /// An empty palette with every slot unset.
    pub fn new() -> Self {
        Self {
            sounds: (0..RADIX).map(|_| None).collect(),
        }
    }

    /// Install `sound` into `slot`, replacing whatever was there.
    ///
    /// No-op if `slot` is out of range (`>= RADIX`).
    pub fn set(&mut self, slot: u8, sound: Sound) {
        if let Some(entry) = self.sounds.get_mut(slot as usize) {
            *entry = Some(sound);
        }
    }

    /// The sound loaded into `slot`, if any.
    pub fn get(&self, slot: u8) -> Option<&Sound> {
        self.sounds.get(slot as usize).and_then(Option::as_ref)
    }
}

impl SoundSource for Palette {
    fn frames(&self, slot: u8) -> &[f32] {
        self.get(slot).map_or(&[], Sound::samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_palette_reports_no_frames_for_any_slot() {
        let palette = Palette::new();
        assert!(palette.frames(0).is_empty());
        assert!(palette.frames(35).is_empty());
    }

    #[test]
    fn set_then_get_round_trips_a_sound() {
        let mut palette = Palette::new();
        let sound = Sound::from_interleaved_stereo(vec![0.1, -0.1, 0.2, -0.2]);
        palette.set(3, sound);
        assert_eq!(palette.get(3).unwrap().frames(), 2);
        assert_eq!(palette.frames(3).len(), 4);
    }

    #[test]
    fn out_of_range_slot_is_a_no_op() {
        let mut palette = Palette::new();
        let sound = Sound::from_interleaved_stereo(vec![0.0, 0.0]);
        palette.set(200, sound);
        assert!(palette.frames(200).is_empty());
    }

    #[test]
    fn mono_wav_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        let err = Sound::load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn stereo_wav_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..10 {
            writer.write_sample(0.5f32).unwrap();
            writer.write_sample(-0.5f32).unwrap();
        }
        writer.finalize().unwrap();

        let sound = Sound::load(&path).unwrap();
        assert_eq!(sound.frames(), 10);
    }
}
