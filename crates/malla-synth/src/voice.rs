//! Polyphonic voice pools for the two trigger-producing grid operators,
//! `SYNTH` and `SAMPLER`.
//!
//! Both pools are fixed-capacity and allocation-free once built: a
//! [`FreeStack`] of spare voice indices is popped on trigger and pushed back
//! the moment a voice's envelope finishes, with oldest-voice stealing as the
//! fallback once the pool is exhausted — the same shape as a conventional
//! voice manager's round-robin/oldest-note allocation, just without a heap
//! behind it.

use core::f32::consts::PI;

use libm::{powf, sinf};

use crate::envelope::AhrEnvelope;

/// `freq = 440 * 2^((semitone - 33) / 12)`.
#[inline]
pub fn semitone_to_freq(semitone: i32) -> f32 {
    440.0 * powf(2.0, (semitone as f32 - 33.0) / 12.0)
}

/// A fixed-capacity stack of free voice indices, `0..N`, all free initially.
struct FreeStack<const N: usize> {
    items: [usize; N],
    top: usize,
}

impl<const N: usize> FreeStack<N> {
    fn full() -> Self {
        let mut items = [0usize; N];
        for (i, slot) in items.iter_mut().enumerate() {
            *slot = i;
        }
        Self { items, top: N }
    }

    fn pop(&mut self) -> Option<usize> {
        if self.top == 0 {
            None
        } else {
            self.top -= 1;
            Some(self.items[self.top])
        }
    }

    fn push(&mut self, idx: usize) {
        if self.top < N {
            self.items[self.top] = idx;
            self.top += 1;
        }
    }
}

/// A single tone-generator voice: a sine oscillator gated by an
/// [`AhrEnvelope`].
///
/// The oscillator's phase is `freq * PI * frame / sample_rate` rather than
/// the usual `2 * PI * freq * t` — a quirk carried over deliberately from
/// the reference implementation rather than "corrected" away.
#[derive(Debug, Clone)]
pub struct SynthVoice {
    envelope: AhrEnvelope,
    freq: f32,
    volume: f32,
    frame: u64,
}

impl SynthVoice {
    pub fn new(envelope_coefficient: f32, envelope_exponent: f32) -> Self {
        Self {
            envelope: AhrEnvelope::new(envelope_coefficient, envelope_exponent),
            freq: 0.0,
            volume: 0.0,
            frame: 0,
        }
    }

    pub fn trigger(
        &mut self,
        semitone: i32,
        attack_p: i32,
        hold_p: i32,
        release_p: i32,
        volume: f32,
    ) {
        self.freq = semitone_to_freq(semitone);
        self.volume = volume;
        self.frame = 0;
        self.envelope.trigger(attack_p, hold_p, release_p);
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn set_envelope_globals(&mut self, coefficient: f32, exponent: f32) {
        self.envelope.set_globals(coefficient, exponent);
    }

    #[inline]
    pub fn process(&mut self, sample_rate: f32) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }
        let phase = self.freq * PI * (self.frame as f32) / sample_rate;
        self.frame = self.frame.wrapping_add(1);
        let env = self.envelope.advance();
        sinf(phase) * env * self.volume
    }
}

/// Where a [`SamplerVoice`] reads its interleaved stereo frames from.
/// Implemented by the palette so the voice pool never needs to know how
/// sounds are loaded or stored.
pub trait SoundSource {
    /// Interleaved stereo `f32` samples for `slot`, or an empty slice if the
    /// slot holds nothing.
    fn frames(&self, slot: u8) -> &[f32];
}

/// A single sample-playback voice: reads through a loaded sound at a
/// pitch-shifted rate with linear interpolation, gated by an [`AhrEnvelope`].
#[derive(Debug, Clone)]
pub struct SamplerVoice {
    envelope: AhrEnvelope,
    slot: u8,
    start_fraction: f64,
    started: bool,
    position: f64,
    rate: f64,
    volume: f32,
}

impl SamplerVoice {
    pub fn new(envelope_coefficient: f32, envelope_exponent: f32) -> Self {
        Self {
            envelope: AhrEnvelope::new(envelope_coefficient, envelope_exponent),
            slot: 0,
            start_fraction: 0.0,
            started: false,
            position: 0.0,
            rate: 1.0,
            volume: 0.0,
        }
    }

    /// `start_fraction` is where in the sound playback begins, as a fraction
    /// of the sound's total frame count (the west trigger cell's "offset"
    /// parameter, already divided down from its raw `R`-ths reading).
    pub fn trigger(
        &mut self,
        slot: u8,
        start_fraction: f64,
        pitch_offset: i32,
        attack_p: i32,
        hold_p: i32,
        release_p: i32,
        volume: f32,
    ) {
        self.slot = slot;
        self.start_fraction = start_fraction;
        self.started = false;
        self.position = 0.0;
        self.rate = f64::from(powf(2.0, pitch_offset as f32 / 12.0));
        self.volume = volume;
        self.envelope.trigger(attack_p, hold_p, release_p);
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn set_envelope_globals(&mut self, coefficient: f32, exponent: f32) {
        self.envelope.set_globals(coefficient, exponent);
    }

    #[inline]
    pub fn process_stereo(&mut self, frames: &[f32]) -> (f32, f32) {
        let frame_count = frames.len() / 2;
        if frame_count < 2 || !self.envelope.is_active() {
            return (0.0, 0.0);
        }

        if !self.started {
            self.position = self.start_fraction * frame_count as f64;
            self.started = true;
        }

        let idx = self.position as usize;
        if idx >= frame_count - 1 {
            // Ran off the end of the sound: cut the voice.
            self.envelope.force_idle();
            return (0.0, 0.0);
        }

        let frac = (self.position - idx as f64) as f32;
        let (l0, r0) = (frames[idx * 2], frames[idx * 2 + 1]);
        let (l1, r1) = (frames[(idx + 1) * 2], frames[(idx + 1) * 2 + 1]);
        let l = l0 + (l1 - l0) * frac;
        let r = r0 + (r1 - r0) * frac;

        self.position += self.rate;
        let env = self.envelope.advance();
        (l * env * self.volume, r * env * self.volume)
    }
}

/// A fixed-capacity pool of [`SynthVoice`]s.
#[derive(Debug)]
pub struct SynthVoicePool<const N: usize> {
    voices: [SynthVoice; N],
    ages: [u64; N],
    free: FreeStack<N>,
    age_counter: u64,
}

impl<const N: usize> SynthVoicePool<N> {
    pub fn new(envelope_coefficient: f32, envelope_exponent: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| SynthVoice::new(envelope_coefficient, envelope_exponent)),
            ages: [0; N],
            free: FreeStack::full(),
            age_counter: 0,
        }
    }

    /// Trigger a new voice, stealing the oldest one if the pool is full.
    pub fn trigger(&mut self, semitone: i32, attack_p: i32, hold_p: i32, release_p: i32, volume: f32) {
        let idx = self.free.pop().unwrap_or_else(|| {
            (0..N).min_by_key(|&i| self.ages[i]).unwrap_or(0)
        });
        self.age_counter += 1;
        self.ages[idx] = self.age_counter;
        self.voices[idx].trigger(semitone, attack_p, hold_p, release_p, volume);
    }

    /// Sum every active voice's output for one sample and reclaim any voice
    /// that finished on this sample.
    pub fn process(&mut self, sample_rate: f32) -> f32 {
        let mut out = 0.0;
        for i in 0..N {
            if self.voices[i].is_active() {
                out += self.voices[i].process(sample_rate);
                if !self.voices[i].is_active() {
                    self.free.push(i);
                }
            }
        }
        out
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Broadcast a new envelope time-constant scale/exponent to every voice.
    pub fn set_envelope_globals(&mut self, coefficient: f32, exponent: f32) {
        for voice in &mut self.voices {
            voice.set_envelope_globals(coefficient, exponent);
        }
    }
}

/// A fixed-capacity pool of [`SamplerVoice`]s.
#[derive(Debug)]
pub struct SamplerVoicePool<const N: usize> {
    voices: [SamplerVoice; N],
    ages: [u64; N],
    free: FreeStack<N>,
    age_counter: u64,
}

impl<const N: usize> SamplerVoicePool<N> {
    pub fn new(envelope_coefficient: f32, envelope_exponent: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| SamplerVoice::new(envelope_coefficient, envelope_exponent)),
            ages: [0; N],
            free: FreeStack::full(),
            age_counter: 0,
        }
    }

    pub fn trigger(
        &mut self,
        slot: u8,
        start_fraction: f64,
        pitch_offset: i32,
        attack_p: i32,
        hold_p: i32,
        release_p: i32,
        volume: f32,
    ) {
        let idx = self.free.pop().unwrap_or_else(|| {
            (0..N).min_by_key(|&i| self.ages[i]).unwrap_or(0)
        });
        self.age_counter += 1;
        self.ages[idx] = self.age_counter;
        self.voices[idx].trigger(slot, start_fraction, pitch_offset, attack_p, hold_p, release_p, volume);
    }

    pub fn process_stereo(&mut self, source: &impl SoundSource) -> (f32, f32) {
        let mut out = (0.0, 0.0);
        for i in 0..N {
            if self.voices[i].is_active() {
                let frames = source.frames(self.voices[i].slot());
                let (l, r) = self.voices[i].process_stereo(frames);
                out.0 += l;
                out.1 += r;
                if !self.voices[i].is_active() {
                    self.free.push(i);
                }
            }
        }
        out
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Broadcast a new envelope time-constant scale/exponent to every voice.
    pub fn set_envelope_globals(&mut self, coefficient: f32, exponent: f32) {
        for voice in &mut self.voices {
            voice.set_envelope_globals(coefficient, exponent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semitone_reference_pitch() {
        // semitone 33 is the reference: 440 Hz.
        assert!((semitone_to_freq(33) - 440.0).abs() < 0.01);
    }

    #[test]
    fn semitone_one_octave_up_doubles_frequency() {
        let low = semitone_to_freq(33);
        let high = semitone_to_freq(45);
        assert!((high - low * 2.0).abs() < 0.1);
    }

    #[test]
    fn synth_voice_silent_until_triggered() {
        let mut voice = SynthVoice::new(0.0625, 0.144_764_8);
        assert!(!voice.is_active());
        assert_eq!(voice.process(48000.0), 0.0);
    }

    #[test]
    fn synth_voice_produces_output_once_triggered() {
        let mut voice = SynthVoice::new(0.0625, 0.144_764_8);
        voice.trigger(33, 5, 5, 5, 1.0);
        assert!(voice.is_active());
        let mut sum = 0.0;
        for _ in 0..2000 {
            sum += voice.process(48000.0).abs();
        }
        assert!(sum > 0.0);
    }

    #[test]
    fn synth_pool_steals_oldest_when_full() {
        let mut pool: SynthVoicePool<2> = SynthVoicePool::new(0.0625, 0.144_764_8);
        pool.trigger(33, 30, 30, 30, 1.0);
        pool.trigger(40, 30, 30, 30, 1.0);
        assert_eq!(pool.active_voice_count(), 2);
        pool.trigger(45, 30, 30, 30, 1.0);
        assert_eq!(pool.active_voice_count(), 2);
    }

    struct FakeSource<'a>(&'a [f32]);
    impl<'a> SoundSource for FakeSource<'a> {
        fn frames(&self, _slot: u8) -> &[f32] {
            self.0
        }
    }

    #[test]
    fn sampler_voice_interpolates_and_ends_with_the_sound() {
        let frames: [f32; 8] = [0.0, 0.0, 1.0, 1.0, 0.0, 0.0, -1.0, -1.0];
        let mut pool: SamplerVoicePool<1> = SamplerVoicePool::new(0.0625, 0.144_764_8);
        pool.trigger(0, 0.0, 0, 0, 30, 0, 1.0);
        let source = FakeSource(&frames);
        let mut heard_nonzero = false;
        for _ in 0..100 {
            let (l, _r) = pool.process_stereo(&source);
            if l.abs() > 0.0 {
                heard_nonzero = true;
            }
        }
        assert!(heard_nonzero);
        assert_eq!(pool.active_voice_count(), 0);
    }
}
