//! Attack/Hold/Release envelope generator.
//!
//! Unlike a gated ADSR, an AHR envelope is a one-shot: a trigger starts it
//! at `Attack` and it runs to `Idle` on its own, which is what a grid
//! trigger (a `SYNTH`/`SAMPLER` cell firing) needs — there is no separate
//! note-off. Attack and Release are exponential one-pole approaches to
//! their target; Hold pins the level at its peak for a fixed sample count.
//! All three segment durations come from the same formula, `c * exp(e *
//! p)`, with `p` the segment's 0..36 grid parameter and `c`/`e` global DSP
//! settings shared by every voice.

use libm::expf;

/// How close `level` must get to its target before a segment completes.
const EPSILON: f32 = 5.0e-8;

/// AHR envelope stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Not running — output is zero.
    #[default]
    Idle,
    /// Ramping up toward 1.0.
    Attack,
    /// Pinned at 1.0 for `hold_samples`.
    Hold,
    /// Ramping down toward 0.0.
    Release,
}

/// A one-shot attack/hold/release envelope.
#[derive(Debug, Clone)]
pub struct AhrEnvelope {
    stage: EnvelopeStage,
    level: f32,

    coefficient: f32,
    exponent: f32,

    attack_p: i32,
    hold_p: i32,
    release_p: i32,

    attack_coeff: f32,
    release_coeff: f32,
    hold_samples: u32,
    hold_remaining: u32,

    dirty: bool,
}

impl AhrEnvelope {
    /// Build an idle envelope with the given global time-constant settings.
    pub fn new(coefficient: f32, exponent: f32) -> Self {
        let mut env = Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            coefficient,
            exponent,
            attack_p: 0,
            hold_p: 0,
            release_p: 0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            hold_samples: 0,
            hold_remaining: 0,
            dirty: true,
        };
        env.recompute();
        env
    }

    /// Replace both global settings at once.
    pub fn set_globals(&mut self, coefficient: f32, exponent: f32) {
        self.coefficient = coefficient;
        self.exponent = exponent;
        self.dirty = true;
    }

    /// Replace the global time-constant scale. Takes effect on the next
    /// [`Self::trigger`], not mid-segment.
    pub fn set_coefficient(&mut self, coefficient: f32) {
        self.coefficient = coefficient;
        self.dirty = true;
    }

    /// Replace the global per-segment exponent. Takes effect on the next
    /// [`Self::trigger`], not mid-segment.
    pub fn set_exponent(&mut self, exponent: f32) {
        self.exponent = exponent;
        self.dirty = true;
    }

    /// Time constant (samples) for a segment parameter `p` in `[0, 36)`.
    fn tau(&self, p: i32) -> f32 {
        self.coefficient * expf(self.exponent * p as f32)
    }

    fn recompute(&mut self) {
        let attack_tau = self.tau(self.attack_p).max(1.0);
        self.attack_coeff = expf(-1.0 / attack_tau);

        let release_tau = self.tau(self.release_p).max(1.0);
        self.release_coeff = expf(-1.0 / release_tau);

        self.hold_samples = self.tau(self.hold_p).max(0.0).round() as u32;
        self.dirty = false;
    }

    /// Start a fresh attack/hold/release cycle with the given grid
    /// parameters (each `0..36`). Recomputes coefficients only if they, or
    /// the global settings, changed since the last trigger.
    pub fn trigger(&mut self, attack_p: i32, hold_p: i32, release_p: i32) {
        if self.dirty || attack_p != self.attack_p || hold_p != self.hold_p || release_p != self.release_p {
            self.attack_p = attack_p;
            self.hold_p = hold_p;
            self.release_p = release_p;
            self.recompute();
        }
        self.level = 0.0;
        self.stage = EnvelopeStage::Attack;
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Whether the envelope is doing anything (not idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Cut the envelope to silence immediately, regardless of stage.
    pub fn force_idle(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
    }

    /// Advance by one sample and return the new level.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.level = 1.0 + (self.level - 1.0) * self.attack_coeff;
                if (self.level - 1.0).abs() < EPSILON {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Hold;
                    self.hold_remaining = self.hold_samples;
                }
            }
            EnvelopeStage::Hold => {
                self.level = 1.0;
                if self.hold_remaining == 0 {
                    self.stage = EnvelopeStage::Release;
                } else {
                    self.hold_remaining -= 1;
                }
            }
            EnvelopeStage::Release => {
                self.level *= self.release_coeff;
                if self.level.abs() < EPSILON {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }
        self.level
    }
}

impl Default for AhrEnvelope {
    fn default() -> Self {
        Self::new(0.0625, 0.144_764_8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_stays_at_zero() {
        let mut env = AhrEnvelope::default();
        for _ in 0..100 {
            assert_eq!(env.advance(), 0.0);
        }
    }

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut env = AhrEnvelope::default();
        env.trigger(10, 10, 10);
        assert_eq!(env.stage(), EnvelopeStage::Attack);

        let mut seen_hold = false;
        let mut seen_release = false;
        for _ in 0..200_000 {
            env.advance();
            match env.stage() {
                EnvelopeStage::Hold => seen_hold = true,
                EnvelopeStage::Release => seen_release = true,
                EnvelopeStage::Idle => break,
                EnvelopeStage::Attack => {}
            }
        }
        assert!(seen_hold, "expected a Hold stage");
        assert!(seen_release, "expected a Release stage");
        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn zero_hold_parameter_skips_straight_to_release() {
        let mut env = AhrEnvelope::default();
        env.trigger(0, 0, 20);
        for _ in 0..10_000 {
            env.advance();
            if env.stage() == EnvelopeStage::Release {
                return;
            }
        }
        panic!("never reached Release");
    }

    #[test]
    fn higher_parameter_makes_a_longer_attack() {
        let mut short = AhrEnvelope::default();
        let mut long = AhrEnvelope::default();
        short.trigger(0, 0, 0);
        long.trigger(35, 0, 0);

        let mut short_attack_samples = 0;
        while short.stage() == EnvelopeStage::Attack {
            short.advance();
            short_attack_samples += 1;
        }
        let mut long_attack_samples = 0;
        while long.stage() == EnvelopeStage::Attack {
            long.advance();
            long_attack_samples += 1;
        }
        assert!(long_attack_samples > short_attack_samples);
    }

    #[test]
    fn retrigger_with_same_parameters_does_not_recompute() {
        let mut env = AhrEnvelope::default();
        env.trigger(5, 5, 5);
        let coeff_before = env.attack_coeff;
        env.trigger(5, 5, 5);
        assert_eq!(env.attack_coeff, coeff_before);
    }

    #[test]
    fn level_stays_in_unit_range() {
        let mut env = AhrEnvelope::default();
        env.trigger(15, 4, 15);
        for _ in 0..50_000 {
            let level = env.advance();
            assert!((0.0..=1.0).contains(&level), "level out of range: {level}");
        }
    }
}
