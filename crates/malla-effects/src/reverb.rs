//! Eight-line modulated-delay reverberator.
//!
//! Each of the eight lines holds a delay buffer whose read position drifts
//! continuously: every `sr / randfreq` samples the line picks a new target
//! delay time (current position plus a small random offset scaled by the
//! line's drift amount) and slides its read pointer toward it at a constant
//! rate until the next retarget. Reading at a 28-bit fixed-point fractional
//! position with 4-point cubic interpolation, then damping through a
//! one-pole lowpass shared across all eight lines, is what turns that drift
//! into a smooth, non-metallic tail instead of a flanging comb filter.
//!
//! Even-indexed lines feed the left output, odd-indexed lines the right.
//! Every line additionally reads a small amount of the previous sample's
//! combined output from all eight lines (`jp`, one quarter of their sum) fed
//! back into both channels' input — this cross-feed is what keeps the eight
//! lines from decaying independently.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use libm::{cosf, floorf, sqrtf};

/// Per-line tuning: base delay (samples at a 44.1 kHz reference), drift
/// depth (tenths of a millisecond), retarget rate (millihertz), and the
/// line's starting LCG seed.
struct LineParams {
    delay: i32,
    drift: i32,
    randfreq: i32,
    seed: i32,
}

const PARAMS: [LineParams; 8] = [
    LineParams { delay: 0x09a9, drift: 0x0a, randfreq: 0x0c1c, seed: 0x07ae },
    LineParams { delay: 0x0acf, drift: 0x0b, randfreq: 0x0dac, seed: 0x7333 },
    LineParams { delay: 0x0c91, drift: 0x11, randfreq: 0x0456, seed: 0x5999 },
    LineParams { delay: 0x0de5, drift: 0x06, randfreq: 0x0f85, seed: 0x2666 },
    LineParams { delay: 0x0f43, drift: 0x0a, randfreq: 0x0925, seed: 0x50a3 },
    LineParams { delay: 0x101f, drift: 0x0b, randfreq: 0x0769, seed: 0x5999 },
    LineParams { delay: 0x085f, drift: 0x11, randfreq: 0x037b, seed: 0x7333 },
    LineParams { delay: 0x078d, drift: 0x06, randfreq: 0x0c95, seed: 0x3851 },
];

/// Width, in bits, of the fractional part of a read position.
const FRAC_BITS: u32 = 28;
/// `1 << FRAC_BITS`: a whole sample step in fixed-point units.
const FRAC_SCALE: i64 = 1 << FRAC_BITS;
/// Mask isolating the fractional part of a fixed-point position.
const FRAC_MASK: i64 = FRAC_SCALE - 1;

fn delay_buffer_len(p: &LineParams, sample_rate: u32) -> usize {
    let seconds = p.delay as f32 / 44_100.0 + (p.drift as f32 * 0.0001) * 1.125;
    floorf(16.0 + seconds * sample_rate as f32) as usize
}

/// One of the eight drifting delay lines.
struct Line {
    buf: Vec<f32>,
    wpos: i64,
    irpos: i64,
    frpos: i64,
    rng: i32,
    inc: i64,
    counter: i64,
    maxcount: i64,
    /// Base delay time in seconds.
    dels: f32,
    /// Drift depth, tenths of a millisecond.
    drift: f32,
    /// Last output, also the feedback state for the damping lowpass.
    y: f32,
}

impl Line {
    fn new(p: &LineParams, sample_rate: u32) -> Self {
        let sz = delay_buffer_len(p, sample_rate);
        let mut line = Self {
            buf: vec![0.0; sz],
            wpos: 0,
            irpos: 0,
            frpos: 0,
            rng: p.seed,
            inc: 0,
            counter: 0,
            maxcount: floorf(sample_rate as f32 / (p.randfreq as f32 * 0.001)) as i64,
            dels: p.delay as f32 / 44_100.0,
            drift: p.drift as f32,
            y: 0.0,
        };

        let mut readpos = p.delay as f32 / 44_100.0;
        readpos += line.rng as f32 * (p.drift as f32 * 0.0001) / 32_768.0;
        readpos = sz as f32 - readpos * sample_rate as f32;
        line.irpos = floorf(readpos) as i64;
        line.frpos = (floorf((readpos - line.irpos as f32) * FRAC_SCALE as f32)) as i64;

        line.retarget(sample_rate);
        line
    }

    /// Pick a new target delay time and set `inc` so the read position
    /// slides there over the next `maxcount` samples. Advances the line's
    /// own 16-bit LCG, matching the original's `1 + rng * 0x3d09 (mod
    /// 2^16)`, folded back into the signed `-0x8000..0x8000` range.
    fn retarget(&mut self, sample_rate: u32) {
        if self.rng < 0 {
            self.rng += 0x10000;
        }
        self.rng = (1 + self.rng.wrapping_mul(0x3d09)) & 0xFFFF;
        if self.rng >= 0x8000 {
            self.rng -= 0x10000;
        }
        self.counter = self.maxcount;

        let sz = self.buf.len() as i64;
        let mut cur_delay = self.wpos - (self.irpos + self.frpos / FRAC_SCALE);
        while cur_delay < 0 {
            cur_delay += sz;
        }
        let cur_delay = cur_delay as f32 / sample_rate as f32;

        let next_delay = (self.rng as f32 * (self.drift * 0.0001) / 32_768.0) + self.dels;
        let mut inc = ((cur_delay - next_delay) / self.counter as f32) * sample_rate as f32;
        inc += 1.0;
        self.inc = floorf(inc * FRAC_SCALE as f32) as i64;
    }

    /// Write `input`, read back through cubic interpolation at the current
    /// drifting position, damp with the shared one-pole coefficient `filt`,
    /// and scale the feedback path by `size`.
    fn tick(&mut self, input: f32, size: f32, filt: f32, sample_rate: u32) -> f32 {
        let sz = self.buf.len() as i64;

        self.buf[self.wpos as usize] = input - self.y;
        self.wpos += 1;
        if self.wpos >= sz {
            self.wpos -= sz;
        }

        if self.frpos >= FRAC_SCALE {
            self.irpos += self.frpos >> FRAC_BITS;
            self.frpos &= FRAC_MASK;
        }
        if self.irpos >= sz {
            self.irpos -= sz;
        }

        let frac = self.frpos as f32 / FRAC_SCALE as f32;
        let d = (frac * frac - 1.0) / 6.0;
        let tmp0 = (frac + 1.0) * 0.5;
        let tmp1 = 3.0 * d;
        let a = tmp0 - 1.0 - d;
        let c = tmp0 - tmp1;
        let b = tmp1 - frac;

        let n = self.irpos as usize;
        let s = if n > 0 && n < self.buf.len() - 2 {
            [self.buf[n - 1], self.buf[n], self.buf[n + 1], self.buf[n + 2]]
        } else {
            let len = self.buf.len();
            let mut idx = n as i64 - 1;
            if idx < 0 {
                idx += len as i64;
            }
            let mut out = [0.0f32; 4];
            out[0] = self.buf[idx as usize];
            for slot in out.iter_mut().skip(1) {
                idx += 1;
                if idx as usize >= len {
                    idx -= len as i64;
                }
                *slot = self.buf[idx as usize];
            }
            out
        };

        let mut out = (a * s[0] + b * s[1] + c * s[2] + d * s[3]) * frac + s[1];
        self.frpos += self.inc;

        out *= size;
        out += (self.y - out) * filt;
        self.y = out;

        self.counter -= 1;
        if self.counter <= 0 {
            self.retarget(sample_rate);
        }

        out
    }
}

/// An 8-line modulated-delay reverberator.
///
/// `size` scales each line's feedback (higher sustains longer), `cutoff`
/// sets a shared one-pole damping filter's corner frequency, and `mix`
/// crossfades between the dry input and the wet reverb tail. Mutating
/// `cutoff` only recomputes the filter coefficient when the value actually
/// changes.
pub struct Reverb {
    lines: [Line; 8],
    sample_rate: u32,
    size: f32,
    cutoff: f32,
    prev_cutoff: f32,
    filt: f32,
    mix: f32,
    enabled: bool,
}

impl Reverb {
    /// Build a reverb with the reference defaults: `size = 0.93`,
    /// `cutoff = 10000.0` Hz, bypassed (`mix = 0.0`, `enabled = false`).
    pub fn new(sample_rate: u32) -> Self {
        let lines = core::array::from_fn(|i| Line::new(&PARAMS[i], sample_rate));
        let mut reverb = Self {
            lines,
            sample_rate,
            size: 0.93,
            cutoff: 10_000.0,
            prev_cutoff: -1.0,
            filt: 1.0,
            mix: 0.0,
            enabled: false,
        };
        reverb.recompute_filter();
        reverb
    }

    /// Feedback scale per line, typically `0.0..=1.0`; values at or above 1
    /// make the tail grow without bound.
    pub fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    /// Damping filter corner frequency in Hz.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff = cutoff_hz;
    }

    /// Wet/dry mix, `0.0` (bypass) to `1.0` (fully wet).
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Enable or disable the effect. Disabled, `tick` passes its input
    /// through unchanged without advancing any line's state.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn recompute_filter(&mut self) {
        if (self.cutoff - self.prev_cutoff).abs() < f32::EPSILON {
            return;
        }
        self.prev_cutoff = self.cutoff;
        let mut filt = 2.0 - cosf(self.cutoff * core::f32::consts::TAU / self.sample_rate as f32);
        filt -= sqrtf(filt * filt - 1.0);
        self.filt = filt;
    }

    /// Process one stereo frame.
    pub fn tick(&mut self, in_l: f32, in_r: f32) -> (f32, f32) {
        if !self.enabled {
            return (in_l, in_r);
        }
        self.recompute_filter();

        let jp: f32 = self.lines.iter().map(|l| l.y).sum::<f32>() * 0.25;
        let fed_l = in_l + jp;
        let fed_r = in_r + jp;

        let mut wet_l = 0.0f32;
        let mut wet_r = 0.0f32;
        for (i, line) in self.lines.iter_mut().enumerate() {
            let out = if i % 2 == 1 {
                line.tick(fed_r, self.size, self.filt, self.sample_rate)
            } else {
                line.tick(fed_l, self.size, self.filt, self.sample_rate)
            };
            if i % 2 == 1 {
                wet_r += out;
            } else {
                wet_l += out;
            }
        }
        wet_l *= 0.35;
        wet_r *= 0.35;

        (
            (1.0 - self.mix) * in_l + self.mix * wet_l,
            (1.0 - self.mix) * in_r + self.mix * wet_r,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bypassed_by_default() {
        let mut reverb = Reverb::new(48000);
        let (l, r) = reverb.tick(0.5, -0.25);
        assert_eq!((l, r), (0.5, -0.25));
    }

    #[test]
    fn fully_wet_produces_finite_sustained_tail() {
        let mut reverb = Reverb::new(48000);
        reverb.set_enabled(true);
        reverb.set_mix(1.0);
        reverb.set_size(0.9);

        reverb.tick(1.0, 1.0);
        let mut last = (0.0, 0.0);
        for _ in 0..48000 {
            last = reverb.tick(0.0, 0.0);
            assert!(last.0.is_finite() && last.1.is_finite());
        }
        assert!(last.0.abs() > 1e-6 || last.1.abs() > 1e-6);
    }

    #[test]
    fn mix_zero_matches_dry_signal_when_enabled() {
        let mut reverb = Reverb::new(48000);
        reverb.set_enabled(true);
        reverb.set_mix(0.0);
        let (l, r) = reverb.tick(0.3, 0.3);
        assert!((l - 0.3).abs() < 1e-6);
        assert!((r - 0.3).abs() < 1e-6);
    }

    #[test]
    fn lines_retarget_without_panicking_over_a_long_run() {
        let mut reverb = Reverb::new(44100);
        reverb.set_enabled(true);
        reverb.set_mix(1.0);
        for i in 0..200_000 {
            let input = if i % 4410 == 0 { 1.0 } else { 0.0 };
            let (l, r) = reverb.tick(input, input);
            assert!(l.is_finite() && r.is_finite());
        }
    }

    #[test]
    fn changing_cutoff_changes_the_filter_coefficient() {
        let mut reverb = Reverb::new(48000);
        let before = reverb.filt;
        reverb.set_cutoff(500.0);
        reverb.recompute_filter();
        assert_ne!(before, reverb.filt);
    }
}
