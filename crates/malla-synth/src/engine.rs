//! The audio-thread mixer step and the editor-facing handle onto it.
//!
//! [`AudioEngine::audio_step`] is what the real-time callback calls once per
//! output sample: it advances a beat-boundary counter derived from the
//! tempo, steps the grid interpreter exactly on the beat, scans the map for
//! freshly-fired `SYNTH`/`SAMPLER` cells, and mixes every active voice.
//!
//! Reading a trigger cell's parameters: both operators read a fixed run of
//! cells immediately to their west, nearest (offset 1) first. `SYNTH` reads
//! release, hold, attack, velocity, pitch, octave (offsets 1-6). `SAMPLER`
//! reads pitch offset, release, hold, attack, velocity, sample offset, sound
//! index (offsets 1-7). Missing (non-`LITERAL`) parameters default to `0`,
//! except `SAMPLER`'s pitch offset, which defaults to `RADIX / 2` (meaning
//! unshifted).

use malla_core::model::{HEIGHT, Model, Point, RADIX, Tag, WIDTH, read_literal};
use malla_core::tempo::beat_period_samples;

use crate::voice::{SamplerVoicePool, SoundSource, SynthVoicePool};

const OCTAVE: i32 = 12;

fn west_params<const N: usize>(model: &Model, origin: Point, default: i32) -> [i32; N] {
    let mut out = [default; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let point = Point::new(origin.x - 1 - i as i32, origin.y);
        *slot = read_literal(model.get(point), default);
    }
    out
}

/// Owns the synth/sampler voice pools and the beat-clock counter that
/// drives when the grid steps relative to the audio sample stream.
pub struct AudioEngine<const SYNTH_VOICES: usize, const SAMPLER_VOICES: usize> {
    synth: SynthVoicePool<SYNTH_VOICES>,
    sampler: SamplerVoicePool<SAMPLER_VOICES>,
    sample_rate: u32,
    global_volume: f32,
    beat_period: f64,
    samples_until_beat: f64,
}

impl<const SYNTH_VOICES: usize, const SAMPLER_VOICES: usize>
    AudioEngine<SYNTH_VOICES, SAMPLER_VOICES>
{
    pub fn new(sample_rate: u32, bpm: u32, envelope_coefficient: f32, envelope_exponent: f32) -> Self {
        let beat_period = beat_period_samples(sample_rate, bpm);
        Self {
            synth: SynthVoicePool::new(envelope_coefficient, envelope_exponent),
            sampler: SamplerVoicePool::new(envelope_coefficient, envelope_exponent),
            sample_rate,
            global_volume: 1.0,
            beat_period,
            samples_until_beat: beat_period,
        }
    }

    pub fn set_tempo(&mut self, bpm: u32) {
        self.beat_period = beat_period_samples(self.sample_rate, bpm);
    }

    pub fn set_global_volume(&mut self, volume: f32) {
        self.global_volume = volume.max(0.0);
    }

    pub fn set_envelope_globals(&mut self, coefficient: f32, exponent: f32) {
        self.synth.set_envelope_globals(coefficient, exponent);
        self.sampler.set_envelope_globals(coefficient, exponent);
    }

    /// Look for `SYNTH`/`SAMPLER` cells that fired this beat (either
    /// unconditionally powered, or pulsed by an adjacent `BANG`) and trigger
    /// voices for them.
    pub fn scan_triggers(&mut self, model: &Model) {
        for y in 0..HEIGHT as i32 {
            for x in 0..WIDTH as i32 {
                let origin = Point::new(x, y);
                let cell = model.get(origin);
                if !(cell.powered || cell.pulse) {
                    continue;
                }
                match cell.tag {
                    Tag::Synth => {
                        let [release, hold, attack, velocity, pitch, octave] =
                            west_params(model, origin, 0);
                        let semitone = OCTAVE * octave + pitch;
                        self.synth.trigger(
                            semitone,
                            attack,
                            hold,
                            release,
                            velocity as f32 / RADIX as f32,
                        );
                    }
                    Tag::Sampler => {
                        let pitch_point = Point::new(origin.x - 1, origin.y);
                        let pitch = read_literal(model.get(pitch_point), RADIX / 2);
                        let [release, hold, attack, velocity, offset] =
                            west_params(model, Point::new(origin.x - 1, origin.y), 0);
                        let sound_index_point = Point::new(origin.x - 7, origin.y);
                        let sound_index = read_literal(model.get(sound_index_point), -1);
                        if sound_index < 0 {
                            continue;
                        }
                        let start_fraction = offset as f64 / RADIX as f64;
                        self.sampler.trigger(
                            sound_index as u8,
                            start_fraction,
                            pitch - RADIX / 2,
                            attack,
                            hold,
                            release,
                            velocity as f32 / RADIX as f32,
                        );
                    }
                    _ => {}
                }
            }
        }
    }

    /// Advance by one output sample: step the grid on beat boundaries, mix
    /// every active voice, and return the stereo output.
    pub fn audio_step(
        &mut self,
        model: &mut Model,
        graph: &mut malla_core::model::Graph,
        source: &impl SoundSource,
    ) -> (f32, f32) {
        self.samples_until_beat -= 1.0;
        if self.samples_until_beat <= 0.0 {
            malla_core::interp::step(model, graph);
            self.scan_triggers(model);
            self.samples_until_beat += self.beat_period;
        }

        let synth_mono = self.synth.process(self.sample_rate as f32);
        let (sampler_l, sampler_r) = self.sampler.process_stereo(source);

        (
            (synth_mono + sampler_l) * self.global_volume,
            (synth_mono + sampler_r) * self.global_volume,
        )
    }
}

/// The editor thread's view onto a running [`AudioEngine`]'s model and
/// message queues.
///
/// [`EditorHandle`] and [`AudioHandle`] are built together by [`channel`]
/// and each hand one half of a set of lock-free SPSC channels to exactly
/// one thread — there is no shared state between them beyond that, so
/// neither side ever locks a mutex or blocks on the other. The audio side's
/// methods are plain non-blocking drains/swaps: a full or empty channel is
/// just the normal "nothing to do this callback" case, the same
/// silent-by-design failure mode spec'd for a full queue.
#[cfg(feature = "std")]
pub mod editor {
    use malla_core::message::{ControlMessage, InputMessage};
    use malla_core::model::Model;
    use malla_core::pool::{self, SnapshotConsumer, SnapshotProducer};
    use malla_core::queue::{self, Consumer, Producer};

    /// Editor-side handle: send edits, publish snapshots, read back the
    /// audio thread's latest mirrored state.
    pub struct EditorHandle {
        input: Producer<InputMessage>,
        control: Producer<ControlMessage>,
        snapshots: SnapshotProducer<Model>,
        mirror: SnapshotConsumer<Model>,
    }

    impl EditorHandle {
        /// Queue a grid/power edit for the audio thread to apply.
        pub fn send_input(&mut self, message: InputMessage) -> bool {
            self.input.enqueue(message).is_ok()
        }

        /// Queue a DSP parameter change for the audio thread to apply.
        pub fn send_control(&mut self, message: ControlMessage) -> bool {
            self.control.enqueue(message).is_ok()
        }

        /// Acquire a free snapshot slot seeded from `active`, run `edit` on
        /// it, and publish it for the audio thread to swap to.
        pub fn edit_and_publish(&mut self, active: &Model, edit: impl FnOnce(&mut Model)) -> bool {
            self.snapshots.edit_and_publish(active, edit)
        }

        /// Swap to the audio thread's most recently mirrored model, if it
        /// has published one since the last call, releasing `current` back
        /// to the pool. Returns `current` unchanged otherwise.
        pub fn latest_mirror(&mut self, current: Box<Model>) -> Box<Model> {
            self.mirror.try_swap(current)
        }
    }

    /// Audio-side handle: drain edits, swap snapshots, mirror current state.
    pub struct AudioHandle {
        input: Consumer<InputMessage>,
        control: Consumer<ControlMessage>,
        snapshots: SnapshotConsumer<Model>,
        mirror: SnapshotProducer<Model>,
    }

    impl AudioHandle {
        /// Drain every pending input message.
        pub fn drain_input(&mut self) -> Vec<InputMessage> {
            let mut out = Vec::new();
            while let Some(message) = self.input.dequeue() {
                out.push(message);
            }
            out
        }

        /// Drain every pending control message.
        pub fn drain_control(&mut self) -> Vec<ControlMessage> {
            let mut out = Vec::new();
            while let Some(message) = self.control.dequeue() {
                out.push(message);
            }
            out
        }

        /// Swap to the newest published snapshot, if any, releasing `active`
        /// back to the pool. Returns `active` unchanged if nothing new was
        /// published.
        pub fn try_swap(&mut self, active: Box<Model>) -> Box<Model> {
            self.snapshots.try_swap(active)
        }

        /// Publish `model` as the editor-visible mirror of current state.
        pub fn publish_mirror(&mut self, model: &Model) {
            let _ = self.mirror.edit_and_publish(model, |_| {});
        }
    }

    /// The two halves of a running engine's cross-thread surface, plus the
    /// initial active snapshots each side starts out holding.
    pub struct Channel {
        pub editor: EditorHandle,
        pub audio: AudioHandle,
        pub active: Box<Model>,
        pub mirror: Box<Model>,
    }

    /// Build an [`EditorHandle`]/[`AudioHandle`] pair: `queue_capacity` sizes
    /// the input/control queues, `pool_size` sizes the snapshot and mirror
    /// channels (`>= 2`).
    pub fn channel(queue_capacity: usize, pool_size: usize, initial: Model) -> Channel {
        let (input_tx, input_rx) = queue::channel(queue_capacity);
        let (control_tx, control_rx) = queue::channel(queue_capacity);
        let (snap_tx, snap_rx, active) = pool::snapshot_channel(pool_size, initial);
        let (mirror_tx, mirror_rx, mirror) = pool::snapshot_channel(pool_size, initial);

        Channel {
            editor: EditorHandle {
                input: input_tx,
                control: control_tx,
                snapshots: snap_tx,
                mirror: mirror_rx,
            },
            audio: AudioHandle {
                input: input_rx,
                control: control_rx,
                snapshots: snap_rx,
                mirror: mirror_tx,
            },
            active,
            mirror,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn editor_and_audio_handles_share_a_snapshot() {
            let mut ch = channel(16, 3, Model::new());

            let published = ch.editor.edit_and_publish(&ch.active, |m| {
                m.set(
                    malla_core::model::Point::new(0, 0),
                    malla_core::model::Value::literal(9),
                );
            });
            assert!(published);

            let snapshot = ch.audio.try_swap(ch.active);
            assert_eq!(
                snapshot.get(malla_core::model::Point::new(0, 0)),
                malla_core::model::Value::literal(9)
            );
        }

        #[test]
        fn input_messages_round_trip() {
            let mut ch = channel(4, 2, Model::new());

            assert!(ch.editor.send_input(InputMessage::Clear));
            let drained = ch.audio.drain_input();
            assert_eq!(drained, vec![InputMessage::Clear]);
        }

        #[test]
        fn mirror_reflects_the_audio_threads_latest_publish() {
            let mut ch = channel(4, 2, Model::new());

            ch.audio.publish_mirror(&ch.active);
            let mirror = ch.editor.latest_mirror(ch.mirror);
            assert_eq!(mirror.frame, ch.active.frame);
            ch.mirror = mirror;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use malla_core::model::{Graph, Value};

    struct SilentSource;
    impl SoundSource for SilentSource {
        fn frames(&self, _slot: u8) -> &[f32] {
            &[]
        }
    }

    #[test]
    fn powered_synth_cell_fires_every_beat() {
        let mut engine: AudioEngine<4, 4> = AudioEngine::new(48000, 120, 0.0625, 0.144_764_8);
        let mut model = Model::new();
        let mut graph = Graph::new();

        // offset 1..6 west of the operator: release, hold, attack, velocity,
        // pitch, octave. pitch=33 (reference A) at octave 0, attack/hold/
        // release moderate, velocity near max.
        model.set(Point::new(4, 0), Value::literal(10)); // release
        model.set(Point::new(3, 0), Value::literal(10)); // hold
        model.set(Point::new(2, 0), Value::literal(10)); // attack
        model.set(Point::new(1, 0), Value::literal(35)); // velocity
        model.set(Point::new(0, 0), Value::literal(33)); // pitch
        model.set(Point::new(5, 0), Value::operator(Tag::Synth).powered());

        let mut heard = false;
        let source = SilentSource;
        for _ in 0..10_000 {
            let (l, r) = engine.audio_step(&mut model, &mut graph, &source);
            if l != 0.0 || r != 0.0 {
                heard = true;
            }
        }
        assert!(heard, "powered SYNTH cell should eventually produce audio");
    }

    #[test]
    fn global_volume_zero_silences_output() {
        let mut engine: AudioEngine<4, 4> = AudioEngine::new(48000, 120, 0.0625, 0.144_764_8);
        engine.set_global_volume(0.0);
        let mut model = Model::new();
        let mut graph = Graph::new();
        model.set(Point::new(4, 0), Value::literal(33));
        model.set(Point::new(5, 0), malla_core::model::Value::operator(Tag::Synth).powered());

        let source = SilentSource;
        for _ in 0..1000 {
            let (l, r) = engine.audio_step(&mut model, &mut graph, &source);
            assert_eq!(l, 0.0);
            assert_eq!(r, 0.0);
        }
    }
}
