//! Starts the live instrument.
//!
//! Opens a realtime output stream driven by [`malla_synth::AudioEngine`],
//! loads an optional starting program and config, and spawns a stdin thread
//! reading the line protocol in [`super::protocol`]. Grid/power edits
//! ([`InputMessage`]) are applied directly to the audio thread's own model
//! copy every callback; whole-program loads go through the snapshot pool's
//! copy-and-swap instead, since they replace every cell at once.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Args;
use malla_config::DspConfig;
use malla_core::message::{ControlMessage, InputMessage};
use malla_core::model::{Graph, Model};
use malla_core::queue::{self, Consumer, Producer};
use malla_effects::Reverb;
use malla_io::{AudioStream, Palette, Sound, StreamConfig};
use malla_synth::engine::editor::{self, EditorHandle};
use malla_synth::AudioEngine;

use super::protocol::{self, Command};

/// Matches the original's `SIM_VOICES` per-voice-type pool size.
const SYNTH_VOICES: usize = 256;
const SAMPLER_VOICES: usize = 256;
const SNAPSHOT_SLOTS: usize = 4;
const QUEUE_CAPACITY: usize = 1024;

/// Start the instrument: realtime audio plus a stdin editing session.
#[derive(Args)]
pub struct RunArgs {
    /// Program file to load at startup
    #[arg(long)]
    program: Option<PathBuf>,

    /// Config file to load at startup (built-in defaults if absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Preload SLOT=PATH.wav into the sampler palette (repeatable)
    #[arg(long = "sound", value_parser = parse_sound_arg)]
    sounds: Vec<(u8, PathBuf)>,

    /// Output device name or partial name
    #[arg(short, long)]
    output: Option<String>,

    /// Output sample rate, in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Output buffer size, in frames
    #[arg(long, default_value_t = 512)]
    buffer_size: u32,
}

fn parse_sound_arg(s: &str) -> Result<(u8, PathBuf), String> {
    let (slot, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=PATH, got '{s}'"))?;
    let slot: u8 = slot.parse().map_err(|_| format!("invalid slot '{slot}'"))?;
    Ok((slot, PathBuf::from(path)))
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => DspConfig::load(path)?,
        None => DspConfig::default(),
    };

    let initial_model = match &args.program {
        Some(path) => malla_io::load_program(path)?,
        None => Model::new(),
    };

    let mut palette = Palette::new();
    for (slot, path) in &args.sounds {
        let sound = Sound::load(path)?;
        println!("loaded sound slot {slot}: {}", path.display());
        palette.set(*slot, sound);
    }
    // Side channel for handing freshly loaded `Sound`s to the audio thread
    // out of band: `ControlMessage` must stay `Copy`, so it can only carry
    // the slot index, never the sound's sample data.
    let (sound_tx, mut sound_rx) = queue::channel::<(u8, Sound)>(QUEUE_CAPACITY);

    let editor::Channel {
        editor,
        mut audio,
        active,
        mirror,
    } = editor::channel(QUEUE_CAPACITY, SNAPSHOT_SLOTS, initial_model);
    let mut model = *active;

    let stream_config = StreamConfig {
        sample_rate: args.sample_rate,
        buffer_size: args.buffer_size,
        output_device: args.output.clone(),
    };
    let mut stream = AudioStream::new(stream_config)?;
    let channels = stream.output_channels().max(1) as usize;
    let running = stream.running_handle();

    let ctrlc_running = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nstopping...");
        ctrlc_running.store(false, Ordering::SeqCst);
    })?;

    let stdin_running = Arc::clone(&running);
    std::thread::spawn(move || run_stdin_protocol(editor, mirror, sound_tx, stdin_running));

    let mut engine: AudioEngine<SYNTH_VOICES, SAMPLER_VOICES> = AudioEngine::new(
        args.sample_rate,
        config.tempo_bpm,
        config.envelope_coefficient,
        config.envelope_exponent,
    );
    engine.set_global_volume(config.global_volume);
    let mut envelope_coefficient = config.envelope_coefficient;
    let mut envelope_exponent = config.envelope_exponent;

    let mut reverb = Reverb::new(args.sample_rate);
    reverb.set_enabled(config.reverb_on);
    reverb.set_size(config.reverb_size);
    reverb.set_cutoff(config.reverb_cutoff_hz);
    reverb.set_mix(config.reverb_mix);

    let mut graph = Graph::new();

    println!("running. type commands on stdin, or 'quit' to stop.");

    stream.run_output(move |data: &mut [f32]| {
        for frame in data.chunks_mut(channels) {
            for message in audio.drain_input() {
                apply_input(&mut model, message);
            }
            for message in audio.drain_control() {
                apply_control(
                    message,
                    &mut engine,
                    &mut reverb,
                    &mut sound_rx,
                    &mut palette,
                    &mut envelope_coefficient,
                    &mut envelope_exponent,
                );
            }
            model = *audio.try_swap(Box::new(model));

            let (l, r) = engine.audio_step(&mut model, &mut graph, &palette);
            let (l, r) = reverb.tick(l, r);

            frame[0] = l;
            if frame.len() > 1 {
                frame[1] = r;
            }
            for sample in &mut frame[2.min(frame.len())..] {
                *sample = 0.0;
            }
        }

        audio.publish_mirror(&model);
    })?;

    Ok(())
}

fn apply_input(model: &mut Model, message: InputMessage) {
    match message {
        InputMessage::Write { point, value } => model.set(point, value),
        InputMessage::Power { point } => {
            let mut value = model.get(point);
            value.powered = !value.powered;
            model.set(point, value);
        }
        InputMessage::Clear => *model = Model::new(),
        InputMessage::Load => {
            // The new model itself arrives through the snapshot pool swap,
            // not this queue; this variant exists only for callers that
            // want to observe "a load happened" without the full payload.
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_control<const SYNTH_VOICES: usize, const SAMPLER_VOICES: usize>(
    message: ControlMessage,
    engine: &mut AudioEngine<SYNTH_VOICES, SAMPLER_VOICES>,
    reverb: &mut Reverb,
    sound_rx: &mut Consumer<(u8, Sound)>,
    palette: &mut Palette,
    envelope_coefficient: &mut f32,
    envelope_exponent: &mut f32,
) {
    match message {
        ControlMessage::Tempo(bpm) => engine.set_tempo(bpm),
        ControlMessage::GlobalVolume(volume) => engine.set_global_volume(volume),
        ControlMessage::EnvelopeCoefficient(c) => {
            *envelope_coefficient = c;
            engine.set_envelope_globals(*envelope_coefficient, *envelope_exponent);
        }
        ControlMessage::EnvelopeExponent(e) => {
            *envelope_exponent = e;
            engine.set_envelope_globals(*envelope_coefficient, *envelope_exponent);
        }
        ControlMessage::ReverbStatus(on) => reverb.set_enabled(on),
        ControlMessage::ReverbSize(size) => reverb.set_size(size),
        ControlMessage::ReverbCutoff(hz) => reverb.set_cutoff(hz),
        ControlMessage::ReverbMix(mix) => reverb.set_mix(mix),
        ControlMessage::Palette(_slot) => {
            while let Some((slot, sound)) = sound_rx.dequeue() {
                palette.set(slot, sound);
            }
        }
    }
}

fn run_stdin_protocol(
    mut editor: EditorHandle,
    mut mirror: Box<Model>,
    mut sound_tx: Producer<(u8, Sound)>,
    running: Arc<std::sync::atomic::AtomicBool>,
) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        match protocol::parse_line(&line) {
            Ok(Some(command)) => {
                if matches!(command, Command::Quit) {
                    running.store(false, Ordering::SeqCst);
                    break;
                }
                if let Err(message) = dispatch(command, &mut editor, &mut mirror, &mut sound_tx) {
                    eprintln!("error: {message}");
                }
            }
            Ok(None) => {}
            Err(message) => eprintln!("error: {message}"),
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }
    }
}

fn dispatch(
    command: Command,
    editor: &mut EditorHandle,
    mirror: &mut Box<Model>,
    sound_tx: &mut Producer<(u8, Sound)>,
) -> Result<(), String> {
    match command {
        Command::Write { point, value } => {
            editor.send_input(InputMessage::Write { point, value });
        }
        Command::Power { point } => {
            editor.send_input(InputMessage::Power { point });
        }
        Command::Clear => {
            editor.send_input(InputMessage::Clear);
        }
        Command::Save(path) => {
            let fallback = Box::new(**mirror);
            *mirror = editor.latest_mirror(fallback);
            malla_io::save_program(mirror.as_ref(), &path).map_err(|e| e.to_string())?;
            println!("saved to {path}");
        }
        Command::Load(path) => {
            let model = malla_io::load_program(&path).map_err(|e| e.to_string())?;
            let published = editor.edit_and_publish(&Model::new(), |m| *m = model);
            if !published {
                return Err("snapshot pool is full, try again".to_string());
            }
            editor.send_input(InputMessage::Load);
        }
        Command::Tempo(bpm) => {
            editor.send_control(ControlMessage::Tempo(bpm));
        }
        Command::Volume(volume) => {
            editor.send_control(ControlMessage::GlobalVolume(volume));
        }
        Command::Envelope(coefficient, exponent) => {
            editor.send_control(ControlMessage::EnvelopeCoefficient(coefficient));
            editor.send_control(ControlMessage::EnvelopeExponent(exponent));
        }
        Command::ReverbOn(on) => {
            editor.send_control(ControlMessage::ReverbStatus(on));
        }
        Command::ReverbSize(size) => {
            editor.send_control(ControlMessage::ReverbSize(size));
        }
        Command::ReverbCutoff(hz) => {
            editor.send_control(ControlMessage::ReverbCutoff(hz));
        }
        Command::ReverbMix(mix) => {
            editor.send_control(ControlMessage::ReverbMix(mix));
        }
        Command::Sound(slot, path) => {
            let sound = Sound::load(&path).map_err(|e| e.to_string())?;
            if sound_tx.enqueue((slot, sound)).is_err() {
                return Err("sound queue is full, try again".to_string());
            }
            editor.send_control(ControlMessage::Palette(slot));
        }
        Command::Quit => unreachable!("handled by the caller"),
    }
    Ok(())
}
