//! Line-oriented stdin protocol for editing the live grid.
//!
//! One command per line:
//!
//! - `write X Y CHAR` — place the token `CHAR` maps to at `(X, Y)`, always
//!   powered (matching the original keyboard input loop, which sets
//!   `powered = true` unconditionally on every typed character).
//! - `power X Y` — toggle the power flag at `(X, Y)` without changing its
//!   token.
//! - `clear` — wipe every cell and register.
//! - `save PATH` / `load PATH` — persist or restore a program file.
//! - `tempo BPM`, `volume V`, `envelope COEFF EXP`, `reverb on|off`,
//!   `reverb size|cutoff|mix VALUE` — DSP control messages.
//! - `sound SLOT PATH` — load a WAV into a sampler palette slot.
//! - `quit` — stop the instrument.
//!
//! The character table mirrors the original's `value_table`: operators by
//! symbol or mnemonic letter, `0-9A-Z` as literal digits in base 36.

use malla_core::model::{Point, Tag, Value};

/// A parsed protocol line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Write { point: Point, value: Value },
    Power { point: Point },
    Clear,
    Save(String),
    Load(String),
    Tempo(u32),
    Volume(f32),
    Envelope(f32, f32),
    ReverbOn(bool),
    ReverbSize(f32),
    ReverbCutoff(f32),
    ReverbMix(f32),
    Sound(u8, String),
    Quit,
}

/// Map a single character to the token it types, as the original's
/// `value_table`/`character_literal` do. Returns `None` for characters with
/// no meaning (whitespace, punctuation not in the table).
pub fn char_to_value(c: char) -> Option<Value> {
    let tag = match c {
        '!' => Some(Tag::Bang),
        '+' => Some(Tag::Add),
        '-' => Some(Tag::Sub),
        '*' => Some(Tag::Mul),
        '/' => Some(Tag::Div),
        '=' => Some(Tag::Equal),
        '>' => Some(Tag::Greater),
        '<' => Some(Tag::Lesser),
        '&' => Some(Tag::And),
        '|' => Some(Tag::Or),
        'a' => Some(Tag::Alter),
        'b' => Some(Tag::Bottom),
        'c' => Some(Tag::Clock),
        'd' => Some(Tag::Delay),
        'h' => Some(Tag::Hop),
        'i' => Some(Tag::Interfere),
        'j' => Some(Tag::Jump),
        'l' => Some(Tag::Load),
        'm' => Some(Tag::Multiplex),
        'n' => Some(Tag::Note),
        'o' => Some(Tag::Oddment),
        'q' => Some(Tag::Quote),
        'r' => Some(Tag::Random),
        's' => Some(Tag::Store),
        't' => Some(Tag::Top),
        'x' => Some(Tag::Sampler),
        'y' => Some(Tag::Synth),
        _ => None,
    };
    if let Some(tag) = tag {
        return Some(Value::operator(tag).powered());
    }

    character_literal(c).map(|n| Value::literal(n).powered())
}

/// `'0'-'9'` -> 0-9, `'A'-'Z'` -> 10-35 (case-insensitive), else `None`.
fn character_literal(c: char) -> Option<i32> {
    if c.is_ascii_digit() {
        return Some(i32::from(c as u8 - b'0'));
    }
    if c.is_ascii_alphabetic() {
        return Some(10 + i32::from(c.to_ascii_uppercase() as u8 - b'A'));
    }
    None
}

/// Parse a single protocol line. Blank lines and `#`-prefixed comments
/// parse as `None` (no command, not an error).
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap();

    let command = match head {
        "write" => {
            let x = next_i32(&mut parts, "write")?;
            let y = next_i32(&mut parts, "write")?;
            let ch = parts
                .next()
                .ok_or_else(|| "write: missing CHAR".to_string())?;
            let ch = ch
                .chars()
                .next()
                .ok_or_else(|| "write: empty CHAR".to_string())?;
            let value = char_to_value(ch).ok_or_else(|| format!("write: unknown char '{ch}'"))?;
            Command::Write {
                point: Point::new(x, y),
                value,
            }
        }
        "power" => {
            let x = next_i32(&mut parts, "power")?;
            let y = next_i32(&mut parts, "power")?;
            Command::Power {
                point: Point::new(x, y),
            }
        }
        "clear" => Command::Clear,
        "save" => Command::Save(next_string(&mut parts, "save")?),
        "load" => Command::Load(next_string(&mut parts, "load")?),
        "tempo" => Command::Tempo(next_u32(&mut parts, "tempo")?),
        "volume" => Command::Volume(next_f32(&mut parts, "volume")?),
        "envelope" => {
            let coeff = next_f32(&mut parts, "envelope")?;
            let exp = next_f32(&mut parts, "envelope")?;
            Command::Envelope(coeff, exp)
        }
        "reverb" => match parts.next() {
            Some("on") => Command::ReverbOn(true),
            Some("off") => Command::ReverbOn(false),
            Some("size") => Command::ReverbSize(next_f32(&mut parts, "reverb size")?),
            Some("cutoff") => Command::ReverbCutoff(next_f32(&mut parts, "reverb cutoff")?),
            Some("mix") => Command::ReverbMix(next_f32(&mut parts, "reverb mix")?),
            other => return Err(format!("reverb: unknown subcommand {other:?}")),
        },
        "sound" => {
            let slot = next_u32(&mut parts, "sound")?;
            let path = next_string(&mut parts, "sound")?;
            Command::Sound(slot as u8, path)
        }
        "quit" => Command::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(command))
}

fn next_i32<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    context: &str,
) -> Result<i32, String> {
    parts
        .next()
        .ok_or_else(|| format!("{context}: missing argument"))?
        .parse()
        .map_err(|_| format!("{context}: expected an integer"))
}

fn next_u32<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    context: &str,
) -> Result<u32, String> {
    parts
        .next()
        .ok_or_else(|| format!("{context}: missing argument"))?
        .parse()
        .map_err(|_| format!("{context}: expected a non-negative integer"))
}

fn next_f32<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    context: &str,
) -> Result<f32, String> {
    parts
        .next()
        .ok_or_else(|| format!("{context}: missing argument"))?
        .parse()
        .map_err(|_| format!("{context}: expected a number"))
}

fn next_string<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    context: &str,
) -> Result<String, String> {
    parts
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("{context}: missing argument"))
}
