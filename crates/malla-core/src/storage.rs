//! Bit-exact on-disk encoding of a [`Model`]'s registers and map.
//!
//! Layout: an 8-byte signature, a 4-byte little-endian version, then every
//! register followed by the map in row-major order, each [`Value`] encoded
//! as tag (1 byte) + flags (1 byte: bit 0 `powered`, bit 1 `pulse`) +
//! literal (4-byte little-endian `i32`). The RNG and frame counter are not
//! persisted — a loaded program starts a fresh beat count and RNG stream,
//! matching the original loader's behaviour.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::model::{HEIGHT, Model, RADIX, Tag, Value, WIDTH};

const SIGNATURE: &[u8; 8] = b"brstmata";
const VERSION: i32 = 1;
const VALUE_BYTES: usize = 6;

/// Errors reading or writing a persisted program.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not a malla program file (bad signature)")]
    BadSignature,
    #[error("unsupported program file version {0}")]
    BadVersion(i32),
    #[error("corrupt program file: unknown tag byte {0}")]
    BadTag(u8),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The persisted form of a [`Model`]: its registers and map, nothing else.
pub struct ModelStorage;

impl ModelStorage {
    /// Serialize `model`'s registers and map to `writer`.
    pub fn write(model: &Model, writer: &mut impl Write) -> Result<(), StorageError> {
        writer.write_all(SIGNATURE)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        for register in model.registers.iter() {
            write_value(writer, *register)?;
        }
        for row in model.map.iter() {
            for cell in row.iter() {
                write_value(writer, *cell)?;
            }
        }
        Ok(())
    }

    /// Load registers and map from `reader` into a fresh [`Model`] (frame
    /// counter and RNG reset to their defaults).
    pub fn read(reader: &mut impl Read) -> Result<Model, StorageError> {
        let mut signature = [0u8; 8];
        reader.read_exact(&mut signature)?;
        if &signature != SIGNATURE {
            return Err(StorageError::BadSignature);
        }

        let mut version_bytes = [0u8; 4];
        reader.read_exact(&mut version_bytes)?;
        let version = i32::from_le_bytes(version_bytes);
        if version != VERSION {
            return Err(StorageError::BadVersion(version));
        }

        let mut model = Model::new();
        for register in model.registers.iter_mut() {
            *register = read_value(reader)?;
        }
        for row in model.map.iter_mut() {
            for cell in row.iter_mut() {
                *cell = read_value(reader)?;
            }
        }
        Ok(model)
    }
}

fn write_value(writer: &mut impl Write, value: Value) -> Result<(), StorageError> {
    let mut flags = 0u8;
    if value.powered {
        flags |= 0b01;
    }
    if value.pulse {
        flags |= 0b10;
    }
    writer.write_all(&[value.tag as u8, flags])?;
    writer.write_all(&value.literal.to_le_bytes())?;
    Ok(())
}

fn read_value(reader: &mut impl Read) -> Result<Value, StorageError> {
    let mut header = [0u8; 2];
    reader.read_exact(&mut header)?;
    let tag = Tag::from_u8(header[0]).ok_or(StorageError::BadTag(header[0]))?;
    let powered = header[1] & 0b01 != 0;
    let pulse = header[1] & 0b10 != 0;

    let mut literal_bytes = [0u8; 4];
    reader.read_exact(&mut literal_bytes)?;
    let literal = i32::from_le_bytes(literal_bytes).rem_euclid(RADIX);

    Ok(Value {
        tag,
        powered,
        pulse,
        literal,
    })
}

/// Byte size of a fully serialized program: signature + version + every
/// register and map cell.
pub fn encoded_len() -> usize {
    8 + 4 + (RADIX as usize + WIDTH * HEIGHT) * VALUE_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    #[test]
    fn roundtrips_a_populated_model() {
        let mut model = Model::new();
        model.set(Point::new(3, 3), Value::literal(17));
        model.set(Point::new(4, 3), Value::operator(Tag::Add).powered());
        model.registers[5] = Value::literal(9);

        let mut buf = Vec::new();
        ModelStorage::write(&model, &mut buf).unwrap();
        assert_eq!(buf.len(), encoded_len());

        let loaded = ModelStorage::read(&mut &buf[..]).unwrap();
        assert_eq!(loaded.get(Point::new(3, 3)), Value::literal(17));
        assert_eq!(
            loaded.get(Point::new(4, 3)),
            Value::operator(Tag::Add).powered()
        );
        assert_eq!(loaded.registers[5], Value::literal(9));
    }

    #[test]
    fn rejects_bad_signature() {
        let buf = [0u8; 8];
        let err = ModelStorage::read(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, StorageError::BadSignature));
    }

    #[test]
    fn rejects_future_version() {
        let mut buf = Vec::new();
        buf.extend_from_slice(SIGNATURE);
        buf.extend_from_slice(&99i32.to_le_bytes());
        let err = ModelStorage::read(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, StorageError::BadVersion(99)));
    }

    #[test]
    fn truncated_file_is_an_io_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(SIGNATURE);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        let err = ModelStorage::read(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
