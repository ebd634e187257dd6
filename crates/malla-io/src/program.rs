//! Loading and saving persisted programs (spec §6), wrapping
//! `malla_core::storage::ModelStorage` with actual file handles.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use malla_core::model::Model;
use malla_core::storage::ModelStorage;

use crate::{Error, Result};

/// Load a persisted program from `path` into a fresh [`Model`].
pub fn load_program(path: impl AsRef<Path>) -> Result<Model> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let model = ModelStorage::read(&mut reader).map_err(Error::Storage)?;
    tracing::info!(path = %path.display(), "loaded program");
    Ok(model)
}

/// Save `model`'s registers and map to `path`.
pub fn save_program(model: &Model, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    ModelStorage::write(model, &mut writer).map_err(Error::Storage)?;
    tracing::info!(path = %path.display(), "saved program");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use malla_core::model::{Point, Value};

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("program.malla");

        let mut model = Model::new();
        model.set(Point::new(2, 2), Value::literal(11));

        save_program(&model, &path).unwrap();
        let loaded = load_program(&path).unwrap();
        assert_eq!(loaded.get(Point::new(2, 2)), Value::literal(11));
    }

    #[test]
    fn loading_a_missing_file_is_an_io_error() {
        let err = load_program("/nonexistent/path/to/a/program.malla").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
