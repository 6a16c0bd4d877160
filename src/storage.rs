// JSON dump reading and writing

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{MidimapError, Result};

/// Serialize `value` to `path`, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MidimapError::file_access(parent, e))?;
        }
    }

    let file = File::create(path).map_err(|e| MidimapError::file_access(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| MidimapError::json(path, e))?;
    writer.flush().map_err(|e| MidimapError::file_access(path, e))?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| MidimapError::file_access(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| MidimapError::json(path, e))
}
