//! All-or-nothing artifact writing.
//!
//! Every artifact goes to a temporary file in the target directory first.
//! Only once all of them are written are they renamed into place, so a failed
//! build never leaves a truncated file under a final name.

use crate::error::{BuildError, Result};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes `(file name, contents)` pairs into `dir` and returns the final paths.
pub fn write_atomically(dir: &Path, artifacts: &[(&str, &[u8])]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;

    let mut staged = Vec::with_capacity(artifacts.len());
    for &(name, bytes) in artifacts {
        let path = dir.join(name);
        let temp_file = NamedTempFile::new_in(dir).map_err(|e| BuildError::io(dir, e))?;
        {
            let mut writer = BufWriter::new(&temp_file);
            writer.write_all(bytes).map_err(|e| BuildError::io(&path, e))?;
            writer.flush().map_err(|e| BuildError::io(&path, e))?;
        }
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| BuildError::io(&path, e))?;
        staged.push((temp_file, path));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (temp_file, path) in staged {
        temp_file
            .persist(&path)
            .map_err(|e| BuildError::io(&path, e.error))?;
        log::debug!("wrote {:?}", path);
        written.push(path);
    }
    Ok(written)
}
