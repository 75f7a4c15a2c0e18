//! Writing converted documents to disk

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output path is empty")]
    EmptyPath,

    #[error("failed to expand output path '{path}': {reason}")]
    Expand { path: String, reason: String },

    #[error("output directory {dir} does not exist")]
    MissingDirectory { dir: PathBuf },

    #[error("failed to create directory {dir}: {source}")]
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Expand `~` and `$VAR` shorthand in a user-supplied output path.
pub fn resolve_output_path(raw: &str) -> Result<PathBuf, OutputError> {
    if raw.trim().is_empty() {
        return Err(OutputError::EmptyPath);
    }
    let expanded = shellexpand::full(raw).map_err(|e| OutputError::Expand {
        path: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Create or replace `path` with `bytes`.
///
/// The content goes to a temporary file next to the target which is then
/// renamed over it, so readers never see a partial document.
pub fn write_document(path: &Path, bytes: &[u8], create_dirs: bool) -> Result<(), OutputError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !dir.is_dir() {
        if !create_dirs {
            return Err(OutputError::MissingDirectory { dir });
        }
        std::fs::create_dir_all(&dir).map_err(|source| OutputError::CreateDir {
            dir: dir.clone(),
            source,
        })?;
    }

    let write_err = |source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.flush().map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
