//! Filesystem helpers
//!
//! Collection files are shared between the refresh loop (writer) and the
//! execute loop (reader). Every write goes through a temporary file in the
//! destination directory followed by a rename, so a reader only ever sees the
//! previous or the next complete document.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur when loading a JSON document from disk
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and deserialize a JSON document
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, DocumentError> {
    let path = path.as_ref();
    let content = std::fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            DocumentError::NotFound(path.to_path_buf())
        } else {
            DocumentError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    serde_json::from_slice(&content).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `path` with `contents` via write-to-temp-then-rename
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Serialize `value` as pretty-printed JSON and write it atomically
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
) -> io::Result<()> {
    let contents = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &contents)
}
