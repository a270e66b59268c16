//! Reading template sources into a [`Generator`](crate::engine::Generator).
//!
//! Documents are UTF-8.  Malformed input is not fatal: each invalid
//! sequence is replaced and the load reports [`LoadStatus::InvalidUtf8`] so
//! the caller can decide whether to carry on.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Outcome of a load that produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Success,
    /// The input was not valid UTF-8; invalid sequences were replaced.
    InvalidUtf8,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Decode `bytes` as UTF-8, substituting `replacement` (U+FFFD when `None`)
/// for every invalid sequence.
pub fn decode(bytes: &[u8], replacement: Option<char>) -> (String, LoadStatus) {
    let mut text = String::with_capacity(bytes.len());
    let mut status = LoadStatus::Success;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            text.push(replacement.unwrap_or(char::REPLACEMENT_CHARACTER));
            status = LoadStatus::InvalidUtf8;
        }
    }
    (text, status)
}

/// Read a file's raw bytes.
pub fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
