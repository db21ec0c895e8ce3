use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::config;
use crate::error::{EmptyInputKind, LoadError};

const STDIN_SENTINEL: &str = "-";

/// A resolved, ready-to-read sequence input. The underlying stream is closed
/// when the value is dropped, on every exit path of the caller.
pub struct SequenceSource {
    label: String,
    reader: Box<dyn Read>,
}

impl std::fmt::Debug for SequenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceSource")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl SequenceSource {
    /// Resolve a user-supplied path string. `"-"` binds to standard input
    /// without any filesystem checks; anything else is tried as a path on
    /// disk first and then as an entry in the bundled data directory.
    pub fn resolve(path: &str) -> Result<SequenceSource, LoadError> {
        if path == STDIN_SENTINEL {
            return Ok(SequenceSource {
                label: STDIN_SENTINEL.to_string(),
                reader: Box::new(io::stdin()),
            });
        }

        let fs_path = Path::new(path);
        if fs_path.exists() {
            return Self::open_file(path, fs_path);
        }

        let bundled = bundled_data_path(path);
        if bundled.exists() {
            log::debug!(
                "{path} is not on the filesystem; using the bundled copy at {}",
                bundled.display()
            );
            return Self::open_file(path, &bundled);
        }

        Err(LoadError::InputNotFound {
            path: path.to_string(),
            bundled: bundled.display().to_string(),
        })
    }

    /// Wrap an already-open stream. For callers that own stream setup, and
    /// for driving the loader from tests.
    pub fn from_reader(label: impl Into<String>, reader: Box<dyn Read>) -> SequenceSource {
        SequenceSource {
            label: label.into(),
            reader,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn into_parts(self) -> (String, Box<dyn Read>) {
        (self.label, self.reader)
    }

    fn open_file(label: &str, fs_path: &Path) -> Result<SequenceSource, LoadError> {
        let file = File::open(fs_path).map_err(|source| LoadError::UnreadableInput {
            path: label.to_string(),
            source,
        })?;

        let len = file
            .metadata()
            .map_err(|source| LoadError::UnreadableInput {
                path: label.to_string(),
                source,
            })?
            .len();
        if len == 0 {
            return Err(LoadError::EmptyInput {
                path: label.to_string(),
                kind: empty_kind(fs_path),
            });
        }

        let (inner, _compression) =
            niffler::get_reader(Box::new(file)).map_err(|e| LoadError::UnreadableInput {
                path: label.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })?;
        Ok(SequenceSource {
            label: label.to_string(),
            reader: Box::new(BufReader::with_capacity(16 * 1024 * 1024, inner)),
        })
    }
}

fn empty_kind(path: &Path) -> EmptyInputKind {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name.contains("orfs") {
        EmptyInputKind::UpstreamEmpty
    } else {
        EmptyInputKind::UserEmpty
    }
}

/// Where app-shipped sequence sets live: `<platform data dir>/<relative path>`.
fn bundled_data_path(path: &str) -> PathBuf {
    config::data_dir().join(path)
}
