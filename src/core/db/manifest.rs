//! Persisted copy of the metadata index
//!
//! `manifest.json` sits next to the payload files and lists the records in
//! insertion order, so the index survives a restart.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::models::DiagramRecord;
use super::store::write_atomic;

/// Manifest file name inside the store directory
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Current on-disk format version
pub const MANIFEST_VERSION: u32 = 1;

/// Manifest error types
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported manifest version {0}")]
    UnsupportedVersion(u32),

    #[error("Failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestFile {
    version: u32,
    diagrams: Vec<DiagramRecord>,
}

/// Handle on the manifest file of one store directory
#[derive(Debug, Clone)]
pub struct Manifest {
    root: PathBuf,
    path: PathBuf,
}

impl Manifest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let path = root.join(MANIFEST_FILE_NAME);
        Self { root, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the records. A missing manifest means an empty index.
    pub fn load(&self) -> Result<Vec<DiagramRecord>, ManifestError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ManifestError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let file: ManifestFile =
            serde_json::from_slice(&bytes).map_err(|source| ManifestError::Parse {
                path: self.path.clone(),
                source,
            })?;

        if file.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion(file.version));
        }

        Ok(file.diagrams)
    }

    /// Replace the manifest with `records`
    pub fn save<'a>(
        &self,
        records: impl IntoIterator<Item = &'a DiagramRecord>,
    ) -> Result<(), ManifestError> {
        let file = ManifestFile {
            version: MANIFEST_VERSION,
            diagrams: records.into_iter().cloned().collect(),
        };

        let bytes = serde_json::to_vec_pretty(&file).map_err(|source| ManifestError::Write {
            path: self.path.clone(),
            source: io::Error::other(source),
        })?;

        write_atomic(&self.root, &self.path, &bytes).map_err(|source| ManifestError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
