//! Durable store for diagram payloads
//!
//! One file per diagram, addressed by storage key. Payloads are opaque bytes:
//! the store never looks inside them.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Durable store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No payload stored under '{key}'")]
    NotFound { key: String },

    #[error("Failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },
}

/// Byte-level persistence keyed by storage key.
///
/// Implementations do no locking: keys are generated uniquely per create and
/// never rewritten, so a key only ever has one writer.
pub trait DiagramStore: Send + Sync + 'static {
    /// Persist `payload` so that a later `get(key)` returns identical bytes.
    fn put(&self, key: &str, payload: &[u8]) -> Result<(), StoreError>;

    /// Return the exact bytes written under `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Cheap existence check
    fn exists(&self, key: &str) -> bool;

    /// Remove the payload under `key`. Missing payloads are not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// List every stored key together with its last modification time.
    fn keys(&self) -> Result<Vec<(String, Option<SystemTime>)>, StoreError>;
}

/// Filesystem-backed store rooted at a single directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl DiagramStore for FsStore {
    fn put(&self, key: &str, payload: &[u8]) -> Result<(), StoreError> {
        write_atomic(&self.root, &self.path_for(key), payload).map_err(|source| {
            StoreError::Write {
                key: key.to_string(),
                source,
            }
        })
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        fs::read(self.path_for(key)).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound {
                key: key.to_string(),
            },
            _ => StoreError::Read {
                key: key.to_string(),
                source,
            },
        })
    }

    fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn keys(&self) -> Result<Vec<(String, Option<SystemTime>)>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    key: self.root.display().to_string(),
                    source,
                });
            }
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Read {
                key: self.root.display().to_string(),
                source,
            })?;
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            // Skip temp files left behind by an interrupted write
            if name.starts_with('.') {
                continue;
            }
            keys.push((name, metadata.modified().ok()));
        }

        keys.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(keys)
    }
}

/// Write `contents` to `path` through a temp file in the same directory, so
/// readers never observe a partially written file.
pub(crate) fn write_atomic(root: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::create_dir_all(root)?;

    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("path has no parent"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("path has no file name"))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(".{}.tmp.{}", file_name.to_string_lossy(), nanos));

    let result = (|| {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get_returns_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let payload = "<?xml version=\"1.0\"?>\n<bpmn:definitions>ü</bpmn:definitions>\r\n";
        store.put("a.bpmn", payload.as_bytes()).unwrap();

        assert_eq!(store.get("a.bpmn").unwrap(), payload.as_bytes());
    }

    #[test]
    fn test_put_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data").join("diagrams");
        let store = FsStore::new(&root);

        assert!(!root.exists());
        store.put("a.bpmn", b"<bpmn/>").unwrap();

        assert!(root.join("a.bpmn").is_file());
    }

    #[test]
    fn test_get_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let result = store.get("missing.bpmn");
        assert!(matches!(result, Err(StoreError::NotFound { ref key }) if key == "missing.bpmn"));
    }

    #[test]
    fn test_get_directory_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("dir.bpmn")).unwrap();
        let store = FsStore::new(dir.path());

        let result = store.get("dir.bpmn");
        assert!(matches!(result, Err(StoreError::Read { .. })));
    }

    #[test]
    fn test_put_into_file_root_is_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = FsStore::new(&blocker);

        let result = store.put("a.bpmn", b"<bpmn/>");
        assert!(matches!(result, Err(StoreError::Write { .. })));
    }

    #[test]
    fn test_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        assert!(!store.exists("a.bpmn"));
        store.put("a.bpmn", b"<bpmn/>").unwrap();
        assert!(store.exists("a.bpmn"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.put("a.bpmn", b"<bpmn/>").unwrap();

        store.remove("a.bpmn").unwrap();
        store.remove("a.bpmn").unwrap();

        assert!(!store.exists("a.bpmn"));
    }

    #[test]
    fn test_keys_skips_hidden_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.put("b.bpmn", b"<b/>").unwrap();
        store.put("a.bpmn", b"<a/>").unwrap();
        std::fs::write(dir.path().join(".a.bpmn.tmp.1"), b"partial").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let keys: Vec<String> = store.keys().unwrap().into_iter().map(|(k, _)| k).collect();

        assert_eq!(keys, vec!["a.bpmn".to_string(), "b.bpmn".to_string()]);
    }

    #[test]
    fn test_keys_on_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("never-created"));

        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound {
            key: "x.bpmn".to_string(),
        };
        assert_eq!(err.to_string(), "No payload stored under 'x.bpmn'");
    }
}
