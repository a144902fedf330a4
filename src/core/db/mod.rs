//! Persistence module
//!
//! File-backed storage for diagrams: the payload store, the in-memory
//! metadata index, its persisted manifest, and the repository tying them
//! together.

pub mod index;
pub mod manifest;
pub mod models;
pub mod repositories;
pub mod store;

// Re-export commonly used items
pub use index::MetadataIndex;
pub use manifest::{MANIFEST_FILE_NAME, Manifest, ManifestError};
pub use models::*;
pub use repositories::{DiagramRepository, DiagramRepositoryError};
pub use store::{DiagramStore, FsStore, StoreError};
