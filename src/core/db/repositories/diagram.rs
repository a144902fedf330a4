//! Diagram repository
//!
//! Orchestrates the durable store and the metadata index:
//! - Create (write payload, then index it)
//! - List (newest first)
//! - Get (with repair of index entries whose payload has gone missing)
//! - Startup reconciliation against the persisted manifest
//!
//! Store and manifest I/O runs on the blocking pool, never on a runtime
//! worker.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinError;
use uuid::Uuid;

use crate::core::db::index::MetadataIndex;
use crate::core::db::manifest::{Manifest, ManifestError};
use crate::core::db::models::{
    CreateDiagram, DEFAULT_DIAGRAM_NAME, DiagramRecord, id_from_storage_key, storage_key_for,
};
use crate::core::db::store::{DiagramStore, StoreError};

/// Diagram repository error types
#[derive(Debug, thiserror::Error)]
pub enum DiagramRepositoryError {
    #[error("{0}")]
    Validation(String),

    #[error("Diagram not found")]
    NotFound,

    #[error("Failed to store diagram: {0}")]
    StoreWrite(#[source] StoreError),

    #[error("Failed to read diagram: {0}")]
    StoreRead(#[source] StoreError),

    #[error("Failed to persist diagram index: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Storage task failed: {0}")]
    Task(#[from] JoinError),
}

struct Inner {
    store: Arc<dyn DiagramStore>,
    manifest: Option<Manifest>,
    index: RwLock<MetadataIndex>,
}

/// Diagram repository backed by a durable store
#[derive(Clone)]
pub struct DiagramRepository {
    inner: Arc<Inner>,
}

impl DiagramRepository {
    /// Repository whose index lives only in memory and starts empty
    pub fn in_memory(store: Arc<dyn DiagramStore>) -> Self {
        Self::from_parts(store, None, MetadataIndex::new())
    }

    /// Repository whose index is persisted in `manifest`.
    ///
    /// Loads the manifest, drops entries whose payload is gone, adopts
    /// payloads no entry points at, and rewrites the manifest if anything
    /// changed. Blocking; call it before serving or from `spawn_blocking`.
    pub fn open(
        store: Arc<dyn DiagramStore>,
        manifest: Manifest,
    ) -> Result<Self, DiagramRepositoryError> {
        let mut index = MetadataIndex::new();
        let mut dirty = false;

        for record in manifest.load()? {
            if record.storage_key != storage_key_for(record.id) {
                tracing::warn!(
                    id = %record.id,
                    filename = %record.storage_key,
                    "Dropping manifest entry with mismatched filename"
                );
                dirty = true;
                continue;
            }
            if !store.exists(&record.storage_key) {
                tracing::warn!(
                    id = %record.id,
                    filename = %record.storage_key,
                    "Dropping manifest entry without payload"
                );
                dirty = true;
                continue;
            }
            if !index.insert(record) {
                dirty = true;
            }
        }

        let mut orphans: Vec<DiagramRecord> = store
            .keys()
            .map_err(DiagramRepositoryError::StoreRead)?
            .into_iter()
            .filter_map(|(key, modified)| {
                let id = id_from_storage_key(&key)?;
                if index.contains(&id) {
                    return None;
                }
                let created_at = modified.map(DateTime::<Utc>::from).unwrap_or_else(Utc::now);
                Some(DiagramRecord::new(id, DEFAULT_DIAGRAM_NAME, created_at))
            })
            .collect();
        orphans.sort_by_key(|record| record.created_at);

        for record in orphans {
            tracing::info!(id = %record.id, "Adopting diagram payload missing from manifest");
            index.insert(record);
            dirty = true;
        }

        if dirty {
            manifest.save(index.records_in_insertion_order())?;
        }

        tracing::info!(
            diagrams = index.len(),
            manifest = %manifest.path().display(),
            "Diagram index loaded"
        );

        Ok(Self::from_parts(store, Some(manifest), index))
    }

    fn from_parts(
        store: Arc<dyn DiagramStore>,
        manifest: Option<Manifest>,
        index: MetadataIndex,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                manifest,
                index: RwLock::new(index),
            }),
        }
    }

    /// Create a new diagram
    pub async fn create(
        &self,
        dto: &CreateDiagram,
    ) -> Result<DiagramRecord, DiagramRepositoryError> {
        let xml = match dto.xml.as_deref() {
            Some(xml) if !xml.is_empty() => xml.as_bytes().to_vec(),
            _ => {
                return Err(DiagramRepositoryError::Validation(
                    "xml is required".to_string(),
                ));
            }
        };

        let id = Uuid::new_v4();
        let storage_key = storage_key_for(id);

        // The key is fresh and unindexed, so nothing can read it before the
        // record is inserted below.
        let store = self.inner.store.clone();
        let key = storage_key.clone();
        tokio::task::spawn_blocking(move || store.put(&key, &xml))
            .await?
            .map_err(|err| {
                tracing::error!(id = %id, error = %err, "Failed to write diagram payload");
                DiagramRepositoryError::StoreWrite(err)
            })?;

        let record = DiagramRecord::new(id, dto.display_name(), Utc::now());

        let mut index = self.inner.index.write().await;

        if let Some(manifest) = &self.inner.manifest {
            let mut pending: Vec<DiagramRecord> =
                index.records_in_insertion_order().cloned().collect();
            pending.push(record.clone());

            let manifest = manifest.clone();
            let saved = tokio::task::spawn_blocking(move || manifest.save(&pending)).await?;

            if let Err(err) = saved {
                tracing::error!(id = %id, error = %err, "Failed to persist diagram index");
                let store = self.inner.store.clone();
                let removed = tokio::task::spawn_blocking(move || store.remove(&storage_key)).await;
                if let Ok(Err(cleanup)) = removed {
                    tracing::warn!(
                        id = %id,
                        error = %cleanup,
                        "Failed to remove uncommitted payload"
                    );
                }
                return Err(err.into());
            }
        }

        let inserted = index.insert(record.clone());
        debug_assert!(inserted, "freshly generated diagram id already indexed");

        tracing::info!(id = %record.id, name = %record.name, "Diagram created");

        Ok(record)
    }

    /// List all diagrams, newest first
    pub async fn list(&self) -> Vec<DiagramRecord> {
        self.inner.index.read().await.list_ordered()
    }

    /// Get a diagram's XML payload by ID.
    ///
    /// An id that is not a UUID is reported as `NotFound`, same as an
    /// unknown one.
    pub async fn get(&self, id: &str) -> Result<Vec<u8>, DiagramRepositoryError> {
        let Ok(id) = id.parse::<Uuid>() else {
            return Err(DiagramRepositoryError::NotFound);
        };

        let storage_key = {
            // Held across the read so a concurrent repair cannot interleave
            let index = self.inner.index.read().await;
            let storage_key = index
                .find_by_id(&id)
                .map(|record| record.storage_key.clone())
                .ok_or(DiagramRepositoryError::NotFound)?;

            let store = self.inner.store.clone();
            let key = storage_key.clone();
            match tokio::task::spawn_blocking(move || store.get(&key)).await? {
                Ok(bytes) => return Ok(bytes),
                Err(StoreError::NotFound { .. }) => storage_key,
                Err(err) => {
                    tracing::error!(id = %id, error = %err, "Failed to read diagram payload");
                    return Err(DiagramRepositoryError::StoreRead(err));
                }
            }
        };

        self.drop_stale_entry(id, storage_key).await;

        Err(DiagramRepositoryError::NotFound)
    }

    /// Remove an index entry whose payload is missing from the store.
    /// Returns whether this call removed it.
    async fn drop_stale_entry(&self, id: Uuid, storage_key: String) -> bool {
        let mut index = self.inner.index.write().await;

        // Another call may already have repaired it
        if !index.contains(&id) {
            return false;
        }

        let store = self.inner.store.clone();
        let key = storage_key.clone();
        match tokio::task::spawn_blocking(move || store.exists(&key)).await {
            Ok(false) => {}
            Ok(true) => return false,
            Err(err) => {
                tracing::warn!(id = %id, error = %err, "Failed to re-check diagram payload");
                return false;
            }
        }

        index.remove(&id);

        tracing::warn!(
            id = %id,
            filename = %storage_key,
            "Diagram payload missing, removed stale index entry"
        );

        if let Some(manifest) = &self.inner.manifest {
            let records: Vec<DiagramRecord> =
                index.records_in_insertion_order().cloned().collect();
            let manifest = manifest.clone();
            let saved = tokio::task::spawn_blocking(move || manifest.save(&records))
                .await
                .map_err(DiagramRepositoryError::from)
                .and_then(|saved| saved.map_err(DiagramRepositoryError::from));
            if let Err(err) = saved {
                tracing::warn!(
                    id = %id,
                    error = %err,
                    "Failed to persist repaired diagram index"
                );
            }
        }

        true
    }
}
