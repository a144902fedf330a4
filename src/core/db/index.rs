//! In-memory metadata index
//!
//! Maps diagram ids to records and remembers insertion order, which breaks
//! ties between records created at the same instant.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use super::models::DiagramRecord;

/// Ordered id → record mapping
#[derive(Debug, Default, Clone)]
pub struct MetadataIndex {
    /// Records keyed by insertion sequence
    records: BTreeMap<u64, DiagramRecord>,
    by_id: HashMap<Uuid, u64>,
    next_seq: u64,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. Returns `false` and leaves the index untouched when the
    /// id is already present.
    pub fn insert(&mut self, record: DiagramRecord) -> bool {
        if self.by_id.contains_key(&record.id) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(record.id, seq);
        self.records.insert(seq, record);
        true
    }

    pub fn find_by_id(&self, id: &Uuid) -> Option<&DiagramRecord> {
        self.by_id.get(id).and_then(|seq| self.records.get(seq))
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.by_id.contains_key(id)
    }

    /// Remove a record, returning it if it was present
    pub fn remove(&mut self, id: &Uuid) -> Option<DiagramRecord> {
        let seq = self.by_id.remove(id)?;
        self.records.remove(&seq)
    }

    /// All records, newest `created_at` first. Equal timestamps keep
    /// insertion order.
    pub fn list_ordered(&self) -> Vec<DiagramRecord> {
        let mut records: Vec<DiagramRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// All records in the order they were inserted
    pub fn records_in_insertion_order(&self) -> impl Iterator<Item = &DiagramRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
