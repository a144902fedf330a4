//! Diagram metadata models
//!
//! `DiagramRecord` is what the index holds, what the manifest persists and
//! what the API returns for create and list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when a diagram is created without one
pub const DEFAULT_DIAGRAM_NAME: &str = "Untitled Diagram";

/// File extension of stored diagram payloads
pub const DIAGRAM_FILE_EXTENSION: &str = "bpmn";

/// Metadata of a saved diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramRecord {
    pub id: Uuid,
    pub name: String,
    /// Storage key of the payload. Serialized as `filename` for the editor.
    #[serde(rename = "filename")]
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

impl DiagramRecord {
    /// Build a record for `id`, deriving its storage key.
    pub fn new(id: Uuid, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            storage_key: storage_key_for(id),
            created_at,
        }
    }
}

/// Diagram data for creation
#[derive(Debug, Clone, Default)]
pub struct CreateDiagram {
    pub name: Option<String>,
    pub xml: Option<String>,
}

impl CreateDiagram {
    pub fn new(name: Option<&str>, xml: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            xml: Some(xml.into()),
        }
    }

    /// Display name as given, or the placeholder when missing or empty
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => DEFAULT_DIAGRAM_NAME.to_string(),
        }
    }
}

/// Storage key for a diagram id: `<id>.bpmn`
pub fn storage_key_for(id: Uuid) -> String {
    format!("{}.{}", id, DIAGRAM_FILE_EXTENSION)
}

/// Inverse of [`storage_key_for`]. Returns `None` for keys that were not
/// produced from a diagram id.
pub fn id_from_storage_key(key: &str) -> Option<Uuid> {
    let stem = key.strip_suffix(DIAGRAM_FILE_EXTENSION)?.strip_suffix('.')?;
    let id = stem.parse::<Uuid>().ok()?;
    // Only the canonical hyphenated form round-trips
    (storage_key_for(id) == key).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_for() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            storage_key_for(id),
            "550e8400-e29b-41d4-a716-446655440000.bpmn"
        );
    }

    #[test]
    fn test_id_from_storage_key() {
        let id = Uuid::new_v4();
        assert_eq!(id_from_storage_key(&storage_key_for(id)), Some(id));

        assert_eq!(id_from_storage_key("manifest.json"), None);
        assert_eq!(id_from_storage_key("not-a-uuid.bpmn"), None);
        assert_eq!(id_from_storage_key(".bpmn"), None);
        assert_eq!(
            id_from_storage_key("550E8400-E29B-41D4-A716-446655440000.bpmn"),
            None
        );
    }

    #[test]
    fn test_display_name_defaults() {
        assert_eq!(CreateDiagram::default().display_name(), "Untitled Diagram");
        assert_eq!(
            CreateDiagram::new(Some(""), "<bpmn/>").display_name(),
            "Untitled Diagram"
        );
        assert_eq!(
            CreateDiagram::new(Some(" Order Flow "), "<bpmn/>").display_name(),
            " Order Flow "
        );
        assert_eq!(
            CreateDiagram::new(Some("   "), "<bpmn/>").display_name(),
            "   "
        );
    }

    #[test]
    fn test_record_serialization_shape() {
        let id = Uuid::nil();
        let created_at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = DiagramRecord::new(id, "Order Flow", created_at);

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Order Flow");
        assert_eq!(json["filename"], "00000000-0000-0000-0000-000000000000.bpmn");
        assert_eq!(json["createdAt"], "2024-05-01T10:00:00Z");
        assert!(json.get("storage_key").is_none());
    }

    #[test]
    fn test_record_roundtrip_through_json() {
        let record = DiagramRecord::new(Uuid::new_v4(), "Flow", Utc::now());
        let json = serde_json::to_string(&record).unwrap();
        let back: DiagramRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
