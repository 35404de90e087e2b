//! Audit record types.
//!
//! One [`AuditRecord`] describes one category of change within one commit:
//! what happened (`action`), to what kind of entity (`entity_type`), the
//! normalized list of affected entities (`payload`) and who did it (`user`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// What happened to the entities of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Nodes,
    Relationships,
    Labels,
    Properties,
    RelationshipProperty,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Relationships => "relationships",
            Self::Labels => "labels",
            Self::Properties => "properties",
            Self::RelationshipProperty => "relationship_property",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized audit record for one change category of one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record ID.
    pub record_id: Uuid,

    /// When the record was built.
    pub occurred_at: DateTime<Utc>,

    pub action: Action,

    pub entity_type: EntityType,

    /// Affected entities. Shape depends on `entity_type`.
    pub payload: Vec<Value>,

    /// Acting user of the transaction.
    pub user: String,
}

impl AuditRecord {
    /// Create a new record stamped with a fresh ID and the current time.
    pub fn new(
        action: Action,
        entity_type: EntityType,
        payload: Vec<Value>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            action,
            entity_type,
            payload,
            user: user.into(),
        }
    }

    /// Number of payload entries.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Format the record as a human-readable log line.
    ///
    /// Format: `[timestamp] ACTION entity_type user=... entries=N payload=...`
    pub fn to_log_line(&self) -> String {
        let payload = Value::Array(self.payload.clone()).to_string();
        // Keep console lines bounded for large commits
        let payload_preview = if payload.len() > 200 {
            let cut = payload
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|i| *i <= 200)
                .last()
                .unwrap_or(0);
            format!("{}...", &payload[..cut])
        } else {
            payload
        };

        format!(
            "[{}] {} {} user={} entries={} payload={}",
            self.occurred_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.action.as_str().to_uppercase(),
            self.entity_type,
            self.user,
            self.payload.len(),
            payload_preview,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serialization_tags() {
        let record = AuditRecord::new(
            Action::Delete,
            EntityType::RelationshipProperty,
            vec![json!(3)],
            "alice",
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["action"], "delete");
        assert_eq!(value["entity_type"], "relationship_property");
        assert_eq!(value["payload"], json!([3]));
        assert_eq!(value["user"], "alice");
        assert!(value["record_id"].is_string());
    }

    #[test]
    fn test_to_log_line() {
        let record = AuditRecord::new(
            Action::Create,
            EntityType::Nodes,
            vec![json!([1, "Person"]), json!([2, "Company"])],
            "bob",
        );

        let line = record.to_log_line();
        assert!(line.contains("CREATE nodes"));
        assert!(line.contains("user=bob"));
        assert!(line.contains("entries=2"));
        assert!(line.contains(r#"[[1,"Person"],[2,"Company"]]"#));
    }

    #[test]
    fn test_to_log_line_truncates_long_payloads() {
        let payload = (0..100).map(|i| json!([i, "Person"])).collect();
        let record = AuditRecord::new(Action::Create, EntityType::Nodes, payload, "bob");

        let line = record.to_log_line();
        assert!(line.ends_with("..."));
        assert!(line.contains("entries=100"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Action::Create.to_string(), "create");
        assert_eq!(EntityType::Properties.to_string(), "properties");
        assert_eq!(
            EntityType::RelationshipProperty.to_string(),
            "relationship_property"
        );
    }
}
