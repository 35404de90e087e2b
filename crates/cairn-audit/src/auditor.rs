//! Commit audit transcriber.
//!
//! [`CommitAuditor::process_commit`] walks the ten collections of a
//! [`ChangeSet`] in a fixed order and turns each non-empty one into a
//! normalized [`AuditRecord`] for the [`SinkDispatcher`]. Nothing here ever
//! fails the commit: lookup and sink errors are traced and skipped.

use cairn_core::config::{AuditConfig, EvictionAction, FeatureConfig};
use cairn_core::{ChangeSet, GraphReader, LabelEntry, NodeId, PropertyEntry, RelationshipEntry};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::buffer::DeletionBuffer;
use crate::dispatcher::SinkDispatcher;
use crate::error::AuditError;
use crate::record::{Action, AuditRecord, EntityType};

/// Transcribes commit diffs into audit records.
///
/// One instance is shared by every commit thread of the host; the deletion
/// buffer is its only state that outlives a call.
#[derive(Debug)]
pub struct CommitAuditor {
    dispatcher: SinkDispatcher,
    buffer: DeletionBuffer,
    features: FeatureConfig,
    on_evict: EvictionAction,
}

impl CommitAuditor {
    /// Create an auditor with an unbounded deletion buffer and default features.
    pub fn new(dispatcher: SinkDispatcher) -> Self {
        Self {
            dispatcher,
            buffer: DeletionBuffer::new(),
            features: FeatureConfig::default(),
            on_evict: EvictionAction::default(),
        }
    }

    /// Build sinks, features and buffer bounds from configuration.
    pub fn from_config(config: &AuditConfig) -> Result<Self, AuditError> {
        let buffer = match config.reconciliation.max_pending {
            Some(max) => DeletionBuffer::bounded(max),
            None => DeletionBuffer::new(),
        };

        Ok(Self {
            dispatcher: SinkDispatcher::from_config(config)?,
            buffer,
            features: config.features.clone(),
            on_evict: config.reconciliation.on_evict,
        })
    }

    pub fn with_buffer(mut self, buffer: DeletionBuffer) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_features(mut self, features: FeatureConfig) -> Self {
        self.features = features;
        self
    }

    pub fn with_eviction(mut self, on_evict: EvictionAction) -> Self {
        self.on_evict = on_evict;
        self
    }

    pub fn buffer(&self) -> &DeletionBuffer {
        &self.buffer
    }

    pub fn dispatcher(&self) -> &SinkDispatcher {
        &self.dispatcher
    }

    /// Whether commits are transcribed at all.
    pub fn is_enabled(&self) -> bool {
        !self.dispatcher.is_empty()
    }

    /// Transcribe one commit.
    ///
    /// Must be called before the host finalizes the transaction, while
    /// `reader` can still answer label lookups for it.
    pub fn process_commit(&self, data: &ChangeSet, reader: &dyn GraphReader) {
        if self.dispatcher.is_empty() {
            return;
        }

        let user = data.username.as_str();

        if !data.created_nodes.is_empty() {
            let payload = self.created_node_payload(&data.created_nodes, reader);
            self.emit(Action::Create, EntityType::Nodes, payload, user);
        }

        if !data.deleted_nodes.is_empty() {
            let payload = self.deleted_node_payload(&data.deleted_nodes, reader, user);
            // Every node may have gone to the buffer.
            if !payload.is_empty() {
                self.emit(Action::Delete, EntityType::Nodes, payload, user);
            }
        }

        if !data.created_relationships.is_empty() {
            let payload = relationship_payload(&data.created_relationships, reader);
            self.emit(Action::Create, EntityType::Relationships, payload, user);
        }

        if !data.deleted_relationships.is_empty() {
            let payload = relationship_payload(&data.deleted_relationships, reader);
            self.emit(Action::Delete, EntityType::Relationships, payload, user);
        }

        if !data.assigned_labels.is_empty() {
            let payload = assigned_label_payload(&data.assigned_labels);
            self.emit(Action::Create, EntityType::Labels, payload, user);
        }

        if !data.removed_labels.is_empty() {
            self.reconcile_removed_labels(&data.removed_labels, user);
        }

        if !data.assigned_node_properties.is_empty() {
            let payload = node_property_payload(&data.assigned_node_properties, reader);
            self.emit(Action::Create, EntityType::Properties, payload, user);
        }

        if !data.removed_node_properties.is_empty() {
            if self.features.removed_node_properties {
                let payload = node_property_payload(&data.removed_node_properties, reader);
                self.emit(Action::Delete, EntityType::Properties, payload, user);
            } else {
                tracing::debug!(
                    count = data.removed_node_properties.len(),
                    "Removed node properties not reported"
                );
            }
        }

        if !data.assigned_relationship_properties.is_empty() {
            let payload = relationship_property_payload(&data.assigned_relationship_properties);
            self.emit(Action::Create, EntityType::RelationshipProperty, payload, user);
        }

        if !data.removed_relationship_properties.is_empty() {
            let payload = vec![Value::from(data.removed_relationship_properties.len())];
            self.emit(Action::Delete, EntityType::RelationshipProperty, payload, user);
        }
    }

    fn emit(&self, action: Action, entity_type: EntityType, payload: Vec<Value>, user: &str) {
        self.dispatch(AuditRecord::new(action, entity_type, payload, user));
    }

    fn dispatch(&self, record: AuditRecord) {
        if let Err(e) = self.dispatcher.emit(&record) {
            tracing::warn!(
                record_id = %record.record_id,
                action = %record.action,
                entity_type = %record.entity_type,
                error = %e,
                "Failed to dispatch audit record"
            );
        }
    }

    fn created_node_payload(&self, nodes: &[NodeId], reader: &dyn GraphReader) -> Vec<Value> {
        nodes
            .iter()
            .map(|&node| match reader.node_labels(node) {
                Ok(labels) => node_entry(node, &labels),
                Err(e) => {
                    tracing::warn!(node_id = node, error = %e, "Could not read labels of created node");
                    json!([node])
                }
            })
            .collect()
    }

    /// Nodes whose labels are unreadable go to the buffer and are left out.
    fn deleted_node_payload(
        &self,
        nodes: &[NodeId],
        reader: &dyn GraphReader,
        user: &str,
    ) -> Vec<Value> {
        let mut payload = Vec::with_capacity(nodes.len());
        for &node in nodes {
            match reader.node_labels(node) {
                Ok(labels) => payload.push(node_entry(node, &labels)),
                Err(e) => {
                    tracing::debug!(node_id = node, error = %e, "Could not read labels of deleted node");
                    if let Some(evicted) = self.buffer.on_node_delete_labels_unavailable(node) {
                        self.evict(evicted, user);
                    }
                }
            }
        }
        payload
    }

    fn evict(&self, node: NodeId, user: &str) {
        match self.on_evict {
            EvictionAction::Drop => {
                tracing::warn!(node_id = node, "Pending deleted node evicted; deletion not reported");
            }
            EvictionAction::EmitIncomplete => {
                tracing::warn!(node_id = node, "Pending deleted node evicted; reporting without labels");
                self.emit(Action::Delete, EntityType::Nodes, vec![json!([node])], user);
            }
        }
    }

    /// Removed labels only ever surface as completed node deletions.
    fn reconcile_removed_labels(&self, entries: &[LabelEntry], user: &str) {
        let mut groups: Vec<(NodeId, Vec<&str>)> = Vec::new();
        let mut index: HashMap<NodeId, usize> = HashMap::new();
        for entry in entries {
            let slot = *index.entry(entry.node).or_insert_with(|| {
                groups.push((entry.node, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(entry.label.as_str());
        }

        for (node, labels) in groups {
            if let Some(record) = self.buffer.complete(node, &labels, user) {
                self.dispatch(record);
            }
        }
    }
}

fn node_entry<S: AsRef<str>>(node: NodeId, labels: &[S]) -> Value {
    let mut entry = Vec::with_capacity(labels.len() + 1);
    entry.push(Value::from(node));
    entry.extend(labels.iter().map(|l| Value::from(l.as_ref())));
    Value::Array(entry)
}

fn read_labels(reader: &dyn GraphReader, node: NodeId) -> Vec<String> {
    reader.node_labels(node).unwrap_or_else(|e| {
        tracing::warn!(node_id = node, error = %e, "Could not read node labels");
        Vec::new()
    })
}

/// Labels are read live; for deletions they may already be stale or empty.
fn relationship_payload(relationships: &[RelationshipEntry], reader: &dyn GraphReader) -> Vec<Value> {
    relationships
        .iter()
        .map(|rel| {
            json!({
                "startNodeId": rel.start_node,
                "endNodeId": rel.end_node,
                "startNodeLabels": read_labels(reader, rel.start_node),
                "endNodeLabels": read_labels(reader, rel.end_node),
            })
        })
        .collect()
}

/// Label assignments are not itemized; the record only marks that some happened.
fn assigned_label_payload(_entries: &[LabelEntry]) -> Vec<Value> {
    Vec::new()
}

fn node_property_payload(entries: &[PropertyEntry], reader: &dyn GraphReader) -> Vec<Value> {
    entries
        .iter()
        .map(|entry| {
            let labels = reader
                .transaction_node_labels(entry.entity)
                .unwrap_or_else(|e| {
                    tracing::warn!(node_id = entry.entity, error = %e, "Could not read node labels in transaction");
                    Vec::new()
                });
            json!({
                "nodeId": entry.entity,
                "labels": labels,
                "property": entry.key,
            })
        })
        .collect()
}

fn relationship_property_payload(entries: &[PropertyEntry]) -> Vec<Value> {
    entries
        .iter()
        .map(|entry| {
            json!({
                "relationshipId": entry.entity,
                "property": entry.key,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use cairn_core::MemoryGraph;
    use std::sync::Arc;

    fn auditor() -> (CommitAuditor, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = SinkDispatcher::disabled().with_logger(sink.clone());
        (CommitAuditor::new(dispatcher), sink)
    }

    #[test]
    fn test_node_entry_shape() {
        assert_eq!(node_entry(4, &["A", "B"]), json!([4, "A", "B"]));
        assert_eq!(node_entry::<&str>(4, &[]), json!([4]));
    }

    #[test]
    fn test_assigned_label_payload_is_always_empty() {
        let entries = vec![LabelEntry::new(1, "Person"), LabelEntry::new(2, "Company")];
        assert!(assigned_label_payload(&entries).is_empty());
    }

    #[test]
    fn test_removed_labels_are_grouped_per_node() {
        let (auditor, sink) = auditor();
        auditor.buffer().on_node_delete_labels_unavailable(5);

        let mut change_set = ChangeSet::new("alice");
        change_set.removed_labels = vec![
            LabelEntry::new(5, "Person"),
            LabelEntry::new(6, "Ignored"),
            LabelEntry::new(5, "Employee"),
        ];
        auditor.process_commit(&change_set, &MemoryGraph::new());

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, vec![json!([5, "Person", "Employee"])]);
    }

    #[test]
    fn test_eviction_emit_incomplete() {
        let (auditor, sink) = auditor();
        let auditor = auditor
            .with_buffer(DeletionBuffer::bounded(1))
            .with_eviction(EvictionAction::EmitIncomplete);
        let graph = MemoryGraph::new().with_deleted(1).with_deleted(2);

        let mut change_set = ChangeSet::new("alice");
        change_set.deleted_nodes = vec![1, 2];
        auditor.process_commit(&change_set, &graph);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, Action::Delete);
        assert_eq!(records[0].payload, vec![json!([1])]);
        assert_eq!(auditor.buffer().pending(), vec![2]);
    }

    #[test]
    fn test_eviction_drop() {
        let (auditor, sink) = auditor();
        let auditor = auditor.with_buffer(DeletionBuffer::bounded(1));
        let graph = MemoryGraph::new().with_deleted(1).with_deleted(2);

        let mut change_set = ChangeSet::new("alice");
        change_set.deleted_nodes = vec![1, 2];
        auditor.process_commit(&change_set, &graph);

        assert!(sink.is_empty());
        assert_eq!(auditor.buffer().pending(), vec![2]);
    }
}
