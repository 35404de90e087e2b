//! Graph change-set model.
//!
//! A [`ChangeSet`] is the read-only diff of one transaction as observed just
//! before the host engine finalizes it. It only carries identifiers; labels
//! are looked up through a [`GraphReader`], because the host can only answer
//! those questions while the transaction is still open (and not at all for
//! nodes that are already gone).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Node identifier as assigned by the host engine.
pub type NodeId = u64;

/// Relationship identifier as assigned by the host engine.
pub type RelationshipId = u64;

/// A created or deleted relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEntry {
    pub id: RelationshipId,
    pub start_node: NodeId,
    pub end_node: NodeId,
}

/// A label assigned to or removed from a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub node: NodeId,
    pub label: String,
}

impl LabelEntry {
    pub fn new(node: NodeId, label: impl Into<String>) -> Self {
        Self {
            node,
            label: label.into(),
        }
    }
}

/// A property assigned to or removed from an entity.
///
/// `entity` is a node id or a relationship id depending on which
/// collection of the [`ChangeSet`] the entry lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub entity: u64,
    pub key: String,
}

impl PropertyEntry {
    pub fn new(entity: u64, key: impl Into<String>) -> Self {
        Self {
            entity,
            key: key.into(),
        }
    }
}

/// The diff of one transaction.
///
/// Every collection keeps the order in which the host reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// User the transaction runs as.
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub created_nodes: Vec<NodeId>,

    #[serde(default)]
    pub deleted_nodes: Vec<NodeId>,

    #[serde(default)]
    pub created_relationships: Vec<RelationshipEntry>,

    #[serde(default)]
    pub deleted_relationships: Vec<RelationshipEntry>,

    #[serde(default)]
    pub assigned_labels: Vec<LabelEntry>,

    #[serde(default)]
    pub removed_labels: Vec<LabelEntry>,

    #[serde(default)]
    pub assigned_node_properties: Vec<PropertyEntry>,

    #[serde(default)]
    pub removed_node_properties: Vec<PropertyEntry>,

    #[serde(default)]
    pub assigned_relationship_properties: Vec<PropertyEntry>,

    #[serde(default)]
    pub removed_relationship_properties: Vec<PropertyEntry>,
}

impl ChangeSet {
    /// Create an empty change set for the given user.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// Whether the transaction touched nothing at all.
    pub fn is_empty(&self) -> bool {
        self.created_nodes.is_empty()
            && self.deleted_nodes.is_empty()
            && self.created_relationships.is_empty()
            && self.deleted_relationships.is_empty()
            && self.assigned_labels.is_empty()
            && self.removed_labels.is_empty()
            && self.assigned_node_properties.is_empty()
            && self.removed_node_properties.is_empty()
            && self.assigned_relationship_properties.is_empty()
            && self.removed_relationship_properties.is_empty()
    }
}

/// Errors returned by label lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadError {
    /// No node with this id exists in the store.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The node was deleted in the current transaction and can no longer be read.
    #[error("node {0} has been deleted in this transaction")]
    NodeDeleted(NodeId),

    /// The store could not answer the lookup.
    #[error("graph store unavailable: {0}")]
    Unavailable(String),
}

/// Live label lookups against the host graph engine.
///
/// Implementations are called from commit threads and must be `Send + Sync`.
pub trait GraphReader: Send + Sync {
    /// Labels of a node as the store currently sees it.
    fn node_labels(&self, node: NodeId) -> Result<Vec<String>, ReadError>;

    /// Labels of a node as seen through the in-flight transaction.
    fn transaction_node_labels(&self, node: NodeId) -> Result<Vec<String>, ReadError> {
        self.node_labels(node)
    }
}

/// In-memory [`GraphReader`].
///
/// Used to replay recorded commits and in tests. `transaction` overlays
/// `labels` for transaction-view lookups; nodes listed in `deleted` fail
/// every lookup with [`ReadError::NodeDeleted`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryGraph {
    /// Committed labels per node.
    #[serde(default)]
    pub labels: BTreeMap<NodeId, Vec<String>>,

    /// Labels visible only through the in-flight transaction.
    #[serde(default)]
    pub transaction: BTreeMap<NodeId, Vec<String>>,

    /// Nodes whose labels can no longer be read.
    #[serde(default)]
    pub deleted: BTreeSet<NodeId>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the given labels.
    pub fn with_node<I, S>(mut self, node: NodeId, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels
            .insert(node, labels.into_iter().map(Into::into).collect());
        self
    }

    /// Override the labels seen through the transaction view.
    pub fn with_transaction_labels<I, S>(mut self, node: NodeId, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transaction
            .insert(node, labels.into_iter().map(Into::into).collect());
        self
    }

    /// Mark a node as already removed from storage.
    pub fn with_deleted(mut self, node: NodeId) -> Self {
        self.deleted.insert(node);
        self
    }
}

impl GraphReader for MemoryGraph {
    fn node_labels(&self, node: NodeId) -> Result<Vec<String>, ReadError> {
        if self.deleted.contains(&node) {
            return Err(ReadError::NodeDeleted(node));
        }
        self.labels
            .get(&node)
            .cloned()
            .ok_or(ReadError::NodeNotFound(node))
    }

    fn transaction_node_labels(&self, node: NodeId) -> Result<Vec<String>, ReadError> {
        if self.deleted.contains(&node) {
            return Err(ReadError::NodeDeleted(node));
        }
        match self.transaction.get(&node) {
            Some(labels) => Ok(labels.clone()),
            None => self.node_labels(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_graph_lookups() {
        let graph = MemoryGraph::new()
            .with_node(1, ["Person", "Employee"])
            .with_node(2, ["Company"])
            .with_transaction_labels(2, ["Company", "Client"])
            .with_deleted(3);

        assert_eq!(graph.node_labels(1).unwrap(), vec!["Person", "Employee"]);
        assert_eq!(graph.node_labels(2).unwrap(), vec!["Company"]);
        assert_eq!(
            graph.transaction_node_labels(2).unwrap(),
            vec!["Company", "Client"]
        );
        // Falls back to committed labels
        assert_eq!(graph.transaction_node_labels(1).unwrap(), vec!["Person", "Employee"]);
        assert_eq!(graph.node_labels(3), Err(ReadError::NodeDeleted(3)));
        assert_eq!(graph.transaction_node_labels(3), Err(ReadError::NodeDeleted(3)));
        assert_eq!(graph.node_labels(42), Err(ReadError::NodeNotFound(42)));
    }

    #[test]
    fn test_change_set_deserializes_with_defaults() {
        let json = r#"{
            "username": "alice",
            "deleted_nodes": [7],
            "removed_labels": [{"node": 7, "label": "Person"}]
        }"#;
        let change_set: ChangeSet = serde_json::from_str(json).unwrap();

        assert_eq!(change_set.username, "alice");
        assert_eq!(change_set.deleted_nodes, vec![7]);
        assert_eq!(change_set.removed_labels, vec![LabelEntry::new(7, "Person")]);
        assert!(change_set.created_nodes.is_empty());
        assert!(!change_set.is_empty());
        assert!(ChangeSet::new("bob").is_empty());
    }

    #[test]
    fn test_memory_graph_deserializes_integer_keys() {
        let json = r#"{
            "labels": {"1": ["Person"]},
            "deleted": [9]
        }"#;
        let graph: MemoryGraph = serde_json::from_str(json).unwrap();

        assert_eq!(graph.node_labels(1).unwrap(), vec!["Person"]);
        assert_eq!(graph.node_labels(9), Err(ReadError::NodeDeleted(9)));
    }
}
