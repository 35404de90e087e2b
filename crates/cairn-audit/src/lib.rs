//! # cairn-audit
//!
//! Commit audit transcriber for graph database transactions.
//!
//! On every commit the host engine hands over the transaction diff; this
//! crate turns each non-empty change category into an [`AuditRecord`]
//! (action, entity type, affected entities, acting user) and forwards it to
//! an audit logger and a metadata recorder.
//!
//! ## Change categories
//!
//! | Category | Action | Entity type | Payload |
//! |----------|--------|-------------|---------|
//! | created nodes | `create` | `nodes` | `[[id, label, ...], ...]` |
//! | deleted nodes | `delete` | `nodes` | `[[id, label, ...], ...]` |
//! | created relationships | `create` | `relationships` | `[{startNodeId, endNodeId, startNodeLabels, endNodeLabels}, ...]` |
//! | deleted relationships | `delete` | `relationships` | same as created |
//! | assigned labels | `create` | `labels` | `[]` |
//! | removed labels | - | - | completes buffered node deletions |
//! | assigned node properties | `create` | `properties` | `[{nodeId, labels, property}, ...]` |
//! | removed node properties | - | - | off unless `features.removed_node_properties` |
//! | assigned relationship properties | `create` | `relationship_property` | `[{relationshipId, property}, ...]` |
//! | removed relationship properties | `delete` | `relationship_property` | `[count]` |
//!
//! ## Deleted nodes
//!
//! A deleted node's labels are often unreadable by the time the hook runs.
//! Such nodes are parked in the [`DeletionBuffer`] and reported once the
//! host delivers the matching removed-label event.
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use cairn_audit::{CommitAuditor, MemorySink, SinkDispatcher};
//! use cairn_core::{ChangeSet, LabelEntry, MemoryGraph};
//!
//! let sink = Arc::new(MemorySink::new());
//! let auditor = CommitAuditor::new(SinkDispatcher::disabled().with_logger(sink.clone()));
//!
//! // Node 7 is gone from storage when its deletion is reported
//! let graph = MemoryGraph::new().with_deleted(7);
//! let mut commit = ChangeSet::new("alice");
//! commit.deleted_nodes = vec![7];
//! commit.removed_labels = vec![LabelEntry::new(7, "Person")];
//!
//! auditor.process_commit(&commit, &graph);
//! assert_eq!(sink.records()[0].payload, vec![serde_json::json!([7, "Person"])]);
//! ```

pub mod auditor;
pub mod buffer;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod record;
pub mod sink;

pub use auditor::CommitAuditor;
pub use buffer::DeletionBuffer;
pub use dispatcher::SinkDispatcher;
pub use error::AuditError;
pub use listener::TransactionEventListener;
pub use record::{Action, AuditRecord, EntityType};
pub use sink::{create_sink, AuditSink, ConsoleSink, FileSink, MemorySink, RecordFilter};
