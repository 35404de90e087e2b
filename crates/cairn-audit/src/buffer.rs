//! Deleted-node reconciliation buffer.
//!
//! The host reports a node deletion before it reports the labels removed
//! from that node, and by then the node's labels can no longer be read. A
//! deleted node whose labels were unreadable is parked here; the first
//! removed-label event for the same id completes it into a `delete`/`nodes`
//! record carrying the removed labels.
//!
//! All inserts and match-and-remove operations go through one mutex, so a
//! buffered node is completed exactly once no matter how many commit threads
//! race on it. Entries whose removed-label event never arrives stay pending
//! unless a bound is configured; see [`DeletionBuffer::bounded`].

use cairn_core::NodeId;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::record::{Action, AuditRecord, EntityType};

#[derive(Debug, Default)]
struct BufferState {
    /// Pending node -> insertion sequence.
    pending: HashMap<NodeId, u64>,
    /// Insertion sequence -> pending node, oldest first.
    order: BTreeMap<u64, NodeId>,
    next_seq: u64,
}

impl BufferState {
    fn remove(&mut self, node: NodeId) -> bool {
        match self.pending.remove(&node) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }
}

/// Staging set of deleted nodes awaiting their removed-label event.
#[derive(Debug, Default)]
pub struct DeletionBuffer {
    state: Mutex<BufferState>,
    max_pending: Option<usize>,
}

impl DeletionBuffer {
    /// Create an unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding at most `max_pending` nodes.
    ///
    /// Inserting into a full buffer evicts the oldest pending node, which is
    /// returned to the caller. A bound of zero is treated as one.
    pub fn bounded(max_pending: usize) -> Self {
        Self {
            state: Mutex::default(),
            max_pending: Some(max_pending.max(1)),
        }
    }

    pub fn max_pending(&self) -> Option<usize> {
        self.max_pending
    }

    // Both maps are updated together without calling out, so a poisoned
    // guard still holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park a deleted node whose labels could not be read.
    ///
    /// Returns the node evicted to make room, if the buffer is bounded and
    /// full. Inserting an id that is already pending is a no-op.
    pub fn on_node_delete_labels_unavailable(&self, node: NodeId) -> Option<NodeId> {
        let mut state = self.lock();
        if state.pending.contains_key(&node) {
            return None;
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.insert(node, seq);
        state.order.insert(seq, node);

        let evicted = match self.max_pending {
            Some(max) if state.pending.len() > max => {
                let (_, oldest) = state.order.pop_first()?;
                state.pending.remove(&oldest);
                Some(oldest)
            }
            _ => None,
        };
        let pending = state.pending.len();
        drop(state);

        tracing::debug!(node_id = node, pending, "Deleted node buffered");
        evicted
    }

    /// Match a single removed-label event against the buffer.
    ///
    /// Returns the completed `delete`/`nodes` record `[[node, label]]` if the
    /// node was pending. Otherwise the event belongs to a live node and
    /// nothing is returned.
    pub fn on_label_removed(&self, node: NodeId, label: &str, user: &str) -> Option<AuditRecord> {
        self.complete(node, &[label], user)
    }

    /// Match all labels removed from one node in one commit.
    ///
    /// Same as [`on_label_removed`](Self::on_label_removed) but the completed
    /// record carries every given label: `[[node, label, label, ...]]`.
    pub fn complete<S: AsRef<str>>(
        &self,
        node: NodeId,
        labels: &[S],
        user: &str,
    ) -> Option<AuditRecord> {
        if !self.lock().remove(node) {
            return None;
        }

        tracing::debug!(node_id = node, labels = labels.len(), "Deleted node reconciled");

        let mut entry = Vec::with_capacity(labels.len() + 1);
        entry.push(Value::from(node));
        entry.extend(labels.iter().map(|l| Value::from(l.as_ref())));

        Some(AuditRecord::new(
            Action::Delete,
            EntityType::Nodes,
            vec![Value::Array(entry)],
            user,
        ))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.lock().pending.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pending node ids, oldest first.
    pub fn pending(&self) -> Vec<NodeId> {
        self.lock().order.values().copied().collect()
    }
}
