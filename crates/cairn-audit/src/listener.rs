//! Host transaction hook.
//!
//! Graph engines expose commit hooks in three phases: before the commit is
//! finalized, after it succeeded and after it was rolled back. Whatever
//! `before_commit` returns is handed back unchanged to the matching
//! `after_*` call.

use cairn_core::{ChangeSet, GraphReader};
use std::sync::Arc;

use crate::auditor::CommitAuditor;

/// Three-phase transaction callback, as registered with the host engine.
pub trait TransactionEventListener: Send + Sync {
    /// Token carried from `before_commit` to `after_commit`/`after_rollback`.
    type State;

    /// Called with the transaction diff while the transaction is still open.
    fn before_commit(&self, data: &ChangeSet, reader: &dyn GraphReader) -> Self::State;

    fn after_commit(&self, _data: &ChangeSet, _state: Self::State) {}

    fn after_rollback(&self, _data: &ChangeSet, _state: Self::State) {}
}

impl TransactionEventListener for CommitAuditor {
    type State = ();

    fn before_commit(&self, data: &ChangeSet, reader: &dyn GraphReader) {
        self.process_commit(data, reader);
    }
}

impl<L: TransactionEventListener + ?Sized> TransactionEventListener for Arc<L> {
    type State = L::State;

    fn before_commit(&self, data: &ChangeSet, reader: &dyn GraphReader) -> Self::State {
        (**self).before_commit(data, reader)
    }

    fn after_commit(&self, data: &ChangeSet, state: Self::State) {
        (**self).after_commit(data, state)
    }

    fn after_rollback(&self, data: &ChangeSet, state: Self::State) {
        (**self).after_rollback(data, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::SinkDispatcher;
    use crate::sink::MemorySink;
    use cairn_core::MemoryGraph;

    fn run_hook<L: TransactionEventListener>(listener: &L, data: &ChangeSet, committed: bool) {
        let state = listener.before_commit(data, &MemoryGraph::new());
        if committed {
            listener.after_commit(data, state);
        } else {
            listener.after_rollback(data, state);
        }
    }

    #[test]
    fn test_auditor_as_listener() {
        let sink = Arc::new(MemorySink::new());
        let auditor = Arc::new(CommitAuditor::new(
            SinkDispatcher::disabled().with_metadata(sink.clone()),
        ));

        let mut data = ChangeSet::new("alice");
        data.created_nodes = vec![1];
        run_hook(&auditor, &data, true);
        run_hook(&auditor, &data, false);

        // Records are produced before commit; rollback does not retract them
        assert_eq!(sink.len(), 2);
    }
}
