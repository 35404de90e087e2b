//! `cairn replay` command implementation.
//!
//! Feeds recorded commits through a single `CommitAuditor`, in the order
//! given, so deletions buffered by one fixture can be completed by a later
//! one. Whatever is still pending at the end is reported on stderr.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use cairn_audit::CommitAuditor;
use cairn_core::config::SinkConfig;
use cairn_core::{CairnConfig, ChangeSet, MemoryGraph, NodeId};

/// One recorded commit: the diff plus the label state visible to the hook.
#[derive(Debug, Deserialize)]
pub struct CommitFixture {
    pub change_set: ChangeSet,

    #[serde(default)]
    pub graph: MemoryGraph,
}

/// Outcome of a replay run.
#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub commits: usize,
    /// Deleted nodes still waiting for a removed-label event.
    pub pending: Vec<NodeId>,
}

/// Load the config file, or fall back to a console logger sink.
pub fn load_config(path: Option<&Path>) -> Result<CairnConfig> {
    match path {
        Some(path) => CairnConfig::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display())),
        None => {
            let mut config = CairnConfig::default();
            config.audit.logger = Some(SinkConfig::console());
            Ok(config)
        }
    }
}

fn load_fixture(path: &Path) -> Result<CommitFixture> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid commit fixture: {}", path.display()))
}

pub fn run(files: &[PathBuf], config: &CairnConfig) -> Result<ReplaySummary> {
    let auditor = CommitAuditor::from_config(&config.audit).context("failed to build audit sinks")?;
    if !auditor.is_enabled() {
        tracing::warn!("No audit sink configured; replayed commits will not be audited");
    }

    // Parse everything up front so a bad file does not leave a half-replayed run.
    let fixtures = files
        .iter()
        .map(|path| load_fixture(path))
        .collect::<Result<Vec<_>>>()?;

    let mut summary = ReplaySummary::default();
    for (path, fixture) in files.iter().zip(&fixtures) {
        tracing::info!(
            file = %path.display(),
            user = %fixture.change_set.username,
            "Replaying commit"
        );
        auditor.process_commit(&fixture.change_set, &fixture.graph);
        summary.commits += 1;
    }

    summary.pending = auditor.buffer().pending();
    if !summary.pending.is_empty() {
        eprintln!(
            "{} deleted node(s) still awaiting removed-label events: {:?}",
            summary.pending.len(),
            summary.pending
        );
    }

    Ok(summary)
}
