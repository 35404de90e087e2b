//! Audit sink backends.
//!
//! Sinks are synchronous: a commit callback blocks until every sink has
//! returned. Persistence, retry and backpressure are the sink's business.

use cairn_core::config::{SinkBackend, SinkConfig};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::error::AuditError;
use crate::record::{Action, AuditRecord, EntityType};

/// Trait for audit record consumers.
pub trait AuditSink: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Hand one record to the sink.
    fn log(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Create a sink based on configuration.
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn AuditSink>, AuditError> {
    match config.backend {
        SinkBackend::Console => Ok(Box::new(ConsoleSink)),
        SinkBackend::File => {
            let path = config.file_path.as_deref().ok_or_else(|| {
                AuditError::InitializationFailed("file sink requires file_path".to_string())
            })?;
            Ok(Box::new(FileSink::new(path)?))
        }
    }
}

/// Console sink (one JSON line per record on stdout).
pub struct ConsoleSink;

impl AuditSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn log(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(record)?;
        println!("{}", json);
        Ok(())
    }
}

/// File sink (appends JSON Lines to a file).
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) the file in append mode.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn log(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(record)?;
        // One writer at a time so lines from concurrent commits never interleave.
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "{}", json)?;
        file.flush()?;
        Ok(())
    }
}

/// Filter for querying a [`MemorySink`].
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub action: Option<Action>,
    pub entity_type: Option<EntityType>,
    pub user: Option<String>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl RecordFilter {
    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(action) = self.action {
            if record.action != action {
                return false;
            }
        }
        if let Some(entity_type) = self.entity_type {
            if record.entity_type != entity_type {
                return false;
            }
        }
        if let Some(ref user) = self.user {
            if &record.user != user {
                return false;
            }
        }
        true
    }
}

/// In-process sink that keeps every record.
#[derive(Default)]
pub struct MemorySink {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in arrival order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records matching a filter, in arrival order.
    pub fn query(&self, filter: &RecordFilter) -> Vec<AuditRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let matching = records.iter().filter(|r| filter.matches(r)).cloned();
        match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl AuditSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn log(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
