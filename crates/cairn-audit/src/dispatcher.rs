//! Sink dispatcher.
//!
//! Forwards every record to the metadata recorder and the audit logger.
//! Either may be absent; with both absent the dispatcher is empty and the
//! transcriber skips commits entirely.

use cairn_core::config::AuditConfig;
use std::sync::Arc;

use crate::error::AuditError;
use crate::record::AuditRecord;
use crate::sink::{create_sink, AuditSink};

/// Fans records out to the configured sinks.
#[derive(Clone, Default)]
pub struct SinkDispatcher {
    logger: Option<Arc<dyn AuditSink>>,
    metadata: Option<Arc<dyn AuditSink>>,
}

impl SinkDispatcher {
    /// Create a dispatcher from explicit sinks.
    pub fn new(logger: Option<Arc<dyn AuditSink>>, metadata: Option<Arc<dyn AuditSink>>) -> Self {
        Self { logger, metadata }
    }

    /// Create a dispatcher with no sinks.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build sinks from configuration.
    pub fn from_config(config: &AuditConfig) -> Result<Self, AuditError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }

        let logger = config
            .logger
            .as_ref()
            .map(create_sink)
            .transpose()?
            .map(Arc::from);
        let metadata = config
            .metadata
            .as_ref()
            .map(create_sink)
            .transpose()?
            .map(Arc::from);

        Ok(Self { logger, metadata })
    }

    pub fn with_logger(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.logger = Some(sink);
        self
    }

    pub fn with_metadata(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.metadata = Some(sink);
        self
    }

    /// True when no sink is configured.
    pub fn is_empty(&self) -> bool {
        self.logger.is_none() && self.metadata.is_none()
    }

    /// Hand a record to every configured sink.
    ///
    /// Both sinks are always attempted. If either fails, the first failure
    /// is returned after the other sink has been called.
    pub fn emit(&self, record: &AuditRecord) -> Result<(), AuditError> {
        tracing::debug!(
            record_id = %record.record_id,
            action = %record.action,
            entity_type = %record.entity_type,
            user = %record.user,
            entries = record.payload.len(),
            "Audit record"
        );

        let mut first_error = None;
        for sink in [&self.metadata, &self.logger].into_iter().flatten() {
            if let Err(e) = sink.log(record) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for SinkDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkDispatcher")
            .field("logger", &self.logger.as_ref().map(|s| s.name().to_string()))
            .field("metadata", &self.metadata.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}
