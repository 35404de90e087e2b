//! Error types for the audit crate.

use thiserror::Error;

/// Errors that can occur while handing records to sinks.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to initialize a sink.
    #[error("failed to initialize audit sink: {0}")]
    InitializationFailed(String),

    /// A sink rejected a record.
    #[error("audit sink '{sink}' failed: {reason}")]
    SinkFailed { sink: String, reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
