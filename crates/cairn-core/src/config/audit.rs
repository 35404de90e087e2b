//! Commit audit configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the commit audit transcriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether commit auditing is enabled. When false no sink is built.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Audit logger sink. Absent when not configured.
    #[serde(default)]
    pub logger: Option<SinkConfig>,

    /// Metadata recorder sink. Absent when not configured.
    #[serde(default)]
    pub metadata: Option<SinkConfig>,

    /// Switches for categories that are collected but not reported by default.
    #[serde(default)]
    pub features: FeatureConfig,

    /// Deleted-node reconciliation settings.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

/// Sink destination.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SinkConfig {
    /// Sink backend type.
    #[serde(default)]
    pub backend: SinkBackend,

    /// File path (for file backend).
    #[serde(default)]
    pub file_path: Option<String>,
}

impl SinkConfig {
    pub fn console() -> Self {
        Self {
            backend: SinkBackend::Console,
            file_path: None,
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            backend: SinkBackend::File,
            file_path: Some(path.into()),
        }
    }
}

/// Sink backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkBackend {
    /// One JSON line per record on stdout.
    #[default]
    Console,
    /// JSON Lines appended to a file.
    File,
}

/// Categories that are disabled unless switched on.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FeatureConfig {
    /// Report removed node properties as `delete`/`properties` records.
    #[serde(default)]
    pub removed_node_properties: bool,
}

/// Bounds for the deleted-node reconciliation buffer.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ReconciliationConfig {
    /// Maximum number of pending deleted nodes. `None` keeps every entry
    /// until its removed-label event arrives.
    #[serde(default)]
    pub max_pending: Option<usize>,

    /// What happens to the oldest pending node when the bound is exceeded.
    #[serde(default)]
    pub on_evict: EvictionAction,
}

/// Handling of a pending node pushed out of a bounded buffer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvictionAction {
    /// Forget the node; its deletion is never reported.
    #[default]
    Drop,
    /// Report the deletion without labels.
    EmitIncomplete,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            logger: None,
            metadata: None,
            features: FeatureConfig::default(),
            reconciliation: ReconciliationConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Whether at least one sink would be built from this configuration.
    pub fn has_sinks(&self) -> bool {
        self.enabled && (self.logger.is_some() || self.metadata.is_some())
    }
}

fn default_enabled() -> bool {
    true
}
