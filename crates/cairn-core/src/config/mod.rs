//! Configuration types for Cairn.
//!
//! Configuration is loaded from a single YAML file (`cairn.yaml`). Every
//! field has a default, so an empty file yields a configuration with
//! auditing enabled but no sinks, which is the "audit disabled" fast path.

pub mod audit;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use audit::{
    AuditConfig, EvictionAction, FeatureConfig, ReconciliationConfig, SinkBackend, SinkConfig,
};

/// Complete Cairn configuration loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CairnConfig {
    /// Commit audit configuration.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Diagnostic logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Diagnostic logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CairnConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document parses to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration back to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::from)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (role, sink) in [("logger", &self.audit.logger), ("metadata", &self.audit.metadata)] {
            if let Some(sink) = sink {
                if sink.backend == SinkBackend::File && sink.file_path.is_none() {
                    return Err(ConfigError::Config(format!(
                        "audit.{role}: file backend requires file_path"
                    )));
                }
            }
        }

        if self.audit.reconciliation.max_pending == Some(0) {
            return Err(ConfigError::Config(
                "audit.reconciliation.max_pending must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
