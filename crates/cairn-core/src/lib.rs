//! # cairn-core
//!
//! Types shared across all Cairn crates.
//!
//! - [`graph`]: the per-transaction change set handed over by the host graph
//!   engine, and the [`GraphReader`] seam used to look up node labels while
//!   the transaction is still open.
//! - [`config`]: YAML configuration for sinks, reconciliation and logging.

// Configuration types shared across all Cairn crates
pub mod config;

// Change-set model and label lookups
pub mod graph;

pub use config::{
    AuditConfig, CairnConfig, ConfigError, EvictionAction, FeatureConfig, LoggingConfig,
    ReconciliationConfig, SinkBackend, SinkConfig,
};
pub use graph::{
    ChangeSet, GraphReader, LabelEntry, MemoryGraph, NodeId, PropertyEntry, ReadError,
    RelationshipEntry, RelationshipId,
};
