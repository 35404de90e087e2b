//! `cairn check-config` command implementation.

use anyhow::{Context, Result};
use std::path::Path;

use cairn_core::CairnConfig;

/// Load, validate and print the resolved configuration.
pub fn run(path: &Path) -> Result<()> {
    let config = CairnConfig::from_file(path)
        .with_context(|| format!("invalid configuration: {}", path.display()))?;

    print!("{}", config.to_yaml()?);

    if !config.audit.has_sinks() {
        eprintln!("note: no audit sink is configured; commits will not be audited");
    }

    Ok(())
}
