use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cairn_core::CairnConfig;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "cairn", version, about = "Cairn commit audit CLI")]
struct Cli {
    /// Log filter (overrides RUST_LOG and the config file), e.g. "debug" or "cairn_audit=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay recorded commits through one commit auditor, in order.
    Replay {
        /// Commit fixtures (JSON): { "change_set": {...}, "graph": {...} }
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Configuration file (YAML). Defaults to a console logger sink.
        #[arg(long, short, env = "CAIRN_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Parse a configuration file and print the resolved configuration.
    CheckConfig {
        /// Configuration file (YAML)
        path: PathBuf,
    },
}

fn init_tracing(cli_level: Option<&str>, config_level: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };

    // Diagnostics go to stderr so stdout stays clean for console sink records.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Replay { files, config } => {
            let config = commands::replay::load_config(config.as_deref())?;
            init_tracing(cli.log_level.as_deref(), &config.logging.level);
            let summary = commands::replay::run(&files, &config)?;
            tracing::info!(
                commits = summary.commits,
                pending = summary.pending.len(),
                "Replay finished"
            );
        }
        Command::CheckConfig { path } => {
            init_tracing(cli.log_level.as_deref(), &CairnConfig::default().logging.level);
            commands::check::run(&path)?;
        }
    }

    Ok(())
}
