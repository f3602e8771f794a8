pub mod check;
pub mod config;
pub mod send;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Session relay: webhook-driven messaging over a captured browser session.
#[derive(Debug, Parser)]
#[command(name = "sessionrelay", version, about)]
pub struct Cli {
    /// Config file (defaults to `$SR_CONFIG`, then `config.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Verify the captured session against the platform.
    Check,
    /// Deliver a single message and print the receipt.
    Send {
        /// Recipient user id.
        recipient: String,
        /// Message text.
        message: String,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (file, env and defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Resolve the config path (`--config`, then `SR_CONFIG`, then
/// `config.toml`), load the file if present and apply environment
/// overrides.  Returns the config and the path that was used.
pub fn load_config(
    explicit: Option<PathBuf>,
) -> anyhow::Result<(sr_domain::config::Config, PathBuf)> {
    let config_path = explicit
        .or_else(|| std::env::var_os("SR_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = sr_domain::config::Config::from_file_and_env(&config_path)
        .map_err(|e| anyhow::anyhow!("loading {}: {e}", config_path.display()))?;

    Ok((config, config_path))
}
