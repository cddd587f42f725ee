use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use nts_server::ServerConfig;
use nts_store::Backend;

#[derive(Parser)]
#[command(
    name = "nts",
    about = "Notes server backed by an in-memory id-keyed store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the notes HTTP server
    Serve(ConfigArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Where the configuration comes from, plus per-key overrides.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Storage backend: hashed or linked
    #[arg(long)]
    pub backend: Option<Backend>,
    /// Identifier given to the first note
    #[arg(long, allow_hyphen_values = true)]
    pub initial_id: Option<i64>,
    /// Append log lines to this file
    #[arg(long, conflicts_with = "no_log_file")]
    pub log_file: Option<PathBuf>,
    /// Log to stdout only
    #[arg(long)]
    pub no_log_file: bool,
    /// Default log filter when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,
}

impl ConfigArgs {
    /// Load the configuration file (or defaults) and apply the overrides.
    pub fn resolve(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(initial_id) = self.initial_id {
            config.initial_id = initial_id;
        }
        if let Some(file) = &self.log_file {
            config.log.file = file.clone();
            config.log.file_enabled = true;
        }
        if self.no_log_file {
            config.log.file_enabled = false;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        Ok(config)
    }
}
