//! Command-line interface.
//!
//! Every flag can also be set through the environment. Flags override values
//! from `--config`, which override the built-in defaults.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::types::{Config, Result};

/// Echo service over native gRPC and gRPC-Web.
#[derive(Debug, Parser)]
#[command(name = "echo-bridge", version, about)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(short, long, env = "ECHO_CONFIG")]
    pub config: Option<PathBuf>,

    /// The server port. The gRPC-Web bridge listens on port + 1.
    #[arg(short, long, env = "ECHO_PORT")]
    pub port: Option<u16>,

    /// Interface for the native gRPC listener.
    #[arg(long, env = "ECHO_HOST")]
    pub host: Option<IpAddr>,

    /// Interface for the gRPC-Web listener.
    #[arg(long, env = "ECHO_BRIDGE_HOST")]
    pub bridge_host: Option<IpAddr>,

    /// Origin allowed to make cross-origin calls (repeatable). All origins are
    /// allowed when none is given.
    #[arg(long = "allowed-origin", env = "ECHO_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, env = "ECHO_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long, env = "ECHO_JSON_LOGS")]
    pub json_logs: bool,
}

impl Cli {
    /// Resolve the effective configuration.
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(bridge_host) = self.bridge_host {
            config.server.bridge_host = bridge_host;
        }
        if !self.allowed_origins.is_empty() {
            config.bridge.allowed_origins = self.allowed_origins;
        }
        if let Some(log_level) = self.log_level {
            config.observability.log_level = log_level;
        }
        if self.json_logs {
            config.observability.json_logs = true;
        }

        config.validate()?;
        Ok(config)
    }
}
