//! Configuration structures.
//!
//! Configuration is layered: defaults, then an optional JSON file, then CLI
//! flags and environment variables (see [`crate::cli`]).

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use crate::server::OriginPolicy;
use crate::types::{Error, Result};

/// Default port of the native gRPC listener.
pub const DEFAULT_PORT: u16 = 50051;

/// Global service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// gRPC-Web bridge configuration.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load a configuration file. Missing sections fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Check the invariants `run` relies on.
    pub fn validate(&self) -> Result<()> {
        self.server.bridge_port().map(|_| ())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface for the native gRPC listener.
    pub host: IpAddr,

    /// Interface for the gRPC-Web listener.
    pub bridge_host: IpAddr,

    /// Native gRPC port. The bridge always listens on `port + 1`.
    pub port: u16,
}

impl ServerConfig {
    pub fn native_addr(&self) -> Result<SocketAddr> {
        if self.port == 0 {
            return Err(Error::config("port must be non-zero"));
        }
        Ok(SocketAddr::new(self.host, self.port))
    }

    pub fn bridge_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(self.bridge_host, self.bridge_port()?))
    }

    fn bridge_port(&self) -> Result<u16> {
        if self.port == 0 {
            return Err(Error::config("port must be non-zero"));
        }
        self.port.checked_add(1).ok_or_else(|| {
            Error::config(format!(
                "port {} leaves no room for the bridge listener on port + 1",
                self.port
            ))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bridge_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}

/// gRPC-Web bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Origins allowed to read cross-origin responses. Empty allows every
    /// origin.
    pub allowed_origins: Vec<String>,
}

impl BridgeConfig {
    pub fn origin_policy(&self) -> OriginPolicy {
        if self.allowed_origins.is_empty() {
            OriginPolicy::allow_all()
        } else {
            OriginPolicy::allow_list(self.allowed_origins.iter().cloned())
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
