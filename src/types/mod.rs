//! Core types for the echo bridge.
//!
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Listener, bridge and observability configuration

mod config;
mod errors;

pub use config::{BridgeConfig, Config, ObservabilityConfig, ServerConfig, DEFAULT_PORT};
pub use errors::{Error, Result};
