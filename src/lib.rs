//! # Echo Bridge - one echo service, two wire protocols
//!
//! A single `echo.EchoService/Echo` handler served over:
//! - native gRPC (HTTP/2) on `port`
//! - gRPC-Web (HTTP/1.1, binary or base64 text framing) on `port + 1`
//!
//! ## Architecture
//!
//! ```text
//!   gRPC clients    ─▶ :port    ─▶ TransportRegistrar ─┐
//!                                                       ├─▶ Routes ─▶ EchoHandler
//!   browser clients ─▶ :port+1  ─▶ BridgeListener      │
//!                                   └─ ProtocolBridge ──┘
//!                                      (CORS, guard, gRPC-Web)
//! ```
//!
//! Both listeners share one registry; the bridge only translates framing.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod cli;
pub mod grpc;
pub mod proto;
pub mod server;
pub mod types;

// Internal utilities
pub mod observability;

pub use types::{Config, Error, Result};
