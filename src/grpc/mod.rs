//! gRPC service implementations.
//!
//! - EchoService - returns every message unchanged

pub mod echo_service;

pub use echo_service::EchoHandler;
