//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use std::net::SocketAddr;

use http::StatusCode;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the echo bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// A listener could not acquire its address (fatal).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// An accept loop exited with a transport error after binding (fatal).
    #[error("{listener} listener failed to serve: {source}")]
    Serve {
        listener: &'static str,
        #[source]
        source: tonic::transport::Error,
    },

    /// An accept loop returned without an error. Listeners are expected to run
    /// for the process lifetime, so this is fatal too.
    #[error("{0} listener stopped unexpectedly")]
    ListenerStopped(&'static str),

    /// The background listener task panicked or was aborted.
    #[error("listener task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// An HTTP request on the bridge that is not a gRPC-Web call.
    #[error("unsupported request: {reason}")]
    UnsupportedRequest { status: StatusCode, reason: String },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert to the HTTP status returned to a bridge client.
    pub fn to_http_status(&self) -> StatusCode {
        match self {
            Error::UnsupportedRequest { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind { addr, source }
    }

    pub fn serve(listener: &'static str, source: tonic::transport::Error) -> Self {
        Self::Serve { listener, source }
    }

    pub fn unsupported(status: StatusCode, reason: impl Into<String>) -> Self {
        Self::UnsupportedRequest {
            status,
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
