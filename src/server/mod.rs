//! Dual-protocol front end.
//!
//! One registry, two listeners:
//! - `TransportRegistrar` - native gRPC on `port`, accept loop on a spawned task
//! - `ProtocolBridge` - gRPC-Web translation and CORS over the same registry
//! - `BridgeListener` - HTTP on `port + 1`, accept loop on the caller's task

pub mod bridge;
pub mod listener;
pub mod registrar;

pub use bridge::{classify, BridgedCall, Framing, OriginPolicy, ProtocolBridge};
pub use listener::BridgeListener;
pub use registrar::TransportRegistrar;

use crate::types::{Config, Result};

/// Run both listeners until one of them fails.
///
/// A bind failure on the native port returns before the bridge is built. After
/// that, whichever accept loop ends first ends the call with its error. The
/// native listener is closed before `run` returns, so neither port is left
/// serving on its own.
pub async fn run(config: &Config) -> Result<()> {
    config.validate()?;
    let native_addr = config.server.native_addr()?;
    let bridge_addr = config.server.bridge_addr()?;

    let mut native = TransportRegistrar::start(native_addr).await?;
    let bridge = ProtocolBridge::wrap(native.registry(), config.bridge.origin_policy());
    let listener = match BridgeListener::bind(bridge_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            native.stop().await;
            return Err(err);
        }
    };

    let result = tokio::select! {
        result = native.wait() => result,
        result = listener.serve_forever(bridge) => result,
    };
    native.stop().await;
    result
}
