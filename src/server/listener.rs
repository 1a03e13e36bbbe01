//! HTTP listener serving the gRPC-Web bridge.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

use crate::server::ProtocolBridge;
use crate::types::{Error, Result};

/// Second listener of the process, bound next to the native one.
#[derive(Debug)]
pub struct BridgeListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl BridgeListener {
    /// Bind the bridge port without serving it yet.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::bind(addr, e))?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address the bridge listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve the bridge on the current task. Per-request failures become HTTP
    /// responses; this only returns when the accept loop itself fails.
    pub async fn serve_forever(self, bridge: ProtocolBridge) -> Result<()> {
        tracing::info!("http server listening at {}", self.local_addr);

        bridge
            .into_router()
            .serve_with_incoming(TcpListenerStream::new(self.listener))
            .await
            .map_err(|e| Error::serve("bridge", e))?;

        Err(Error::ListenerStopped("bridge"))
    }
}
