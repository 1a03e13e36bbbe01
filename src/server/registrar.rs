//! Native gRPC listener and the service registry it shares with the bridge.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::Routes;
use tonic::transport::Server;

use crate::grpc::EchoHandler;
use crate::proto::echo_service_server::EchoServiceServer;
use crate::types::{Error, Result};

/// Owns the process's single service registry and the native accept loop.
///
/// Dropping the registrar aborts the accept loop and releases the port.
pub struct TransportRegistrar {
    registry: Routes,
    local_addr: SocketAddr,
    task: JoinHandle<Result<()>>,
}

impl TransportRegistrar {
    /// Bind `addr`, register the echo handler and start accepting native gRPC
    /// connections on a spawned task.
    ///
    /// Returns as soon as the listener is bound so the caller can go on to
    /// wrap [`TransportRegistrar::registry`] in the bridge.
    pub async fn start(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::bind(addr, e))?;
        let local_addr = listener.local_addr()?;

        let handler = Arc::new(EchoHandler::new());
        let registry = Routes::new(EchoServiceServer::from_arc(handler));

        tracing::info!("server listening at {}", local_addr);

        let routes = registry.clone();
        let task = tokio::spawn(async move {
            Server::builder()
                .add_routes(routes)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .map_err(|e| Error::serve("native", e))
        });

        Ok(Self {
            registry,
            local_addr,
            task,
        })
    }

    /// Handle to the registry served by the native listener. Clones share the
    /// same handler instance.
    pub fn registry(&self) -> Routes {
        self.registry.clone()
    }

    /// Address the native listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the native accept loop to end. It only ends on failure, so
    /// this always resolves to an error.
    pub async fn wait(&mut self) -> Result<()> {
        (&mut self.task).await??;
        Err(Error::ListenerStopped("native"))
    }

    /// Abort the accept loop and wait until its listener is closed.
    pub async fn stop(mut self) {
        self.task.abort();
        if !self.task.is_finished() {
            let _ = (&mut self.task).await;
        }
    }
}

impl Drop for TransportRegistrar {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl fmt::Debug for TransportRegistrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRegistrar")
            .field("local_addr", &self.local_addr)
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}
