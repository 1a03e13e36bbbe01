//! EchoService gRPC implementation.
//!
//! The handler is shared by the native listener and the gRPC-Web bridge, so
//! anything done here is visible on both transports.

use tonic::{Request, Response, Status};

use crate::proto::echo_service_server::EchoService;
use crate::proto::{EchoRequest, EchoResponse};

/// Stateless handler for `echo.EchoService`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl EchoHandler {
    /// Create a new echo handler.
    pub fn new() -> Self {
        Self
    }

    /// Build the response for a request. The message is returned unchanged.
    pub fn reply(&self, request: EchoRequest) -> EchoResponse {
        tracing::info!("Server Received -> {}", request.message);
        EchoResponse {
            message: request.message,
        }
    }
}

#[tonic::async_trait]
impl EchoService for EchoHandler {
    async fn echo(
        &self,
        request: Request<EchoRequest>,
    ) -> std::result::Result<Response<EchoResponse>, Status> {
        Ok(Response::new(self.reply(request.into_inner())))
    }
}
