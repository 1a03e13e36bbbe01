//! gRPC-Web bridge over the shared service registry.
//!
//! Requests pass through three layers, outermost first:
//!
//! ```text
//!   HTTP/1.1 ─▶ CORS ─▶ BridgeGuard ─▶ GrpcWeb ─▶ Routes (shared with native listener)
//!              (origin    (reject non     (binary/base64 framing,
//!               policy)    gRPC-Web)        trailers in body)
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use tonic::body::{empty_body, BoxBody};
use tonic::service::Routes;
use tonic::transport::server::Router;
use tonic::transport::Server;
use tonic_web::GrpcWebLayer;
use tower::layer::util::{Identity, Stack};
use tower::{Layer, Service};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::types::{Error, Result};

const MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

const ALLOW_HEADERS: [HeaderName; 4] = [
    HeaderName::from_static("x-grpc-web"),
    header::CONTENT_TYPE,
    HeaderName::from_static("x-user-agent"),
    HeaderName::from_static("grpc-timeout"),
];

const EXPOSED_HEADERS: [HeaderName; 3] = [
    HeaderName::from_static("grpc-status"),
    HeaderName::from_static("grpc-message"),
    HeaderName::from_static("grpc-status-details-bin"),
];

/// Layer stack of the bridge router, innermost first.
pub type BridgeStack = Stack<GrpcWebLayer, Stack<BridgeGuardLayer, Stack<CorsLayer, Identity>>>;

/// Decides which request origins may read cross-origin responses.
#[derive(Clone)]
pub struct OriginPolicy {
    allows: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl OriginPolicy {
    /// Accept every origin. This is the default and is only suitable for
    /// demonstration deployments.
    pub fn allow_all() -> Self {
        Self::from_fn(|_| true)
    }

    /// Accept exactly the listed origins.
    pub fn allow_list<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: HashSet<String> = origins.into_iter().map(Into::into).collect();
        Self::from_fn(move |origin| origins.contains(origin))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            allows: Arc::new(f),
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        (self.allows)(origin)
    }
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl fmt::Debug for OriginPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginPolicy").finish_non_exhaustive()
    }
}

/// Body framing of a gRPC-Web call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `application/grpc-web[+proto]`
    Binary,
    /// `application/grpc-web-text[+proto]`, base64 encoded.
    Text,
}

/// A request recognised as a gRPC-Web call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgedCall {
    pub framing: Framing,
    pub service: String,
    pub method: String,
}

/// Decide whether a request follows the gRPC-Web convention.
///
/// Content type is checked first, then the HTTP method, then the
/// `/<service>/<method>` path shape. Whether the named method exists is left to
/// the registry.
pub fn classify(method: &Method, path: &str, headers: &HeaderMap) -> Result<BridgedCall> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();
    let framing = framing_for(&content_type).ok_or_else(|| {
        Error::unsupported(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("content-type {content_type:?} is not gRPC-Web"),
        )
    })?;

    if *method != Method::POST {
        return Err(Error::unsupported(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("method {method} is not allowed for gRPC-Web calls"),
        ));
    }

    let (service, rpc) = path
        .strip_prefix('/')
        .and_then(|rest| rest.split_once('/'))
        .filter(|(service, rpc)| !service.is_empty() && !rpc.is_empty() && !rpc.contains('/'))
        .ok_or_else(|| {
            Error::unsupported(
                StatusCode::BAD_REQUEST,
                format!("path {path:?} is not /<service>/<method>"),
            )
        })?;

    Ok(BridgedCall {
        framing,
        service: service.to_string(),
        method: rpc.to_string(),
    })
}

fn framing_for(content_type: &str) -> Option<Framing> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "application/grpc-web" | "application/grpc-web+proto" => Some(Framing::Binary),
        "application/grpc-web-text" | "application/grpc-web-text+proto" => Some(Framing::Text),
        _ => None,
    }
}

/// Layer producing [`BridgeGuard`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeGuardLayer;

impl<S> Layer<S> for BridgeGuardLayer {
    type Service = BridgeGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BridgeGuard { inner }
    }
}

/// Answers requests that are not gRPC-Web calls with an HTTP error status
/// instead of forwarding them.
#[derive(Debug, Clone)]
pub struct BridgeGuard<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for BridgeGuard<S>
where
    S: Service<Request<B>, Response = Response<BoxBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response<BoxBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        match classify(request.method(), request.uri().path(), request.headers()) {
            Ok(call) => {
                tracing::debug!(
                    service = %call.service,
                    method = %call.method,
                    framing = ?call.framing,
                    "bridged call"
                );
                Box::pin(self.inner.call(request))
            }
            Err(err) => {
                tracing::warn!("rejecting bridge request: {}", err);
                let response = rejection(&err);
                Box::pin(async move { Ok::<_, S::Error>(response) })
            }
        }
    }
}

fn rejection(err: &Error) -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = err.to_http_status();
    response
}

fn cors_layer(policy: OriginPolicy) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &http::request::Parts| {
                policy.allows(&String::from_utf8_lossy(origin.as_bytes()))
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(ALLOW_HEADERS)
        .expose_headers(EXPOSED_HEADERS)
        .max_age(MAX_AGE)
}

/// Translates gRPC-Web requests into calls on the shared registry.
#[derive(Clone)]
pub struct ProtocolBridge {
    registry: Routes,
    origin_policy: OriginPolicy,
}

impl ProtocolBridge {
    pub fn wrap(registry: Routes, origin_policy: OriginPolicy) -> Self {
        Self {
            registry,
            origin_policy,
        }
    }

    /// Build the HTTP entry point served by the bridge listener.
    pub fn into_router(self) -> Router<BridgeStack> {
        Server::builder()
            .accept_http1(true)
            .layer(cors_layer(self.origin_policy))
            .layer(BridgeGuardLayer)
            .layer(GrpcWebLayer::new())
            .add_routes(self.registry)
    }
}

impl fmt::Debug for ProtocolBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolBridge")
            .field("origin_policy", &self.origin_policy)
            .finish_non_exhaustive()
    }
}
