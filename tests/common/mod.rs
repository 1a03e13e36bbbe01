//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Buf, Bytes};
use echo_bridge::proto::echo_service_client::EchoServiceClient;
use echo_bridge::server::{BridgeListener, OriginPolicy, ProtocolBridge, TransportRegistrar};
use prost::Message;
use tonic::transport::Channel;

pub const ECHO_PATH: &str = "/echo.EchoService/Echo";

/// Both listeners running in-process on ephemeral loopback ports.
pub struct TestServers {
    pub native_addr: SocketAddr,
    pub bridge_addr: SocketAddr,
    _native: tokio::task::JoinHandle<echo_bridge::Result<()>>,
    _bridge: tokio::task::JoinHandle<echo_bridge::Result<()>>,
}

impl TestServers {
    pub fn bridge_url(&self, path: &str) -> String {
        format!("http://{}{}", self.bridge_addr, path)
    }

    pub async fn native_client(&self) -> EchoServiceClient<Channel> {
        EchoServiceClient::connect(format!("http://{}", self.native_addr))
            .await
            .unwrap()
    }
}

/// Start both listeners with the given origin policy. Listeners are bound
/// before this returns, so no warm-up delay is needed.
pub async fn start_servers(policy: OriginPolicy) -> TestServers {
    let native = TransportRegistrar::start("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let native_addr = native.local_addr();

    let bridge = ProtocolBridge::wrap(native.registry(), policy);
    let listener = BridgeListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let bridge_addr = listener.local_addr();

    TestServers {
        native_addr,
        bridge_addr,
        _native: tokio::spawn(async move {
            let mut native = native;
            native.wait().await
        }),
        _bridge: tokio::spawn(listener.serve_forever(bridge)),
    }
}

/// Find a free port whose neighbour is also free.
pub fn free_port_pair() -> u16 {
    for _ in 0..100 {
        let candidate = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = candidate.local_addr().unwrap().port();
        if port == u16::MAX {
            continue;
        }
        if std::net::TcpListener::bind(("127.0.0.1", port + 1)).is_ok() {
            return port;
        }
    }
    panic!("no adjacent free ports on loopback");
}

/// Connect to a native listener that may still be starting.
pub async fn connect_with_retry(addr: SocketAddr) -> EchoServiceClient<Channel> {
    for _ in 0..100 {
        if let Ok(client) = EchoServiceClient::connect(format!("http://{addr}")).await {
            return client;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("native listener at {addr} never came up");
}

/// Length-prefixed gRPC-Web data frame.
pub fn grpc_web_frame(message: &impl Message) -> Vec<u8> {
    let payload = message.encode_to_vec();
    let mut frame = Vec::with_capacity(5 + payload.len());
    frame.push(0x00);
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    frame
}

/// Decoded gRPC-Web response body.
#[derive(Debug, Default)]
pub struct GrpcWebReply {
    pub messages: Vec<Bytes>,
    pub trailers: HashMap<String, String>,
}

impl GrpcWebReply {
    pub fn decode<M: Message + Default>(&self, index: usize) -> M {
        M::decode(self.messages[index].clone()).unwrap()
    }
}

/// Split a binary gRPC-Web body into data frames and the trailer frame.
pub fn parse_grpc_web_body(mut body: Bytes) -> GrpcWebReply {
    let mut reply = GrpcWebReply::default();
    while body.has_remaining() {
        let flag = body.get_u8();
        let len = body.get_u32() as usize;
        let data = body.split_to(len);
        if flag & 0x80 != 0 {
            let text = String::from_utf8(data.to_vec()).unwrap();
            for line in text.split("\r\n").filter(|l| !l.is_empty()) {
                let (name, value) = line.split_once(':').unwrap();
                reply
                    .trailers
                    .insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        } else {
            reply.messages.push(data);
        }
    }
    reply
}

/// Decode a base64 gRPC-Web text body. Chunks may be padded independently, so
/// decode one 4-character quantum at a time.
pub fn decode_text_body(text: &[u8]) -> Bytes {
    let mut decoded = Vec::new();
    for quantum in text.chunks(4) {
        decoded.extend(STANDARD.decode(quantum).unwrap());
    }
    Bytes::from(decoded)
}

/// `grpc-status` from either the trailer frame or, for trailers-only
/// responses, the HTTP headers.
pub fn grpc_status(headers: &reqwest::header::HeaderMap, reply: &GrpcWebReply) -> Option<String> {
    reply.trailers.get("grpc-status").cloned().or_else(|| {
        headers
            .get("grpc-status")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}
