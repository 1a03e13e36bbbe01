//! Wire types for `echo.EchoService`, generated from `proto/echo.proto`.
//!
//! Exposes `EchoRequest`, `EchoResponse` and the `echo_service_server` /
//! `echo_service_client` modules.

tonic::include_proto!("echo");
