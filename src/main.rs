//! Echo bridge - main entry point.
//!
//! Serves `echo.EchoService` over native gRPC on `--port` and over gRPC-Web on
//! `--port + 1`. Any bind or serve failure on either listener is fatal.

use std::process::ExitCode;

use clap::Parser;
use echo_bridge::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("echo-bridge: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize observability
    echo_bridge::observability::init_tracing(&config.observability);

    // Only returns on a fatal listener error
    if let Err(err) = echo_bridge::server::run(&config).await {
        tracing::error!("failed to serve: {}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
