//! HTTP API gateway
//!
//! A single entry point in front of backend services, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌─────────────────────────────────────────────────────────┐
//!                              │                      API GATEWAY                         │
//!                              │                                                          │
//!     Client Request           │  ┌─────────┐    ┌──────────┐    ┌──────────────┐        │
//!     ─────────────────────────┼─▶│  http   │───▶│ identity │───▶│   routing    │        │
//!                              │  │ server  │    │ provider │    │ (RouteTable) │        │
//!                              │  └─────────┘    └──────────┘    └──────┬───────┘        │
//!                              │                                        │                 │
//!                              │                                        ▼                 │
//!                              │                                ┌──────────────┐         │
//!                              │                                │ access gate  │         │
//!                              │                                │ (per route)  │         │
//!                              │                                └──────┬───────┘         │
//!                              │                                        │                 │
//!                              │                                        ▼                 │
//!     Client Response          │  ┌─────────┐    ┌──────────┐    ┌──────────────┐        │
//!     ◀────────────────────────┼──│response │◀───│ headers  │◀───│  forwarding  │◀───────┼──── Backend
//!                              │  │ mapping │    │ + codec  │    │    engine    │        │     Service
//!                              │  └─────────┘    └──────────┘    └──────────────┘        │
//!                              │                                                          │
//!                              │  ┌────────────────────────────────────────────────────┐ │
//!                              │  │              Cross-Cutting Concerns                 │ │
//!                              │  │  ┌─────────┐ ┌──────────────┐ ┌──────────────────┐ │ │
//!                              │  │  │ config  │ │observability │ │    lifecycle     │ │ │
//!                              │  │  │ + env   │ │ logs/metrics │ │ signals/shutdown │ │ │
//!                              │  │  └─────────┘ └──────────────┘ └──────────────────┘ │ │
//!                              │  └────────────────────────────────────────────────────┘ │
//!                              └─────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config::{loader, GatewayConfig};
use api_gateway::lifecycle::{signals, Shutdown};
use api_gateway::observability::{logging, metrics};
use api_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "HTTP API gateway", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

fn load(args: &Args) -> Result<GatewayConfig, loader::ConfigError> {
    match &args.config {
        Some(path) => loader::load_config(path),
        None => loader::parse_config("", std::env::vars()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load(&args)?;

    logging::init(&config.observability);

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    let source = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<defaults>".to_string());
    tracing::info!(
        config = %source,
        bind_address = %config.listener.bind_address,
        base_path = %config.base_path,
        backends = config.backends.len(),
        routes = config.routes.len(),
        security_mode = ?config.security.mode,
        "Configuration loaded"
    );
    for (name, url) in &config.backends {
        tracing::debug!(backend = %name, url = %url, "Backend configured");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = GatewayServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signals::wait_for_termination().await;
            shutdown.trigger();
        }
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
