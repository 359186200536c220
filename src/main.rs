//! HTTP to NATS request/reply gateway.
//!
//! Accepts ordinary HTTP requests, maps each one onto a NATS subject,
//! waits a bounded time for a single reply and translates the outcome back
//! into an HTTP response.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │                  NATS GATEWAY                  │
//!                     │                                                │
//!    HTTP Request     │  ┌──────────┐     ┌────────────────────────┐   │
//!    ─────────────────┼─▶│   http   │────▶│         bridge         │   │
//!                     │  │  server  │     │  subject derivation    │   │
//!                     │  └──────────┘     │  envelope construction │   │
//!                     │                   │  deadline + status map │   │
//!                     │                   └───────────┬────────────┘   │
//!                     │                               │ request/reply  │
//!    HTTP Response    │  ┌──────────┐     ┌───────────▼────────────┐   │
//!    ◀────────────────┼──│ response │◀────│       bus client       │◀──┼── NATS
//!                     │  │ mapping  │     │  (async-nats adapter)  │   │   subjects
//!                     │  └──────────┘     └───────────┬────────────┘   │
//!                     │                               │ fire-and-forget│
//!                     │                   ┌───────────▼────────────┐   │
//!                     │                   │ metrics/log side events│   │
//!                     │                   └────────────────────────┘   │
//!                     │                                                │
//!                     │  Cross-cutting: config, validation, tracing,   │
//!                     │  Prometheus exporter                           │
//!                     └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nats_gateway::bus::NatsClient;
use nats_gateway::config::load_config;
use nats_gateway::http::HttpServer;
use nats_gateway::observability::metrics::init_metrics;

#[derive(Parser)]
#[command(name = "nats-gateway")]
#[command(about = "HTTP to NATS request/reply gateway", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. NATS_GATEWAY_* environment
    /// variables override file settings.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nats_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("nats-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_deref())?;

    tracing::info!(
        port = config.listener.port,
        bus_url = %config.bus.url,
        reply_timeout_ms = config.bus.reply_timeout_ms,
        metrics_subject = %config.observability.metrics_subject,
        logs_subject = %config.observability.logs_subject,
        trace_header = %config.observability.trace_header,
        "Configuration loaded"
    );

    // Metrics exporter for the gateway's own counters
    if config.observability.prometheus_enabled {
        if let Ok(addr) = config.observability.prometheus_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                prometheus_address = %config.observability.prometheus_address,
                "Failed to parse Prometheus address"
            );
        }
    }

    tracing::info!(url = %config.bus.url, "Connecting to NATS");
    let bus = NatsClient::connect(&config.bus).await?;
    tracing::info!("Connected to NATS");

    let listener = TcpListener::bind(("0.0.0.0", config.listener.port)).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let server = HttpServer::new(&config, Arc::new(bus));
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
