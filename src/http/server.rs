//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all gateway handler
//! - Wire up middleware (tracing)
//! - Bind server to listener
//! - Run each request in its own worker task
//! - Graceful shutdown on Ctrl+C / SIGTERM

use std::sync::Arc;

use axum::{
    body::Body, extract::State, http::Request, response::IntoResponse, routing::any, Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::bridge::RequestBridge;
use crate::bus::BusClient;
use crate::config::GatewayConfig;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<RequestBridge>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and bus handle.
    pub fn new(config: &GatewayConfig, bus: Arc<dyn BusClient>) -> Self {
        let bridge = Arc::new(RequestBridge::new(config, bus));
        let router = Self::build_router(AppState { bridge });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run until `shutdown` resolves. Split out so tests can stop the
    /// server without sending process signals.
    pub async fn run_until<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method and path goes through the bridge.
///
/// The bridge runs in its own worker task, so a dropped client connection
/// never cancels the in-flight bus round-trip or the side publishes that
/// follow it. The join handle is the single result channel back; a worker
/// panic is contained there and mapped to 500.
async fn gateway_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> impl IntoResponse {
    let bridge = state.bridge.clone();
    let worker = tokio::spawn(async move { bridge.handle(request).await });

    match worker.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Request worker failed");
            state.bridge.internal_error_response()
        }
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
