//! Configuration schema definitions.
//!
//! The gateway resolves its configuration once at startup: hard defaults,
//! then an optional TOML file, then the `NATS_GATEWAY_*` environment
//! overlay. The resulting snapshot is shared read-only for the lifetime of
//! the process; there is no reload path.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,

    /// NATS connection and request/reply settings.
    pub bus: BusConfig,

    /// HTTP response shaping (per-method status codes, content type).
    pub response: ResponseConfig,

    /// Side-channel subjects, trace header and the gateway's own metrics.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// TCP port to listen on; the gateway binds all interfaces.
    pub port: u16,

    /// Maximum accepted request body size in bytes. Larger requests are
    /// refused with 413 before anything is sent to the bus.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            // NATS default max payload
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// NATS connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Server URL, e.g. "nats://127.0.0.1:4222". Comma-separated lists are
    /// passed through to the client untouched.
    pub url: String,

    /// How long to wait for a reply to a bridged request, in milliseconds.
    /// Must be greater than zero.
    pub reply_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            reply_timeout_ms: 10_000,
        }
    }
}

/// HTTP response configuration.
///
/// A successful bus round-trip always yields the status code configured for
/// the request's method, regardless of the reply payload. Timeouts and
/// transport failures use fixed gateway statuses (504/502) instead.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Status code for successful HEAD requests.
    pub head_status: u16,

    /// Status code for successful GET requests.
    pub get_status: u16,

    /// Status code for successful PUT requests.
    pub put_status: u16,

    /// Status code for successful POST requests.
    pub post_status: u16,

    /// Status code for successful PATCH requests.
    pub patch_status: u16,

    /// Status code for successful DELETE requests.
    pub delete_status: u16,

    /// Content-Type header set on every response the gateway emits.
    pub content_type: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            head_status: 200,
            get_status: 200,
            put_status: 201,
            post_status: 201,
            patch_status: 201,
            delete_status: 204,
            content_type: "application/json; charset=utf-8".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Subject to publish a metrics event to after each completed request.
    /// Empty disables metrics events.
    pub metrics_subject: String,

    /// Subject to publish a log event to after each completed request.
    /// Empty disables log events.
    pub logs_subject: String,

    /// Name of the HTTP header used to correlate a request across the
    /// HTTP/bus boundary. Empty disables trace propagation.
    pub trace_header: String,

    /// Enable the gateway's own Prometheus scrape endpoint.
    pub prometheus_enabled: bool,

    /// Prometheus exporter bind address.
    pub prometheus_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_subject: String::new(),
            logs_subject: String::new(),
            trace_header: String::new(),
            prometheus_enabled: true,
            prometheus_address: "0.0.0.0:9090".to_string(),
        }
    }
}
