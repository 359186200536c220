//! HTTP to NATS request/reply gateway library.

pub mod bridge;
pub mod bus;
pub mod config;
pub mod http;
pub mod observability;

pub use bridge::{BusEnvelope, RequestBridge};
pub use bus::{BusClient, BusError, NatsClient};
pub use config::GatewayConfig;
pub use http::HttpServer;
