//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! hard defaults
//!     → loader.rs (optional TOML file, parse & deserialize)
//!     → env.rs (NATS_GATEWAY_* overlay)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup; there is no reload path
//! - All fields have defaults, so the gateway runs with no file at all
//! - Environment variables override the file, never the other way round
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::BusConfig;
pub use schema::GatewayConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ResponseConfig;
