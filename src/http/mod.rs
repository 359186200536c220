//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → worker task per request
//!     → bridge (HTTP ↔ bus translation)
//!     → response sent to client
//! ```

pub mod server;

pub use server::HttpServer;
