//! Request bridging subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP entrypoint
//!     → handler.rs (RequestBridge::handle)
//!     → subject derivation + envelope.rs (wire form)
//!     → bus request/reply, bounded by the configured deadline
//!     → status/error mapping → HTTP response
//!     → detached metrics/log side publishes
//! ```
//!
//! # Design Decisions
//! - One bus round-trip per request, no retries
//! - At most one response per request, produced exactly once
//! - Side publishes happen after the response is determined and are not on
//!   the latency-critical path

pub mod envelope;
pub mod handler;

pub use envelope::BusEnvelope;
pub use handler::{BridgeOutcome, RequestBridge};
