//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request bridging produces:
//!     → events.rs (MetricsEvent / LogEvent, published to bus subjects)
//!     → metrics.rs (counters, histograms)
//!     → tracing spans/events (stdout, structured)
//!
//! Consumers:
//!     → Backend services subscribed to the side-channel subjects
//!     → Metrics endpoint (Prometheus scrape)
//!     → Log aggregation (stdout)
//! ```
//!
//! # Design Decisions
//! - Side-channel publishes are detached and best-effort by contract
//! - The gateway's own metrics are cheap (atomic increments)
//! - Trace correlation uses a single configurable header, not a full
//!   distributed-tracing stack

pub mod events;
pub mod metrics;

pub use events::{LogEvent, MetricsEvent, Outcome, SidePublisher};
