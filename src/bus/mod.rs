//! Message bus subsystem.
//!
//! # Responsibilities
//! - Abstract the bus behind a small client trait so the bridge and its
//!   tests never depend on a live connection type
//! - Map transport errors into the gateway's own error vocabulary
//! - Derive request subjects from HTTP method and path

pub mod client;
pub mod nats;
pub mod subject;

pub use client::{BusClient, BusError};
pub use nats::NatsClient;
