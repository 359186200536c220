//! Bus client abstraction.
//!
//! # Responsibilities
//! - Define the request/reply and fire-and-forget surface the bridge uses
//! - Keep the bridge and its tests independent of any live connection type
//! - Map transport failures into a small, matchable error vocabulary

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors surfaced by a [`BusClient`].
#[derive(Debug, Error)]
pub enum BusError {
    /// No reply arrived before the deadline.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// Nothing is subscribed on the subject.
    #[error("no responders on subject {0}")]
    NoResponders(String),

    /// The request could not complete for transport reasons.
    #[error("bus request failed: {0}")]
    Request(String),

    /// A fire-and-forget publish failed.
    #[error("bus publish failed: {0}")]
    Publish(String),
}

/// Minimal client surface over the message bus.
///
/// `request` owns the reply deadline: implementations resolve with
/// [`BusError::Timeout`] once `timeout` elapses and discard any reply that
/// arrives later. Callers never stack a second timer on top.
#[async_trait]
pub trait BusClient: Send + Sync + 'static {
    /// Publish `payload` on `subject` and await a single reply.
    async fn request(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, BusError>;

    /// Publish `payload` on `subject` without waiting for anything.
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError>;
}
