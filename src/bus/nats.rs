//! NATS-backed implementation of [`BusClient`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::bus::client::{BusClient, BusError};
use crate::config::BusConfig;

/// Thin wrapper over [`async_nats::Client`].
///
/// The per-request deadline is handed straight to the NATS client, which
/// resolves the request with a timeout error once it elapses. Replies that
/// arrive after that point land on a dead inbox and are dropped inside the
/// client, so late responders never reach the bridge.
#[derive(Clone)]
pub struct NatsClient {
    inner: async_nats::Client,
}

impl NatsClient {
    /// Connect to the configured NATS server.
    pub async fn connect(config: &BusConfig) -> Result<Self, async_nats::ConnectError> {
        let inner = async_nats::ConnectOptions::new()
            .name("nats-gateway")
            .connect(&config.url)
            .await?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl BusClient for NatsClient {
    async fn request(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, BusError> {
        let request = async_nats::Request::new()
            .payload(payload)
            .timeout(Some(timeout));

        match self.inner.send_request(subject.to_string(), request).await {
            Ok(message) => Ok(message.payload),
            Err(e) => match e.kind() {
                async_nats::RequestErrorKind::TimedOut => Err(BusError::Timeout(timeout)),
                async_nats::RequestErrorKind::NoResponders => {
                    Err(BusError::NoResponders(subject.to_string()))
                }
                async_nats::RequestErrorKind::Other => Err(BusError::Request(e.to_string())),
            },
        }
    }

    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError> {
        self.inner
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| BusError::Publish(e.to_string()))
    }
}
