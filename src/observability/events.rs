//! Side-channel events published to the bus.
//!
//! # Responsibilities
//! - Define the metrics/log event wire shapes
//! - Publish them fire-and-forget after each completed request
//! - Keep side-channel failures away from the response path

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;

use crate::bus::BusClient;
use crate::config::ObservabilityConfig;
use crate::observability::metrics;

/// Terminal outcome of one bridged request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Replied,
    TimedOut,
    TransportError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Replied => "replied",
            Outcome::TimedOut => "timed_out",
            Outcome::TransportError => "transport_error",
        }
    }
}

/// Event published to `metrics_subject` after each completed request.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsEvent {
    pub method: String,
    pub path: String,
    pub subject: String,
    pub outcome: Outcome,
    pub status: u16,
    pub elapsed_ms: u64,
    /// RFC 3339 wall-clock time the request finished.
    pub timestamp: String,
}

impl MetricsEvent {
    /// Capture an event for a completed request, stamped with the current
    /// wall-clock time.
    pub fn capture(
        method: &str,
        path: &str,
        subject: &str,
        outcome: Outcome,
        status: u16,
        elapsed: Duration,
    ) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            subject: subject.to_string(),
            outcome,
            status,
            elapsed_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Event published to `logs_subject`; a superset of [`MetricsEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    #[serde(flatten)]
    pub base: MetricsEvent,
    /// Resolved trace identifier, empty when tracing is disabled.
    pub trace_id: String,
    pub request_bytes: usize,
    pub reply_bytes: usize,
}

/// Fire-and-forget publisher for metrics and log events.
///
/// Publishes run in detached tasks: the HTTP response is never delayed or
/// failed by the side channel. Failures are logged and counted, nothing
/// more.
pub struct SidePublisher {
    bus: Arc<dyn BusClient>,
    metrics_subject: Option<String>,
    logs_subject: Option<String>,
}

impl SidePublisher {
    pub fn new(bus: Arc<dyn BusClient>, config: &ObservabilityConfig) -> Self {
        Self {
            bus,
            metrics_subject: non_empty(&config.metrics_subject),
            logs_subject: non_empty(&config.logs_subject),
        }
    }

    /// Publish both configured events for a completed request.
    ///
    /// Channels without a configured subject publish nothing at all.
    pub fn publish_events(&self, metrics_event: MetricsEvent, log_event: LogEvent) {
        if let Some(subject) = &self.metrics_subject {
            self.spawn_publish(subject.clone(), "metrics", metrics_event);
        }
        if let Some(subject) = &self.logs_subject {
            self.spawn_publish(subject.clone(), "logs", log_event);
        }
    }

    fn spawn_publish<T>(&self, subject: String, channel: &'static str, event: T)
    where
        T: Serialize + Send + 'static,
    {
        let bus = self.bus.clone();
        tokio::spawn(async move {
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => Bytes::from(payload),
                Err(e) => {
                    tracing::warn!(channel = %channel, error = %e, "Failed to serialize side event");
                    metrics::record_side_publish_failure(channel);
                    return;
                }
            };
            if let Err(e) = bus.publish(&subject, payload).await {
                tracing::warn!(channel = %channel, subject = %subject, error = %e, "Side publish failed");
                metrics::record_side_publish_failure(channel);
            }
        });
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
