//! Request bridging core.
//!
//! # Responsibilities
//! - Translate exactly one HTTP request into exactly one bus round-trip
//! - Enforce the reply deadline and map timeout/transport failures
//! - Resolve the per-method success status code
//! - Propagate or generate the trace header across the boundary
//! - Emit detached metrics/log events once the response is final
//!
//! # Design Decisions
//! - The bridge never leaves the entrypoint without a terminal response
//! - Success status comes from configuration, never from the reply payload
//! - Failure statuses (504/502) are fixed and distinct from the
//!   configurable success codes
//! - Requests rejected before dispatch (oversized, unreadable) appear in
//!   the gateway's own metrics but not on the side-channel subjects

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use bytes::Bytes;
use uuid::Uuid;

use crate::bridge::envelope::BusEnvelope;
use crate::bus::{subject, BusClient, BusError};
use crate::config::{GatewayConfig, ResponseConfig};
use crate::observability::events::{LogEvent, MetricsEvent, Outcome, SidePublisher};
use crate::observability::metrics;

/// Terminal result of the bus round-trip.
#[derive(Debug)]
pub enum BridgeOutcome {
    Replied(Bytes),
    TimedOut,
    TransportFailed,
}

/// Success status codes for the six bridged methods.
#[derive(Debug, Clone)]
struct MethodStatuses {
    head: StatusCode,
    get: StatusCode,
    put: StatusCode,
    post: StatusCode,
    patch: StatusCode,
    delete: StatusCode,
}

impl MethodStatuses {
    fn from_config(config: &ResponseConfig) -> Self {
        Self {
            head: status_or_ok(config.head_status),
            get: status_or_ok(config.get_status),
            put: status_or_ok(config.put_status),
            post: status_or_ok(config.post_status),
            patch: status_or_ok(config.patch_status),
            delete: status_or_ok(config.delete_status),
        }
    }

    /// Methods outside the configured six succeed with 200.
    fn for_method(&self, method: &Method) -> StatusCode {
        match method.as_str() {
            "HEAD" => self.head,
            "GET" => self.get,
            "PUT" => self.put,
            "POST" => self.post,
            "PATCH" => self.patch,
            "DELETE" => self.delete,
            _ => StatusCode::OK,
        }
    }
}

fn status_or_ok(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::OK)
}

/// How the trace header resolved for one request.
enum TraceValue {
    Disabled,
    /// The caller supplied the header; forwarded byte-for-byte.
    Forwarded(HeaderValue),
    /// The caller did not; the gateway generated an identifier.
    Generated(String),
}

impl TraceValue {
    fn id_string(&self) -> String {
        match self {
            TraceValue::Disabled => String::new(),
            TraceValue::Forwarded(value) => {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            }
            TraceValue::Generated(id) => id.clone(),
        }
    }
}

/// The request/reply bridging engine.
///
/// Stateless across requests: the only shared state is the read-only
/// configuration snapshot and the bus handle, so one instance serves every
/// connection concurrently.
pub struct RequestBridge {
    bus: Arc<dyn BusClient>,
    side: SidePublisher,
    reply_timeout: Duration,
    max_body_bytes: usize,
    content_type: HeaderValue,
    trace_header: Option<HeaderName>,
    statuses: MethodStatuses,
}

impl RequestBridge {
    /// Build the bridge from a validated configuration.
    pub fn new(config: &GatewayConfig, bus: Arc<dyn BusClient>) -> Self {
        let content_type = HeaderValue::from_str(&config.response.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        let trace_header = match config.observability.trace_header.as_str() {
            "" => None,
            name => HeaderName::from_bytes(name.as_bytes()).ok(),
        };

        Self {
            side: SidePublisher::new(bus.clone(), &config.observability),
            bus,
            reply_timeout: Duration::from_millis(config.bus.reply_timeout_ms),
            max_body_bytes: config.listener.max_body_bytes,
            content_type,
            trace_header,
            statuses: MethodStatuses::from_config(&config.response),
        }
    }

    /// Bridge one HTTP request to the bus and back.
    ///
    /// Always returns a terminal response. Requests that cannot be read or
    /// exceed the body limit are rejected here without touching the bus.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let start_time = Instant::now();
        let (parts, body) = request.into_parts();
        let method = parts.method.as_str().to_string();
        let path = parts.uri.path().to_string();

        // Resolved before anything can fail so rejects carry the trace too.
        let trace = self.resolve_trace(&parts.headers);

        // Declared-length check first; bodies without a declared length are
        // bounded by the buffered read below.
        if let Some(declared) = declared_length(&parts.headers) {
            if declared > self.max_body_bytes as u64 {
                tracing::warn!(method = %method, path = %path, declared, "Request body too large");
                metrics::record_request(&method, 413, "rejected", start_time);
                return self.empty_response(StatusCode::PAYLOAD_TOO_LARGE, &trace);
            }
        }

        let body_bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let status = if is_length_limit(&e) {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                tracing::warn!(method = %method, path = %path, error = %e, "Failed to read request body");
                metrics::record_request(&method, status.as_u16(), "rejected", start_time);
                return self.empty_response(status, &trace);
            }
        };
        let request_bytes = body_bytes.len();

        let subject = subject::derive(&parts.method, &path);

        let mut envelope = BusEnvelope::from_parts(&parts, &body_bytes);
        if let (Some(name), TraceValue::Generated(id)) = (&self.trace_header, &trace) {
            envelope.push_header(name.as_str(), id);
        }

        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => Bytes::from(payload),
            Err(e) => {
                tracing::error!(method = %method, path = %path, error = %e, "Failed to serialize envelope");
                metrics::record_request(&method, 500, "rejected", start_time);
                return self.empty_response(StatusCode::INTERNAL_SERVER_ERROR, &trace);
            }
        };

        let dispatched = self.dispatch(&subject, payload).await;

        let (status, reply_bytes, outcome) = match dispatched {
            BridgeOutcome::Replied(reply) => {
                (self.statuses.for_method(&parts.method), reply, Outcome::Replied)
            }
            BridgeOutcome::TimedOut => {
                (StatusCode::GATEWAY_TIMEOUT, Bytes::new(), Outcome::TimedOut)
            }
            BridgeOutcome::TransportFailed => {
                (StatusCode::BAD_GATEWAY, Bytes::new(), Outcome::TransportError)
            }
        };

        let reply_len = reply_bytes.len();
        let mut response = Response::new(Body::from(reply_bytes));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, self.content_type.clone());
        self.mirror_trace(response.headers_mut(), &trace);

        let elapsed = start_time.elapsed();
        metrics::record_request(&method, status.as_u16(), outcome.as_str(), start_time);

        let trace_id = trace.id_string();
        let event = MetricsEvent::capture(
            &method,
            &path,
            &subject,
            outcome,
            status.as_u16(),
            elapsed,
        );
        let log_event = LogEvent {
            base: event.clone(),
            trace_id: trace_id.clone(),
            request_bytes,
            reply_bytes: reply_len,
        };
        self.side.publish_events(event, log_event);

        tracing::debug!(
            method = %method,
            path = %path,
            subject = %subject,
            status = status.as_u16(),
            outcome = outcome.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            trace_id = %trace_id,
            "Request bridged"
        );

        response
    }

    /// Issue the bus round-trip. The deadline is enforced by the client
    /// itself; no second timer is stacked on top.
    async fn dispatch(&self, subject: &str, payload: Bytes) -> BridgeOutcome {
        match self.bus.request(subject, payload, self.reply_timeout).await {
            Ok(reply) => BridgeOutcome::Replied(reply),
            Err(BusError::Timeout(waited)) => {
                tracing::warn!(subject = %subject, waited = ?waited, "No reply before deadline");
                BridgeOutcome::TimedOut
            }
            Err(e) => {
                tracing::warn!(subject = %subject, error = %e, "Bus transport failure");
                BridgeOutcome::TransportFailed
            }
        }
    }

    fn resolve_trace(&self, headers: &HeaderMap) -> TraceValue {
        let Some(name) = &self.trace_header else {
            return TraceValue::Disabled;
        };
        match headers.get(name) {
            Some(value) => TraceValue::Forwarded(value.clone()),
            None => TraceValue::Generated(Uuid::new_v4().to_string()),
        }
    }

    fn mirror_trace(&self, headers: &mut HeaderMap, trace: &TraceValue) {
        let Some(name) = &self.trace_header else { return };
        match trace {
            TraceValue::Disabled => {}
            TraceValue::Forwarded(value) => {
                headers.insert(name.clone(), value.clone());
            }
            TraceValue::Generated(id) => {
                if let Ok(value) = HeaderValue::from_str(id) {
                    headers.insert(name.clone(), value);
                }
            }
        }
    }

    /// Last-resort 500 for a worker that died before producing a response.
    /// Trace resolution died with it, so only the content type survives.
    pub(crate) fn internal_error_response(&self) -> Response<Body> {
        self.empty_response(StatusCode::INTERNAL_SERVER_ERROR, &TraceValue::Disabled)
    }

    /// Failure and reject responses: empty body, but still the configured
    /// content type and the trace header so callers can correlate.
    fn empty_response(&self, status: StatusCode, trace: &TraceValue) -> Response<Body> {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, self.content_type.clone());
        self.mirror_trace(response.headers_mut(), trace);
        response
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers.get(CONTENT_LENGTH)?.to_str().ok()?.parse().ok()
}

fn is_length_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = source {
        if err.downcast_ref::<http_body_util::LengthLimitError>().is_some() {
            return true;
        }
        source = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    enum Script {
        Reply(Vec<u8>),
        Timeout,
        NoResponders,
    }

    struct ScriptedBus {
        script: Script,
        requests: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl ScriptedBus {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl BusClient for ScriptedBus {
        async fn request(
            &self,
            subject: &str,
            payload: Bytes,
            timeout: Duration,
        ) -> Result<Bytes, BusError> {
            self.requests
                .lock()
                .unwrap()
                .push((subject.to_string(), payload.to_vec()));
            match &self.script {
                Script::Reply(body) => Ok(Bytes::from(body.clone())),
                Script::Timeout => Err(BusError::Timeout(timeout)),
                Script::NoResponders => Err(BusError::NoResponders(subject.to_string())),
            }
        }

        async fn publish(&self, _subject: &str, _payload: Bytes) -> Result<(), BusError> {
            Ok(())
        }
    }

    fn bridge_with(config: GatewayConfig, bus: Arc<ScriptedBus>) -> RequestBridge {
        RequestBridge::new(&config, bus)
    }

    async fn read_body(response: Response<Body>) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn sent_envelope(bus: &ScriptedBus) -> BusEnvelope {
        let requests = bus.requests.lock().unwrap();
        serde_json::from_slice(&requests[0].1).unwrap()
    }

    #[tokio::test]
    async fn test_reply_maps_to_method_status_and_body() {
        let bus = ScriptedBus::new(Script::Reply(b"{\"id\":42}".to_vec()));
        let bridge = bridge_with(GatewayConfig::default(), bus.clone());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/widgets/42")
            .body(Body::empty())
            .unwrap();
        let response = bridge.handle(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(read_body(response).await, b"{\"id\":42}");
        assert_eq!(bus.requests.lock().unwrap()[0].0, "get.widgets.42");
    }

    #[tokio::test]
    async fn test_each_method_gets_its_configured_status() {
        for (method, expected) in [
            (Method::HEAD, 200),
            (Method::GET, 200),
            (Method::PUT, 201),
            (Method::POST, 201),
            (Method::PATCH, 201),
            (Method::DELETE, 204),
        ] {
            let bus = ScriptedBus::new(Script::Reply(b"ok".to_vec()));
            let bridge = bridge_with(GatewayConfig::default(), bus);

            let request = Request::builder()
                .method(method.clone())
                .uri("/things/1")
                .body(Body::empty())
                .unwrap();
            let response = bridge.handle(request).await;
            assert_eq!(response.status().as_u16(), expected, "method {method}");
        }
    }

    #[tokio::test]
    async fn test_unknown_method_succeeds_with_200() {
        let bus = ScriptedBus::new(Script::Reply(b"ok".to_vec()));
        let bridge = bridge_with(GatewayConfig::default(), bus);

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/things")
            .body(Body::empty())
            .unwrap();
        let response = bridge.handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_504_with_empty_body() {
        let bus = ScriptedBus::new(Script::Timeout);
        let bridge = bridge_with(GatewayConfig::default(), bus);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/slow")
            .body(Body::from("payload"))
            .unwrap();
        let response = bridge.handle(request).await;

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert!(read_body(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_502() {
        let bus = ScriptedBus::new(Script::NoResponders);
        let bridge = bridge_with(GatewayConfig::default(), bus);

        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/things/1")
            .body(Body::empty())
            .unwrap();
        let response = bridge.handle(request).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(read_body(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_envelope_carries_request_line_headers_and_body() {
        let bus = ScriptedBus::new(Script::Reply(b"ok".to_vec()));
        let bridge = bridge_with(GatewayConfig::default(), bus.clone());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/orders?id=7")
            .header("x-id", "a")
            .header("x-id", "b")
            .body(Body::from(vec![0u8, 1, 255]))
            .unwrap();
        bridge.handle(request).await;

        let envelope = sent_envelope(&bus);
        assert_eq!(envelope.method, "POST");
        assert_eq!(envelope.path, "/orders?id=7");
        assert_eq!(envelope.body, vec![0u8, 1, 255]);
        let x_ids: Vec<&str> = envelope
            .headers
            .iter()
            .filter(|(name, _)| name == "x-id")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(x_ids, vec!["a", "b"]);
        // Subject ignores the query string.
        assert_eq!(bus.requests.lock().unwrap()[0].0, "post.orders");
    }

    #[tokio::test]
    async fn test_generated_trace_reaches_envelope_and_response() {
        let mut config = GatewayConfig::default();
        config.observability.trace_header = "x-trace-id".to_string();
        let bus = ScriptedBus::new(Script::Reply(b"ok".to_vec()));
        let bridge = bridge_with(config, bus.clone());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/widgets")
            .body(Body::empty())
            .unwrap();
        let response = bridge.handle(request).await;

        let mirrored = response
            .headers()
            .get("x-trace-id")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(!mirrored.is_empty());

        let envelope = sent_envelope(&bus);
        let in_envelope: Vec<&str> = envelope
            .headers
            .iter()
            .filter(|(name, _)| name == "x-trace-id")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(in_envelope, vec![mirrored.as_str()]);
    }

    #[tokio::test]
    async fn test_forwarded_trace_passes_through_unchanged() {
        let mut config = GatewayConfig::default();
        config.observability.trace_header = "x-trace-id".to_string();
        let bus = ScriptedBus::new(Script::Timeout);
        let bridge = bridge_with(config, bus.clone());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/widgets")
            .header("x-trace-id", "caller-supplied")
            .body(Body::empty())
            .unwrap();
        let response = bridge.handle(request).await;

        // Mirrored even on failure responses.
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            response.headers().get("x-trace-id").unwrap(),
            "caller-supplied"
        );

        let envelope = sent_envelope(&bus);
        let in_envelope: Vec<&str> = envelope
            .headers
            .iter()
            .filter(|(name, _)| name == "x-trace-id")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(in_envelope, vec!["caller-supplied"]);
    }

    #[tokio::test]
    async fn test_oversized_declared_body_never_reaches_bus() {
        let bus = ScriptedBus::new(Script::Reply(b"ok".to_vec()));
        let bridge = bridge_with(GatewayConfig::default(), bus.clone());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(CONTENT_LENGTH, "99999999")
            .body(Body::empty())
            .unwrap();
        let response = bridge.handle(request).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(bus.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_streamed_body_never_reaches_bus() {
        let mut config = GatewayConfig::default();
        config.listener.max_body_bytes = 16;
        let bus = ScriptedBus::new(Script::Reply(b"ok".to_vec()));
        let bridge = bridge_with(config, bus.clone());

        // No Content-Length header, so only the buffered read can catch it.
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();
        let response = bridge.handle(request).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(bus.requests.lock().unwrap().is_empty());
    }
}
