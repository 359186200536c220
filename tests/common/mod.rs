//! Shared utilities for gateway integration tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use nats_gateway::bus::{BusClient, BusError};
use nats_gateway::config::GatewayConfig;
use nats_gateway::http::HttpServer;

/// What the mock bus does with each request.
#[allow(dead_code)]
pub enum Script {
    /// Reply immediately with this payload.
    Reply(Vec<u8>),
    /// Reply with this payload after a delay. The caller's deadline is
    /// honored like a real client: a reply that would land after it turns
    /// into a timeout and is counted as late.
    DelayedReply(Duration, Vec<u8>),
    /// Never reply; the caller's deadline fires.
    Silent,
    /// Report that nothing is subscribed on the subject.
    NoResponders,
    /// Panic inside the request call.
    Panic,
}

/// Programmable in-process bus double.
pub struct MockBus {
    script: Script,
    pub requests: Mutex<Vec<(String, Vec<u8>)>>,
    pub published: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail_publish: AtomicBool,
    pub late_replies: AtomicU32,
}

impl MockBus {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
            fail_publish: AtomicBool::new(false),
            late_replies: AtomicU32::new(0),
        })
    }

    #[allow(dead_code)]
    pub fn request_subjects(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(subject, _)| subject.clone())
            .collect()
    }
}

#[async_trait]
impl BusClient for MockBus {
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
            Script::DelayedReply(delay, body) => {
                if *delay <= timeout {
                    tokio::time::sleep(*delay).await;
                    Ok(Bytes::from(body.clone()))
                } else {
                    tokio::time::sleep(timeout).await;
                    self.late_replies.fetch_add(1, Ordering::SeqCst);
                    Err(BusError::Timeout(timeout))
                }
            }
            Script::Silent => {
                tokio::time::sleep(timeout).await;
                Err(BusError::Timeout(timeout))
            }
            Script::NoResponders => Err(BusError::NoResponders(subject.to_string())),
            Script::Panic => panic!("scripted bus failure"),
        }
    }

    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(BusError::Publish("scripted publish failure".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((subject.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Start a gateway on an ephemeral port; returns its base URL.
///
/// The listener is bound before the server task is spawned, so clients can
/// connect immediately (connections queue until the accept loop runs).
pub async fn start_gateway(config: GatewayConfig, bus: Arc<MockBus>) -> String {
    let (url, _notify, _handle) = start_gateway_with_shutdown(config, bus).await;
    url
}

/// Start a gateway whose shutdown the test can trigger.
pub async fn start_gateway_with_shutdown(
    config: GatewayConfig,
    bus: Arc<MockBus>,
) -> (
    String,
    Arc<Notify>,
    tokio::task::JoinHandle<std::io::Result<()>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let notify = Arc::new(Notify::new());
    let trigger = notify.clone();

    let server = HttpServer::new(&config, bus);
    let handle = tokio::spawn(async move {
        server
            .run_until(listener, async move { trigger.notified().await })
            .await
    });

    (format!("http://{}", addr), notify, handle)
}

/// Poll until `check` passes or the deadline lapses.
#[allow(dead_code)]
pub async fn wait_for<F: Fn() -> bool>(check: F, deadline: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
