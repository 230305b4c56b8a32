//! Best-effort request audit trail.
//!
//! Every finished request produces an [`AuditRecord`] that is pushed onto a
//! bounded queue without blocking. A background worker drains the queue and
//! POSTs each record to `{LOGS_URL}/api/logs`. Delivery failures are dropped:
//! the audit trail must never change what the client sees.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Default queue depth; records beyond this are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
/// Upper bound for a single delivery to the logs service.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub timestamp: String,
    pub service: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub duration_ms: u64,
    pub ip: String,
    pub user_agent: String,
    pub message: String,
}

impl AuditRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        service: &str,
        method: &str,
        path: &str,
        status: u16,
        elapsed: Duration,
        ip: String,
        user_agent: String,
        message: &str,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            service: service.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            status,
            duration_ms: elapsed.as_millis() as u64,
            ip,
            user_agent,
            message: message.to_string(),
        }
    }
}

/// Cheap-to-clone handle used by request handlers to enqueue audit records.
#[derive(Clone)]
pub struct AuditSink {
    service: &'static str,
    sender: Option<mpsc::Sender<AuditRecord>>,
}

impl AuditSink {
    /// A sink that silently discards everything (no logs service configured).
    pub fn disabled(service: &'static str) -> Self {
        Self { service, sender: None }
    }

    /// Sink plus the receiving end of its queue. Used by [`AuditSink::spawn`]
    /// and by tests that want to inspect emitted records.
    pub fn channel(service: &'static str, capacity: usize) -> (Self, mpsc::Receiver<AuditRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { service, sender: Some(tx) }, rx)
    }

    /// Start the delivery worker on the current runtime.
    ///
    /// With no `logs_url` the returned sink is disabled.
    pub fn spawn(service: &'static str, logs_url: Option<&str>, client: reqwest::Client) -> Self {
        let Some(base) = logs_url else {
            debug!(service, event = "audit_disabled", "no logs url configured; audit records are discarded");
            return Self::disabled(service);
        };
        let endpoint = format!("{}/api/logs", base.trim_end_matches('/'));
        let (sink, rx) = Self::channel(service, DEFAULT_QUEUE_CAPACITY);
        tokio::spawn(deliver_all(rx, client, endpoint));
        sink
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Enqueue without waiting. Returns `false` when the record was dropped.
    pub fn record(&self, record: AuditRecord) -> bool {
        match &self.sender {
            Some(tx) => tx.try_send(record).is_ok(),
            None => false,
        }
    }
}

async fn deliver_all(mut rx: mpsc::Receiver<AuditRecord>, client: reqwest::Client, endpoint: String) {
    while let Some(record) = rx.recv().await {
        let sent = client
            .post(&endpoint)
            .timeout(DELIVERY_TIMEOUT)
            .json(&record)
            .send()
            .await;
        match sent {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => debug!(status = %resp.status(), path = %record.path, "logs service rejected audit record"),
            Err(e) => debug!(error = %e, path = %record.path, "audit record delivery failed"),
        }
    }
}

/// Peer address as seen by the listener, empty when unknown (e.g. in-process tests).
pub fn client_ip(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

/// Middleware: time the request, then enqueue an audit record once the
/// response is ready.
pub async fn audit_requests(State(sink): State<AuditSink>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let ip = client_ip(&req);
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(req).await;

    let record = AuditRecord::new(
        sink.service(),
        &method,
        &path,
        response.status().as_u16(),
        started.elapsed(),
        ip,
        user_agent,
        "endpoint accessed",
    );
    if !sink.record(record) {
        debug!(service = sink.service(), %path, "audit record dropped");
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(sink: AuditSink) -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route("/boom", get(|| async { StatusCode::BAD_REQUEST }))
            .layer(middleware::from_fn_with_state(sink, audit_requests))
    }

    #[tokio::test]
    async fn records_method_path_status_and_agent() -> anyhow::Result<()> {
        let (sink, mut rx) = AuditSink::channel("test", 8);
        let req = axum::http::Request::builder()
            .uri("/ping?x=1")
            .header("user-agent", "curl/8")
            .body(Body::empty())?;
        let res = app(sink).oneshot(req).await?;
        assert_eq!(res.status(), StatusCode::OK);

        let rec = rx.recv().await.expect("record");
        assert_eq!(rec.service, "test");
        assert_eq!(rec.method, "GET");
        assert_eq!(rec.path, "/ping?x=1");
        assert_eq!(rec.status, 200);
        assert_eq!(rec.user_agent, "curl/8");
        assert_eq!(rec.message, "endpoint accessed");
        Ok(())
    }

    #[tokio::test]
    async fn error_statuses_are_recorded_too() -> anyhow::Result<()> {
        let (sink, mut rx) = AuditSink::channel("test", 8);
        let req = axum::http::Request::builder().uri("/boom").body(Body::empty())?;
        let res = app(sink).oneshot(req).await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(rx.recv().await.expect("record").status, 400);
        Ok(())
    }

    #[tokio::test]
    async fn full_queue_never_blocks_the_response() -> anyhow::Result<()> {
        let (sink, _rx) = AuditSink::channel("test", 1);
        for _ in 0..3 {
            let req = axum::http::Request::builder().uri("/ping").body(Body::empty())?;
            let res = app(sink.clone()).oneshot(req).await?;
            assert_eq!(res.status(), StatusCode::OK);
        }
        Ok(())
    }

    #[tokio::test]
    async fn disabled_sink_drops_records() {
        let sink = AuditSink::disabled("test");
        let rec = AuditRecord::new("test", "GET", "/", 200, Duration::ZERO, String::new(), String::new(), "m");
        assert!(!sink.record(rec));
    }

    #[tokio::test]
    async fn unreachable_logs_service_is_swallowed() {
        let sink = AuditSink::spawn("test", Some("http://127.0.0.1:9"), reqwest::Client::new());
        let rec = AuditRecord::new("test", "GET", "/", 200, Duration::ZERO, String::new(), String::new(), "m");
        assert!(sink.record(rec));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
