use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::{middleware, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use common::audit::{audit_requests, AuditSink};
use common::types::Health;
use serde_json::{json, Value};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, Level};

use crate::config::Targets;
use crate::errors::GatewayError;
use crate::observability::{encode_metrics, ADD_DISPATCH_TOTAL};
use crate::proxy::{parse_json_body, ForwardBody, Forwarder};
use crate::routing::{classify_add_payload, RouteTable, Target, ADD_PATH};

/// Request bodies above this are refused.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct GatewayState {
    pub targets: Arc<Targets>,
    pub table: Arc<RouteTable>,
    pub forwarder: Forwarder,
}

impl GatewayState {
    pub fn new(targets: Targets, forwarder: Forwarder) -> Self {
        Self { targets: Arc::new(targets), table: Arc::new(RouteTable::default()), forwarder }
    }
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn debug_info(State(state): State<GatewayState>) -> Json<Value> {
    let t = &state.targets;
    Json(json!({
        "ok": true,
        "service": "gateway",
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "users": t.users,
        "costs": t.costs,
        "logs": t.logs,
        "admin": t.admin,
    }))
}

async fn metrics() -> impl IntoResponse {
    encode_metrics()
}

/// Every non-local path: pick a backend, then forward.
async fn dispatch(State(state): State<GatewayState>, req: Request) -> Result<Response, GatewayError> {
    let (parts, body) = req.into_parts();
    let is_add = parts.method == Method::POST && parts.uri.path() == ADD_PATH;

    let routed = if is_add { None } else { Some(state.table.resolve(parts.uri.path()).ok_or(GatewayError::RouteNotFound)?) };

    let raw = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        debug!(error = %e, "request body rejected");
        GatewayError::BodyTooLarge
    })?;
    let parsed = parse_json_body(&parts.headers, &raw)?;

    let target: Target = match routed {
        Some(t) => t,
        None => {
            let shape = classify_add_payload(parsed.as_ref().unwrap_or(&Value::Null));
            ADD_DISPATCH_TOTAL.with_label_values(&[shape.as_str()]).inc();
            debug!(shape = shape.as_str(), "classified /api/add body");
            shape.target().ok_or(GatewayError::InvalidAddPayload)?
        }
    };

    let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or(parts.uri.path());
    let body = ForwardBody::select(&parts.method, parsed, raw);
    state
        .forwarder
        .forward(target, state.targets.base_url(target), parts.method.clone(), path_and_query, &parts.headers, body)
        .await
}

/// Gateway router: local diagnostics plus the forwarding fallback, wrapped
/// in the audit trail, CORS and request tracing.
pub fn build_router(state: GatewayState, audit: AuditSink) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/__debug", get(debug_info))
        .route("/metrics", get(metrics))
        .fallback(dispatch)
        .with_state(state)
        .layer(middleware::from_fn_with_state(audit, audit_requests))
        .layer(CorsLayer::very_permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
