use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::{Json, Router};
use common::audit::AuditSink;
use gateway::config::Targets;
use gateway::proxy::Forwarder;
use gateway::routes::{build_router, GatewayState};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Backend that answers every request with a description of what it got.
async fn echo_backend(name: &'static str) -> anyhow::Result<String> {
    let app = Router::new().fallback(move |req: Request<Body>| async move {
        let method = req.method().to_string();
        let path = req.uri().path_and_query().map(|p| p.to_string()).unwrap_or_default();
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let custom = req
            .headers()
            .get("x-trace")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = to_bytes(req.into_body(), usize::MAX).await.unwrap_or_default();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (
            StatusCode::OK,
            [("x-backend", name)],
            Json(json!({
                "service": name, "method": method, "path": path,
                "content_type": content_type, "x_trace": custom, "body": body
            })),
        )
    });
    serve(app).await
}

async fn serve(app: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

/// An address nothing listens on.
fn dead_url() -> anyhow::Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

async fn live_targets() -> anyhow::Result<Targets> {
    Ok(Targets {
        users: echo_backend("users").await?,
        costs: echo_backend("costs").await?,
        logs: echo_backend("logs").await?,
        admin: echo_backend("admin").await?,
    })
}

fn gateway(targets: Targets, timeout: Duration) -> anyhow::Result<Router> {
    let forwarder = Forwarder::build(timeout)?;
    Ok(build_router(GatewayState::new(targets, forwarder), AuditSink::disabled("gateway")))
}

async fn call(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let res = app.clone().oneshot(req).await?;
    let status = res.status();
    let bytes = to_bytes(res.into_body(), 1 << 20).await?;
    Ok((status, serde_json::from_slice(&bytes).unwrap_or(Value::Null)))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn user_shaped_add_goes_to_users() -> anyhow::Result<()> {
    let app = gateway(live_targets().await?, Duration::from_secs(5))?;
    let body = json!({"id": 1, "first_name": "mosh", "last_name": "israeli", "birthday": "1990-01-10"});
    let (status, echo) = call(&app, post_json("/api/add", &body)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echo["service"], "users");
    assert_eq!(echo["path"], "/api/add");
    assert_eq!(echo["body"], body);
    assert_eq!(echo["content_type"], "application/json");
    Ok(())
}

#[tokio::test]
async fn cost_shaped_add_goes_to_costs() -> anyhow::Result<()> {
    let app = gateway(live_targets().await?, Duration::from_secs(5))?;
    let body = json!({"userid": 123123, "description": "milk", "category": "food", "sum": 8});
    let (status, echo) = call(&app, post_json("/api/add", &body)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echo["service"], "costs");
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["body"], body);
    Ok(())
}

#[tokio::test]
async fn cost_shape_with_null_field_is_still_forwarded() -> anyhow::Result<()> {
    let app = gateway(live_targets().await?, Duration::from_secs(5))?;
    let body = json!({"userid": 1, "description": null, "category": "food", "sum": 8});
    let (status, echo) = call(&app, post_json("/api/add", &body)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echo["service"], "costs");
    assert_eq!(echo["body"], body);
    Ok(())
}

#[tokio::test]
async fn invalid_add_is_rejected_without_contacting_backends() -> anyhow::Result<()> {
    let dead = dead_url()?;
    let targets = Targets { users: dead.clone(), costs: dead.clone(), logs: dead.clone(), admin: dead };
    let app = gateway(targets, Duration::from_secs(5))?;
    let (status, body) = call(&app, post_json("/api/add", &json!({"userid": 1}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"id": 4001, "message": "Invalid payload for /api/add"}));
    Ok(())
}

#[tokio::test]
async fn prefix_routes_keep_path_and_query() -> anyhow::Result<()> {
    let app = gateway(live_targets().await?, Duration::from_secs(5))?;

    let (_, echo) = call(&app, get("/api/report?id=123123&year=2026&month=3")).await?;
    assert_eq!(echo["service"], "costs");
    assert_eq!(echo["path"], "/api/report?id=123123&year=2026&month=3");

    let (_, echo) = call(&app, get("/api/users/123123")).await?;
    assert_eq!(echo["service"], "users");
    assert_eq!(echo["path"], "/api/users/123123");

    let (_, echo) = call(&app, get("/api/logs")).await?;
    assert_eq!(echo["service"], "logs");

    let (_, echo) = call(&app, get("/api/about")).await?;
    assert_eq!(echo["service"], "admin");
    Ok(())
}

#[tokio::test]
async fn upstream_headers_travel_both_ways() -> anyhow::Result<()> {
    let app = gateway(live_targets().await?, Duration::from_secs(5))?;
    let req = Request::builder().uri("/api/about").header("x-trace", "abc").body(Body::empty())?;
    let res = app.clone().oneshot(req).await?;
    assert_eq!(res.headers().get("x-backend").and_then(|v| v.to_str().ok()), Some("admin"));
    let bytes = to_bytes(res.into_body(), 1 << 20).await?;
    let echo: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(echo["x_trace"], "abc");
    Ok(())
}

#[tokio::test]
async fn unknown_paths_are_not_found() -> anyhow::Result<()> {
    let app = gateway(live_targets().await?, Duration::from_secs(5))?;
    let (status, body) = call(&app, get("/api/usersX")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["id"], 4040);
    let (status, _) = call(&app, get("/api/add")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> anyhow::Result<()> {
    let app = gateway(live_targets().await?, Duration::from_secs(5))?;
    let req = Request::builder()
        .method("POST")
        .uri("/api/add")
        .header("content-type", "application/json")
        .body(Body::from("{\"userid\":"))?;
    let (status, body) = call(&app, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"id": 4000, "message": "invalid JSON body"}));
    Ok(())
}

#[tokio::test]
async fn slow_backend_times_out() -> anyhow::Result<()> {
    let slow = serve(Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        "late"
    }))
    .await?;
    let mut targets = live_targets().await?;
    targets.admin = slow;
    let app = gateway(targets, Duration::from_millis(200))?;
    let (status, body) = call(&app, get("/api/about")).await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"id": 5003, "message": "upstream timed out"}));
    Ok(())
}

#[tokio::test]
async fn dead_backend_is_unreachable() -> anyhow::Result<()> {
    let mut targets = live_targets().await?;
    targets.logs = dead_url()?;
    let app = gateway(targets, Duration::from_secs(2))?;
    let (status, body) = call(&app, get("/api/logs")).await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["id"], 5002);
    Ok(())
}

#[tokio::test]
async fn diagnostics_are_served_locally() -> anyhow::Result<()> {
    let targets = live_targets().await?;
    let costs_url = targets.costs.clone();
    let app = gateway(targets, Duration::from_secs(5))?;

    let (status, body) = call(&app, get("/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (_, body) = call(&app, get("/__debug")).await?;
    assert_eq!(body["ok"], true);
    assert_eq!(body["service"], "gateway");
    assert_eq!(body["costs"], costs_url);

    call(&app, get("/api/about")).await?;
    let res = app.clone().oneshot(get("/metrics")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let text = String::from_utf8(to_bytes(res.into_body(), 1 << 20).await?.to_vec())?;
    assert!(text.contains("gateway_forwarded_requests_total"));
    Ok(())
}

#[tokio::test]
async fn every_request_is_audited() -> anyhow::Result<()> {
    let (sink, mut rx) = AuditSink::channel("gateway", 16);
    let app = build_router(GatewayState::new(live_targets().await?, Forwarder::build(Duration::from_secs(5))?), sink);
    let (status, _) = call(&app, post_json("/api/add", &json!({"nope": true}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let rec = rx.recv().await.expect("audit record");
    assert_eq!(rec.service, "gateway");
    assert_eq!(rec.method, "POST");
    assert_eq!(rec.path, "/api/add");
    assert_eq!(rec.status, 400);
    Ok(())
}
