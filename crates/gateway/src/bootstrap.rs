use std::future::Future;
use std::net::SocketAddr;

use common::audit::AuditSink;
use tracing::info;

use crate::config::GatewayConfig;
use crate::proxy::Forwarder;
use crate::routes::{build_router, GatewayState};

pub const SERVICE_NAME: &str = "gateway";

/// Resolve targets, then serve until `shutdown` resolves. Missing backend
/// URLs abort startup.
pub async fn run(cfg: GatewayConfig, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    info!(
        service = SERVICE_NAME,
        event = "targets_resolved",
        users = %cfg.targets.users,
        costs = %cfg.targets.costs,
        logs = %cfg.targets.logs,
        admin = %cfg.targets.admin,
        timeout_secs = cfg.proxy_timeout.as_secs(),
    );

    let forwarder = Forwarder::build(cfg.proxy_timeout)?;
    let audit = AuditSink::spawn(SERVICE_NAME, Some(&cfg.targets.logs), reqwest::Client::new());
    let app = build_router(GatewayState::new(cfg.targets, forwarder), audit);

    let addr: SocketAddr = cfg.bind_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(service = SERVICE_NAME, %addr, event = "listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
