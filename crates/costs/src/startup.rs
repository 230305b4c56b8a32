use std::net::SocketAddr;
use std::sync::Arc;

use common::audit::AuditSink;
use configs::AppConfig;
use service::costs::repo::seaorm::{SeaOrmCostRepository, SeaOrmReportCache, SeaOrmUserDirectory};
use service::costs::repository::UserDirectory;
use service::costs::service::ReportService;
use service::costs::users_client::HttpUserDirectory;
use tracing::info;

use crate::routes::{self, AppState};

pub const SERVICE_NAME: &str = "costs-service";
const DEFAULT_PORT: u16 = 3002;

/// Public entry: load config, connect and migrate the database, then serve
/// until `shutdown` resolves.
pub async fn run(shutdown: impl std::future::Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    let cfg = AppConfig::load_and_validate(DEFAULT_PORT)?;
    cfg.database.validate()?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    models::db::migrate(&db).await?;

    let http = reqwest::Client::new();
    let users: Arc<dyn UserDirectory> = match cfg.upstreams.users_url.as_deref() {
        Some(url) => {
            info!(service = SERVICE_NAME, users_url = url, event = "user_directory", "checking users over http");
            Arc::new(HttpUserDirectory::new(http.clone(), url, cfg.upstreams.users_timeout()))
        }
        None => {
            info!(service = SERVICE_NAME, event = "user_directory", "checking users in local table");
            Arc::new(SeaOrmUserDirectory { db: db.clone() })
        }
    };

    let reports = ReportService::new(
        Arc::new(SeaOrmCostRepository { db: db.clone() }),
        Arc::new(SeaOrmReportCache { db }),
        users,
    );
    let audit = AuditSink::spawn(SERVICE_NAME, cfg.upstreams.logs_url.as_deref(), http);
    let app = routes::build_router(AppState { reports }, audit);

    let addr: SocketAddr = cfg.server.bind_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(service = SERVICE_NAME, %addr, event = "listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
