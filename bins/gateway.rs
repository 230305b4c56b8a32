use std::process::ExitCode;

use common::utils::logging::init_logging_json;
use configs::AppConfig;
use dotenvy::dotenv;
use gateway::bootstrap;
use gateway::config::{GatewayConfig, DEFAULT_PORT};
use tracing::{error, info};
use uuid::Uuid;

const SERVICE: &str = "gateway";

fn init_logging() {
    dotenv().ok();
    init_logging_json();
    info!(service = SERVICE, event = "logger_init", "tracing subscriber initialized");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(service = SERVICE, event = "shutdown_signal", "received Ctrl+C, draining connections");
    }
}

fn main() -> ExitCode {
    init_logging();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = SERVICE, event = "panic", %service_id, pid, message = %info, "unhandled panic occurred");
    }));

    // missing backend URLs are fatal before anything binds
    let (app_cfg, cfg) = match AppConfig::load_and_validate(DEFAULT_PORT)
        .and_then(|app| GatewayConfig::from_app(&app).map(|gw| (app, gw)))
    {
        Ok(pair) => pair,
        Err(e) => {
            error!(service = SERVICE, event = "config_invalid", error = %e, "cannot start gateway");
            return ExitCode::FAILURE;
        }
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = app_cfg.server.worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = SERVICE, event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(service = SERVICE, event = "start", %service_id, pid, version, bind = %cfg.bind_addr, "gateway starting");

    match rt.block_on(bootstrap::run(cfg, shutdown_signal())) {
        Ok(()) => {
            info!(service = SERVICE, event = "stop", %service_id, pid, "gateway stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = SERVICE, event = "run_failed", error = %e, "gateway exited with error");
            ExitCode::FAILURE
        }
    }
}
