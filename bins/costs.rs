use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

const SERVICE: &str = costs::startup::SERVICE_NAME;

fn init_logging() {
    dotenv().ok();
    common::utils::logging::init_logging_default();
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

    // thread count from config.toml when present; config errors surface in run()
    let worker_threads = configs::load_default().ok().and_then(|cfg| cfg.server.worker_threads);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = SERVICE, event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(service = SERVICE, event = "start", %service_id, pid, version, "costs service starting");

    match rt.block_on(costs::run(shutdown_signal())) {
        Ok(()) => {
            info!(service = SERVICE, event = "stop", %service_id, pid, "costs service stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = SERVICE, event = "run_failed", error = %e, "costs service exited with error");
            ExitCode::FAILURE
        }
    }
}
