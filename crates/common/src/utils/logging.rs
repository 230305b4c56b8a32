use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Default directives for the costs service: report and add-cost spans from
/// `service` at debug, request logs from `costs` and `tower_http` at info.
pub const COSTS_FILTER: &str = "info,service=debug,costs=info,tower_http=info,sqlx=warn";

/// Default directives for the gateway: per-request forwarding at debug.
pub const GATEWAY_FILTER: &str = "info,gateway::proxy=debug,gateway::routes=debug";

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Compact human-readable logs on stdout for the costs service.
/// `RUST_LOG` overrides [`COSTS_FILTER`]. Safe to call more than once.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(filter_or(COSTS_FILTER))
        .with_target(true)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event on stdout, for the gateway's log shipper.
/// `RUST_LOG` overrides [`GATEWAY_FILTER`], e.g. `RUST_LOG=info,gateway::proxy=trace`.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(filter_or(GATEWAY_FILTER))
        .with_target(false)
        .json()
        .with_current_span(false)
        .with_writer(io::stdout)
        .try_init();
}
