use std::time::Duration;

use configs::{required, AppConfig, UpstreamsConfig};
use serde::Serialize;

use crate::routing::Target;

pub const DEFAULT_PORT: u16 = 3000;

/// Backend base URLs, resolved once at startup. All four are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Targets {
    pub users: String,
    pub costs: String,
    pub logs: String,
    pub admin: String,
}

impl Targets {
    pub fn from_upstreams(up: &UpstreamsConfig) -> anyhow::Result<Self> {
        Ok(Self {
            users: required(&up.users_url, "USERS_URL")?,
            costs: required(&up.costs_url, "COSTS_URL")?,
            logs: required(&up.logs_url, "LOGS_URL")?,
            admin: required(&up.admin_url, "ADMIN_URL")?,
        })
    }

    pub fn base_url(&self, target: Target) -> &str {
        match target {
            Target::Users => &self.users,
            Target::Costs => &self.costs,
            Target::Logs => &self.logs,
            Target::Admin => &self.admin,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub targets: Targets,
    pub proxy_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_app(cfg: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: cfg.server.bind_addr(),
            targets: Targets::from_upstreams(&cfg.upstreams)?,
            proxy_timeout: cfg.upstreams.proxy_timeout(),
        })
    }

    /// File + environment, port 3000 unless overridden.
    pub fn load() -> anyhow::Result<Self> {
        let cfg = AppConfig::load_and_validate(DEFAULT_PORT)?;
        Self::from_app(&cfg)
    }
}
