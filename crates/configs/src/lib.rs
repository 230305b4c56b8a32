use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use common::env;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub upstreams: UpstreamsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 0, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Base URLs of the collaborating services plus outbound call budgets.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamsConfig {
    #[serde(default)]
    pub users_url: Option<String>,
    #[serde(default)]
    pub costs_url: Option<String>,
    #[serde(default)]
    pub logs_url: Option<String>,
    #[serde(default)]
    pub admin_url: Option<String>,
    #[serde(default = "default_proxy_timeout")]
    pub proxy_timeout_secs: u64,
    #[serde(default = "default_users_timeout")]
    pub users_timeout_secs: u64,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            users_url: None,
            costs_url: None,
            logs_url: None,
            admin_url: None,
            proxy_timeout_secs: default_proxy_timeout(),
            users_timeout_secs: default_users_timeout(),
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_proxy_timeout() -> u64 { 10 }
fn default_users_timeout() -> u64 { 5 }

/// Path of the optional TOML file (`CONFIG_PATH`, default `config.toml`).
pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

/// Read the TOML file when present, otherwise start from defaults.
/// A file that exists but does not parse is an error.
pub fn load_default() -> Result<AppConfig> {
    let path = config_path();
    if std::path::Path::new(&path).exists() {
        load_from_file(&path)
    } else {
        Ok(AppConfig::default())
    }
}

impl AppConfig {
    /// Load file + environment and normalize. `default_port` applies when
    /// neither the file nor `PORT` sets one.
    pub fn load_and_validate(default_port: u16) -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize(default_port)?;
        Ok(cfg)
    }

    pub fn normalize(&mut self, default_port: u16) -> Result<()> {
        self.server.normalize(default_port)?;
        self.database.normalize_from_env();
        self.upstreams.normalize_from_env();
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self, default_port: u16) -> Result<()> {
        if let Some(host) = env::var("HOST") {
            self.host = host;
        }
        if self.host.trim().is_empty() {
            self.host = "0.0.0.0".to_string();
        }
        if let Some(port) = env::var("PORT") {
            self.port = port
                .parse()
                .map_err(|_| anyhow!("PORT must be an integer in 1..=65535, got {port}"))?;
        }
        if self.port == 0 {
            self.port = default_port;
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.worker_threads == Some(0) || self.worker_threads.is_none() {
            self.worker_threads = Some(4);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if let Some(url) = env::var("DATABASE_URL") {
            self.url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl UpstreamsConfig {
    /// Environment wins over the file; every URL is cleaned of quotes and
    /// trailing slashes.
    pub fn normalize_from_env(&mut self) {
        let pick = |name: &str, current: &Option<String>| {
            env::var(name)
                .or_else(|| current.clone())
                .map(|v| env::clean_base_url(&v))
                .filter(|v| !v.is_empty())
        };
        self.users_url = pick("USERS_URL", &self.users_url);
        self.costs_url = pick("COSTS_URL", &self.costs_url);
        self.logs_url = pick("LOGS_URL", &self.logs_url);
        self.admin_url = pick("ADMIN_URL", &self.admin_url);
        if let Some(secs) = env::var("PROXY_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.proxy_timeout_secs = secs;
        }
        if let Some(secs) = env::var("USERS_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.users_timeout_secs = secs;
        }
    }

    pub fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy_timeout_secs.max(1))
    }

    pub fn users_timeout(&self) -> Duration {
        Duration::from_secs(self.users_timeout_secs.max(1))
    }
}

/// Unwrap a required URL, naming the variable that should have provided it.
pub fn required(value: &Option<String>, env_name: &str) -> Result<String> {
    value.clone().ok_or_else(|| anyhow!("Missing env var {env_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml_sections() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [upstreams]
            users_url = "http://users:3001/"
            proxy_timeout_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.upstreams.users_url.as_deref(), Some("http://users:3001/"));
        assert_eq!(cfg.upstreams.proxy_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.upstreams.users_timeout_secs, 5);
    }

    #[test]
    fn required_names_missing_variable() {
        let err = required(&None, "ADMIN_URL").unwrap_err();
        assert_eq!(err.to_string(), "Missing env var ADMIN_URL");
        assert_eq!(required(&Some("http://a".into()), "ADMIN_URL").unwrap(), "http://a");
    }

    #[test]
    fn database_validation_rejects_non_postgres() {
        let db = DatabaseConfig { url: "mysql://x".into(), max_connections: 5, min_connections: 1, connect_timeout_secs: 1, acquire_timeout_secs: 1, sqlx_logging: false };
        assert!(db.validate().is_err());
        let db = DatabaseConfig { url: "postgres://u@h/db".into(), ..db };
        assert!(db.validate().is_ok());
    }
}
