use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::warn;

use super::repository::UserDirectory;
use crate::errors::{codes, ServiceError};

/// User existence via the users service: `GET {base}/api/users/{id}`.
#[derive(Clone)]
pub struct HttpUserDirectory {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpUserDirectory {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), timeout }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn exists(&self, userid: i64) -> Result<bool, ServiceError> {
        let url = format!("{}/api/users/{}", self.base_url, userid);
        let resp = self.client.get(&url).timeout(self.timeout).send().await.map_err(|e| {
            warn!(error = %e, %url, event = "users_unreachable");
            ServiceError::upstream(codes::USERS_UNREACHABLE, "users-service unreachable")
        })?;
        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => {
                warn!(status = %other, %url, event = "users_check_failed");
                Err(ServiceError::upstream(codes::USERS_CHECK_FAILED, "users-service check failed"))
            }
        }
    }
}
