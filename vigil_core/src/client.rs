// Portal API client - keeps complexity low, just HTTP GETs returning JSON

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::{VigilError, VigilResult};

/// Endpoint paths for the three operational dashboards
pub const METRICS_PATH: &str = "/api/metrics";
pub const LOGS_PATH: &str = "/api/logs";
pub const RECOVERY_PATH: &str = "/api/recovery";

/// HTTP client for the admin portal API.
///
/// Cheap to clone; every dashboard holds its own handle to the same
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: &str, timeout: Duration) -> VigilResult<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(VigilError::Config(format!(
                "API URL must start with http:// or https://: {}",
                base_url
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a portal endpoint and decode the body as JSON.
    pub async fn get_json(&self, path: &str) -> VigilResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "portal GET");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(VigilError::NotFound(url));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VigilError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| VigilError::Parse(e.to_string()))
    }

    /// System metrics payload (CPU, memory, disk usage)
    pub async fn metrics(&self) -> VigilResult<Value> {
        self.get_json(METRICS_PATH).await
    }

    /// Recent system log entries, newest last
    pub async fn logs(&self, limit: usize) -> VigilResult<Value> {
        self.get_json(&format!("{}?limit={}", LOGS_PATH, limit)).await
    }

    /// Crash-recovery diagnostics payload
    pub async fn recovery(&self) -> VigilResult<Value> {
        self.get_json(RECOVERY_PATH).await
    }
}
