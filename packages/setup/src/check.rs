//! Readiness polling against a running server.

use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Server at {url} not ready after {timeout_secs}s")]
    NotReady { url: String, timeout_secs: u64 },

    #[error("Unexpected readiness response: {0}")]
    Response(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessReport {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessChecks {
    pub store: String,
    pub backend: String,
    pub crawler: bool,
}

/// Polls `{server}/health/ready` every 500ms until it answers 200
pub async fn wait_until_ready(
    client: &reqwest::Client,
    server: &str,
    timeout_secs: u64,
) -> Result<ReadinessReport, CheckError> {
    let url = format!("{}/health/ready", server.trim_end_matches('/'));
    let start = Instant::now();

    while start.elapsed() < Duration::from_secs(timeout_secs) {
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                return Ok(resp.json::<ReadinessReport>().await?);
            }
            _ => tokio::time::sleep(Duration::from_millis(500)).await,
        }
    }

    Err(CheckError::NotReady {
        url,
        timeout_secs,
    })
}
