//! Client for the Recode conversion service.
//!
//! Submits media files for conversion over HTTP multipart, follows conversion
//! progress over the service's WebSocket channel, and retrieves finished
//! artifacts. The CLI uses this client directly.

pub mod artifact;
pub mod progress;
pub mod upload;

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use recode_core::{ClientConfig, JobId};

/// HTTP + WebSocket client for the conversion service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Create a client from the environment: RECODE_API_URL and RECODE_WS_URL,
    /// falling back to localhost defaults.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    pub fn ws_base_url(&self) -> &str {
        &self.config.ws_base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Full download URL for a server-relative artifact path.
    pub fn download_url(&self, path: &str) -> String {
        self.build_url(path)
    }

    /// Live-channel URL for a job, keyed by the job identifier.
    pub fn ws_job_url(&self, job_id: &JobId) -> String {
        format!(
            "{}?jobId={}",
            self.config.ws_base_url,
            urlencoding::encode(job_id.as_str())
        )
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

pub use progress::{ProgressMonitor, ProgressSubscription};
