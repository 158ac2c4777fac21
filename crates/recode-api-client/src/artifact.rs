//! Retrieval of finished conversion artifacts.

use std::path::Path;

use anyhow::{Context, Result};

use crate::ApiClient;

impl ApiClient {
    /// Download a finished artifact to a local file. Returns the number of
    /// bytes written.
    pub async fn fetch_artifact(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self
            .client()
            .get(url)
            .send()
            .await
            .context("Failed to request artifact")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Artifact download failed with status {}",
                status
            ));
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read artifact body")?;
        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write artifact to {}", dest.display()))?;

        Ok(bytes.len() as u64)
    }
}
