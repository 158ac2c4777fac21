//! Submission of conversion jobs.
//!
//! A job is submitted as `POST {base}/upload/{format}` with a multipart body
//! whose `video` field streams the file. While the body is in flight, bytes
//! transferred over bytes total are reported as a coarse client-local upload
//! percentage. This signal is separate from the server's conversion progress
//! and ends once the service answers with a job identifier.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::TryStreamExt;
use tokio_util::io::ReaderStream;

use recode_core::{
    validate_upload, ConversionState, ConvertError, JobId, OutputFormat, ProgressSink,
    SubmitResponse,
};

use crate::ApiClient;

impl ApiClient {
    /// Submit a file for conversion and return the job identifier issued by
    /// the service.
    ///
    /// Preconditions are checked before any request is constructed: a format
    /// must be chosen and the path must name an existing file, otherwise a
    /// typed `ConvertError` comes back with zero network calls made. On a
    /// non-2xx response or transport failure the submission fails without
    /// producing a job identifier, so the caller's prior job state stays
    /// untouched.
    pub async fn submit(
        &self,
        path: &Path,
        format: Option<OutputFormat>,
        sink: Option<Arc<dyn ProgressSink>>,
    ) -> Result<JobId> {
        let validated = validate_upload(path, format)?;

        let file = tokio::fs::File::open(&validated.path)
            .await
            .with_context(|| format!("Failed to open file: {}", validated.path.display()))?;
        let total_bytes = file
            .metadata()
            .await
            .with_context(|| format!("Failed to stat file: {}", validated.path.display()))?
            .len();

        let sent = Arc::new(AtomicU64::new(0));
        let stream = ReaderStream::new(file).inspect_ok({
            let sent = Arc::clone(&sent);
            let sink = sink.clone();
            move |chunk| {
                let transferred =
                    sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
                if let Some(sink) = &sink {
                    sink.on_state(&ConversionState::Uploading {
                        percent: upload_percent(transferred, total_bytes),
                    });
                }
            }
        });

        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(stream),
            total_bytes,
        )
        .file_name(validated.file_name.clone());
        let form = reqwest::multipart::Form::new().part("video", part);

        let url = self.build_url(&format!("/upload/{}", validated.format));
        tracing::debug!(url = %url, file = %validated.file_name, "submitting conversion job");

        let response = self
            .client()
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConvertError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ConvertError::UploadFailed {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body: SubmitResponse = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        tracing::debug!(job_id = %body.job_id, "conversion job accepted");
        Ok(body.job_id)
    }
}

fn upload_percent(transferred: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (transferred as f64 / total as f64 * 100.0).min(100.0)
}
