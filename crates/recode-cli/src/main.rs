//! Recode CLI — submit media files to the conversion service and follow
//! conversion progress until the artifact is ready.
//!
//! Set RECODE_API_URL and RECODE_WS_URL (defaults: http://localhost:5000 and
//! ws://localhost:8080).

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use recode_api_client::{ApiClient, ProgressMonitor};
use recode_cli::{default_output_path, init_tracing};
use recode_core::{ConversionState, JobId, OutputFormat, ProgressSink};

#[derive(Parser)]
#[command(name = "recode", about = "Client for the Recode conversion service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and convert it to the chosen output format
    Convert {
        /// Path to the media file to convert
        file: PathBuf,
        /// Target output format (mp4, avi, mkv, webm, gif, mp3, wav, aac, flac, ogg)
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Where to write the converted artifact (default: input stem + format extension)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Submit only; do not follow progress or download the artifact
        #[arg(long)]
        no_wait: bool,
    },
    /// Follow progress of an already-submitted job
    Watch {
        /// Job identifier returned at submission
        job_id: String,
    },
    /// List supported output formats
    Formats,
}

/// Logs upload progress at whole-percent granularity.
#[derive(Default)]
struct ConsoleProgress {
    last_percent: AtomicU64,
}

impl ProgressSink for ConsoleProgress {
    fn on_state(&self, state: &ConversionState) {
        if let ConversionState::Uploading { percent } = state {
            let rounded = *percent as u64;
            if self.last_percent.swap(rounded, Ordering::Relaxed) != rounded {
                info!("uploading {}%", rounded);
            }
        }
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn follow_job(client: &ApiClient, job_id: &JobId) -> anyhow::Result<ConversionState> {
    let mut monitor = ProgressMonitor::new(client.clone());
    let subscription = monitor.follow(job_id);
    loop {
        let state = subscription.changed().await?;
        info!("{}", state);
        if state.is_terminal() {
            return Ok(state);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let client = ApiClient::from_env().context("Failed to create API client")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            file,
            format,
            output,
            no_wait,
        } => {
            let job_id = client
                .submit(&file, format, Some(Arc::new(ConsoleProgress::default())))
                .await?;
            info!("job {} submitted", job_id);

            if no_wait {
                print_json(&serde_json::json!({ "jobId": job_id }))?;
                return Ok(());
            }

            match follow_job(&client, &job_id).await? {
                ConversionState::Done { download_url } => {
                    // format was validated during submission, so it is present here.
                    let chosen = format.ok_or_else(|| anyhow::anyhow!("format missing"))?;
                    let dest = output.unwrap_or_else(|| default_output_path(&file, chosen));
                    let bytes = client.fetch_artifact(&download_url, &dest).await?;
                    print_json(&serde_json::json!({
                        "jobId": job_id,
                        "downloadUrl": download_url,
                        "output": dest,
                        "bytes": bytes,
                    }))?;
                }
                ConversionState::Failed { reason } => {
                    anyhow::bail!("conversion failed: {}", reason);
                }
                other => anyhow::bail!("unexpected terminal state: {}", other),
            }
        }
        Commands::Watch { job_id } => {
            let job_id = JobId::new(job_id);
            match follow_job(&client, &job_id).await? {
                ConversionState::Done { download_url } => {
                    print_json(&serde_json::json!({
                        "jobId": job_id,
                        "downloadUrl": download_url,
                    }))?;
                }
                ConversionState::Failed { reason } => {
                    anyhow::bail!("conversion failed: {}", reason);
                }
                other => anyhow::bail!("unexpected terminal state: {}", other),
            }
        }
        Commands::Formats => {
            let formats: Vec<_> = OutputFormat::ALL
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "format": f.to_string(),
                        "kind": f.kind().to_string(),
                    })
                })
                .collect();
            print_json(&formats)?;
        }
    }

    Ok(())
}
