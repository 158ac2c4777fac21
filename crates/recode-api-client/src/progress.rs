//! Live conversion progress over the service's WebSocket channel.
//!
//! One subscription exists per job identifier, scoped to a
//! [`ProgressSubscription`] value: dropping it aborts the reader task and
//! releases the connection on every exit path. Inbound messages are applied
//! in arrival order; the folded [`ConversionState`] is published on a watch
//! channel.

use futures::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use recode_core::{ConversionState, ConvertError, JobId, ProgressUpdate};

use crate::ApiClient;

impl ApiClient {
    /// Open a live subscription for a job. Exactly one WebSocket connection
    /// is made, keyed by the job identifier.
    pub fn watch_job(&self, job_id: &JobId) -> ProgressSubscription {
        let url = self.ws_job_url(job_id);
        let api_base_url = self.base_url().to_string();
        let (tx, rx) = watch::channel(ConversionState::Idle);
        let handle = tokio::spawn(run_subscription(url, api_base_url, tx));

        ProgressSubscription {
            job_id: job_id.clone(),
            state: rx,
            handle,
        }
    }
}

/// A live subscription to one job's conversion progress. The reader task is
/// torn down when this value is dropped.
#[derive(Debug)]
pub struct ProgressSubscription {
    job_id: JobId,
    state: watch::Receiver<ConversionState>,
    handle: JoinHandle<()>,
}

impl ProgressSubscription {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Latest observed state.
    pub fn state(&self) -> ConversionState {
        self.state.borrow().clone()
    }

    /// Wait for the next state transition and return it. Errors if the
    /// channel closed before another transition arrived.
    pub async fn changed(&mut self) -> Result<ConversionState, ConvertError> {
        self.state
            .changed()
            .await
            .map_err(|_| ConvertError::Channel("progress channel closed".to_string()))?;
        Ok(self.state.borrow().clone())
    }

    /// Wait until the job reaches `Done` or `Failed`. Errors if the channel
    /// closes first (e.g. the server dropped the connection mid-job).
    pub async fn wait_until_terminal(&mut self) -> Result<ConversionState, ConvertError> {
        loop {
            let current = self.state.borrow_and_update().clone();
            if current.is_terminal() {
                return Ok(current);
            }
            if self.state.changed().await.is_err() {
                return Err(ConvertError::Channel(
                    "progress channel closed before a terminal state".to_string(),
                ));
            }
        }
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Holds at most one live subscription. A subscription exists if and only if
/// a job identifier is being followed; following a new job tears down the
/// prior subscription before the next one opens.
#[derive(Debug)]
pub struct ProgressMonitor {
    client: ApiClient,
    current: Option<ProgressSubscription>,
}

impl ProgressMonitor {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            current: None,
        }
    }

    /// Follow a job, replacing any prior subscription. The old subscription
    /// is closed before the new connection opens.
    pub fn follow(&mut self, job_id: &JobId) -> &mut ProgressSubscription {
        self.current = None;
        self.current.insert(self.client.watch_job(job_id))
    }

    /// Stop following the current job, if any.
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn subscription(&mut self) -> Option<&mut ProgressSubscription> {
        self.current.as_mut()
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.current.as_ref().map(ProgressSubscription::job_id)
    }
}

async fn run_subscription(
    url: String,
    api_base_url: String,
    tx: watch::Sender<ConversionState>,
) {
    // An `http::Uri` round-trip restores the "/" path that the handshake
    // request line requires when the URL is query-only.
    let request_url = url
        .parse::<tokio_tungstenite::tungstenite::http::Uri>()
        .map(|uri| uri.to_string())
        .unwrap_or_else(|_| url.clone());
    let (socket, _) = match connect_async(request_url.as_str()).await {
        Ok(pair) => pair,
        Err(e) => {
            let _ = tx.send(ConversionState::Failed {
                reason: format!("connect failed: {}", e),
            });
            return;
        }
    };
    debug!(url = %url, "progress channel open");

    let (mut write, mut read) = socket.split();

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let update: ProgressUpdate = match serde_json::from_str(&text) {
                    Ok(update) => update,
                    Err(e) => {
                        warn!(error = %e, "skipping malformed progress message");
                        continue;
                    }
                };
                let current = tx.borrow().clone();
                let next = current.apply(&update, &api_base_url);
                let terminal = next.is_terminal();
                if tx.send(next).is_err() {
                    // Every receiver is gone; nobody is watching this job.
                    break;
                }
                if terminal {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                let current = tx.borrow().clone();
                if !current.is_terminal() {
                    let _ = tx.send(ConversionState::Failed {
                        reason: format!("progress channel error: {}", e),
                    });
                }
                break;
            }
        }
    }

    let _ = write.send(Message::Close(None)).await;
    debug!(url = %url, "progress channel closed");
}
