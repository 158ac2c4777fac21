//! Submission tests against an in-process upload server.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use recode_api_client::ApiClient;
use recode_core::{ClientConfig, ConversionState, ConvertError, OutputFormat, ProgressSink};

#[derive(Default)]
struct UploadServer {
    hits: AtomicUsize,
    formats: Mutex<Vec<String>>,
    /// (field name, file name, byte length) per received multipart field.
    fields: Mutex<Vec<(String, String, usize)>>,
    fail_with: Option<u16>,
}

async fn upload_handler(
    State(server): State<Arc<UploadServer>>,
    Path(format): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, StatusCode> {
    server.hits.fetch_add(1, Ordering::SeqCst);
    server.formats.lock().unwrap().push(format);

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap();
        server
            .fields
            .lock()
            .unwrap()
            .push((name, file_name, data.len()));
    }

    if let Some(status) = server.fail_with {
        return Err(StatusCode::from_u16(status).unwrap());
    }
    Ok(Json(serde_json::json!({ "jobId": "job-1" })))
}

async fn spawn_upload_server(server: Arc<UploadServer>) -> SocketAddr {
    let app = Router::new()
        .route("/upload/{format}", post(upload_handler))
        .with_state(server);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> ApiClient {
    // The ws address is unused by submission tests.
    ApiClient::new(ClientConfig::new(format!("http://{}", addr), "ws://127.0.0.1:1")).unwrap()
}

fn temp_media_file(len: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".mov")
        .tempfile()
        .unwrap();
    file.write_all(&vec![0xabu8; len]).unwrap();
    file
}

#[derive(Default)]
struct CollectingSink {
    states: Mutex<Vec<ConversionState>>,
}

impl ProgressSink for CollectingSink {
    fn on_state(&self, state: &ConversionState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

#[tokio::test]
async fn submit_sends_one_request_with_format_in_path() {
    let server = Arc::new(UploadServer::default());
    let addr = spawn_upload_server(Arc::clone(&server)).await;
    let client = client_for(addr);
    let file = temp_media_file(1024);

    let job_id = client
        .submit(file.path(), Some(OutputFormat::Webm), None)
        .await
        .unwrap();

    assert_eq!(job_id.as_str(), "job-1");
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
    assert_eq!(*server.formats.lock().unwrap(), vec!["webm".to_string()]);

    let fields = server.fields.lock().unwrap();
    assert_eq!(fields.len(), 1);
    let (name, file_name, len) = &fields[0];
    assert_eq!(name, "video");
    assert!(file_name.ends_with(".mov"));
    assert_eq!(*len, 1024);
}

#[tokio::test]
async fn submit_reports_upload_progress_through_sink() {
    let server = Arc::new(UploadServer::default());
    let addr = spawn_upload_server(Arc::clone(&server)).await;
    let client = client_for(addr);
    let file = temp_media_file(64 * 1024);

    let sink = Arc::new(CollectingSink::default());
    client
        .submit(file.path(), Some(OutputFormat::Mp4), Some(sink.clone()))
        .await
        .unwrap();

    let states = sink.states.lock().unwrap();
    assert!(!states.is_empty());
    assert!(states
        .iter()
        .all(|s| matches!(s, ConversionState::Uploading { .. })));
    match states.last().unwrap() {
        ConversionState::Uploading { percent } => assert_eq!(*percent, 100.0),
        other => panic!("unexpected final state: {:?}", other),
    }
}

#[tokio::test]
async fn submit_without_format_makes_no_request() {
    let server = Arc::new(UploadServer::default());
    let addr = spawn_upload_server(Arc::clone(&server)).await;
    let client = client_for(addr);
    let file = temp_media_file(16);

    let err = client.submit(file.path(), None, None).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConvertError>(),
        Some(ConvertError::MissingFormat)
    ));
    assert_eq!(server.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn submit_with_missing_file_makes_no_request() {
    let server = Arc::new(UploadServer::default());
    let addr = spawn_upload_server(Arc::clone(&server)).await;
    let client = client_for(addr);

    let err = client
        .submit(
            std::path::Path::new("/no/such/clip.mov"),
            Some(OutputFormat::Mp4),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConvertError>(),
        Some(ConvertError::MissingFile(_))
    ));
    assert_eq!(server.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_submission_surfaces_server_status() {
    let server = Arc::new(UploadServer {
        fail_with: Some(500),
        ..UploadServer::default()
    });
    let addr = spawn_upload_server(Arc::clone(&server)).await;
    let client = client_for(addr);
    let file = temp_media_file(16);

    let err = client
        .submit(file.path(), Some(OutputFormat::Gif), None)
        .await
        .unwrap_err();

    match err.downcast_ref::<ConvertError>() {
        Some(ConvertError::UploadFailed { status, .. }) => assert_eq!(*status, 500),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}
