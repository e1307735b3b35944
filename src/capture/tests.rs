use super::*;
use crate::config::{UploadConfig, WatchcamConfig};
use crate::detector::MotionEvent;
use crate::error::{Result, WatchcamError};
use crate::events::{EventBus, EventFilter, WatchcamEvent};
use crate::frame::Frame;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::timeout;

fn motion_event(frame_id: u64) -> MotionEvent {
    let frame = Frame::nv21(frame_id, SystemTime::now(), vec![42u8; 24], 4, 4);
    MotionEvent {
        frame,
        detected_at: SystemTime::now(),
    }
}

/// Records the frame ids it receives
#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<u64>>,
}

#[async_trait]
impl CaptureSink for RecordingSink {
    async fn handle(&self, record: &CaptureRecord) -> Result<CaptureOutcome> {
        self.seen.lock().await.push(record.event.frame.id);
        Ok(CaptureOutcome::Uploaded { status: 204 })
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct FailingSink;

#[async_trait]
impl CaptureSink for FailingSink {
    async fn handle(&self, _record: &CaptureRecord) -> Result<CaptureOutcome> {
        Err(WatchcamError::system("disk full"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[test]
fn test_capture_file_name_pattern() {
    let name = capture_file_name(SystemTime::now());
    assert!(name.starts_with("IMG_"));
    assert!(name.ends_with(".nv21"));
    // IMG_ + yyyyMMdd_HHmmss + .nv21
    assert_eq!(name.len(), 4 + 15 + 5);
    assert_eq!(&name[12..13], "_");
}

#[tokio::test]
async fn test_store_writes_frame_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let store = CaptureStore::new(dir.path().join("captures"), true);
    let record = CaptureRecord::new(motion_event(5));

    let outcome = store.handle(&record).await.unwrap();
    let path = match outcome {
        CaptureOutcome::Stored(path) => path,
        other => panic!("Unexpected outcome: {:?}", other),
    };

    assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![42u8; 24]);

    let metadata_path = dir
        .path()
        .join("captures")
        .join("metadata")
        .join(format!("{}.json", record.event_id));
    let json = tokio::fs::read_to_string(metadata_path).await.unwrap();
    let metadata: CaptureMetadata = serde_json::from_str(&json).unwrap();
    assert_eq!(metadata.frame_id, 5);
    assert_eq!(metadata.file_name, record.file_name);
    assert_eq!((metadata.width, metadata.height), (4, 4));
}

#[tokio::test]
async fn test_integration_delivers_to_all_sinks() {
    let event_bus = Arc::new(EventBus::new(16));
    let recording = Arc::new(RecordingSink::default());

    let mut integration = CaptureIntegration::builder()
        .event_bus(Arc::clone(&event_bus))
        .sink(Arc::new(FailingSink))
        .sink(Arc::clone(&recording) as Arc<dyn CaptureSink>)
        .build()
        .unwrap();
    assert_eq!(integration.sink_names(), vec!["failing", "recording"]);

    let mut uploads =
        event_bus.subscribe_filtered(EventFilter::EventTypes(vec!["capture_uploaded"]), "test");
    integration.start().unwrap();

    event_bus
        .publish(WatchcamEvent::MotionDetected(motion_event(3)))
        .unwrap();

    match timeout(Duration::from_secs(1), uploads.recv()).await.unwrap().unwrap() {
        WatchcamEvent::CaptureUploaded { frame_id, status } => {
            assert_eq!(frame_id, 3);
            assert_eq!(status, 204);
        }
        other => panic!("Unexpected event: {:?}", other),
    }

    integration.stop().await.unwrap();
    assert_eq!(*recording.seen.lock().await, vec![3]);

    let stats = integration.stats();
    assert_eq!(stats.captures_received, 1);
    assert_eq!(stats.captures_uploaded, 1);
    assert_eq!(stats.sink_failures, 1);
}

#[tokio::test]
async fn test_from_config_selects_sinks() {
    let event_bus = Arc::new(EventBus::new(16));
    let mut config = WatchcamConfig::default();
    config.capture.enabled = false;
    config.upload.enabled = true;

    let integration = CaptureIntegration::from_config(&config, event_bus).unwrap();
    assert_eq!(integration.sink_names(), vec!["upload_client"]);
}

#[test]
fn test_builder_requires_event_bus() {
    assert!(CaptureIntegration::builder().build().is_err());
}

/// Accept one HTTP request, capture it, and reply 200
async fn serve_once(listener: TcpListener) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut request = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        request.extend_from_slice(&chunk[..n]);
        if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|value| value.trim().parse::<usize>().unwrap())
        .unwrap_or(0);

    let chunked = headers.contains("transfer-encoding: chunked");

    loop {
        let complete = if chunked {
            request.ends_with(b"0\r\n\r\n")
        } else {
            request.len() >= header_end + content_length
        };
        if complete {
            break;
        }

        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..n]);
    }

    socket
        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
        .await
        .unwrap();
    String::from_utf8_lossy(&request).into_owned()
}

#[tokio::test]
async fn test_upload_client_puts_multipart_photo() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(listener));

    let client = UploadClient::new(&UploadConfig {
        enabled: true,
        endpoint: format!("http://{}", address),
        route: "/upload/photo".to_string(),
        timeout_seconds: 5,
    })
    .unwrap();

    let record = CaptureRecord::new(motion_event(8));
    let outcome = client.handle(&record).await.unwrap();
    assert_eq!(outcome, CaptureOutcome::Uploaded { status: 200 });

    let request = timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    assert!(request.starts_with("PUT /upload/photo HTTP/1.1"));
    assert!(request.contains("multipart/form-data"));
    assert!(request.contains("name=\"photo\""));
    assert!(request.contains(&record.file_name));
}
