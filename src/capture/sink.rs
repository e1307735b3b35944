use crate::detector::MotionEvent;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// A motion event prepared for persistence
#[derive(Debug, Clone)]
pub struct CaptureRecord {
    pub event_id: String,
    /// File name shared by every sink handling this capture
    pub file_name: String,
    pub event: MotionEvent,
}

impl CaptureRecord {
    pub fn new(event: MotionEvent) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            file_name: super::store::capture_file_name(event.detected_at),
            event,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.event.frame.as_bytes()
    }
}

/// What a sink did with a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Stored(PathBuf),
    Uploaded { status: u16 },
}

/// Destination for motion captures. Sinks are constructed explicitly and
/// handed to the capture integration.
#[async_trait]
pub trait CaptureSink: Send + Sync {
    async fn handle(&self, record: &CaptureRecord) -> Result<CaptureOutcome>;

    fn name(&self) -> &str;
}
