use crate::error::Result;
use crate::frame::FrameFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;

use super::sink::CaptureRecord;

/// Counters for the capture integration
#[derive(Debug, Default)]
pub struct CaptureStats {
    pub captures_received: AtomicU64,
    pub captures_stored: AtomicU64,
    pub captures_uploaded: AtomicU64,
    pub sink_failures: AtomicU64,
}

impl CaptureStats {
    pub fn snapshot(&self) -> CaptureStatsSnapshot {
        CaptureStatsSnapshot {
            captures_received: self.captures_received.load(Ordering::Relaxed),
            captures_stored: self.captures_stored.load(Ordering::Relaxed),
            captures_uploaded: self.captures_uploaded.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStatsSnapshot {
    pub captures_received: u64,
    pub captures_stored: u64,
    pub captures_uploaded: u64,
    pub sink_failures: u64,
}

/// Metadata written next to a stored capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureMetadata {
    pub event_id: String,
    pub file_name: String,
    pub frame_id: u64,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub frame_timestamp: SystemTime,
    pub detected_at: SystemTime,
}

impl CaptureMetadata {
    pub fn from_record(record: &CaptureRecord) -> Self {
        let frame = &record.event.frame;
        Self {
            event_id: record.event_id.clone(),
            file_name: record.file_name.clone(),
            frame_id: frame.id,
            width: frame.width,
            height: frame.height,
            format: frame.format,
            frame_timestamp: frame.timestamp,
            detected_at: record.event.detected_at,
        }
    }
}

pub(crate) async fn save_metadata(metadata: &CaptureMetadata, capture_path: &Path) -> Result<PathBuf> {
    let metadata_json = serde_json::to_string_pretty(metadata)?;

    let metadata_dir = capture_path.join("metadata");
    fs::create_dir_all(&metadata_dir).await?;

    let metadata_path = metadata_dir.join(format!("{}.json", metadata.event_id));
    fs::write(&metadata_path, metadata_json).await?;

    debug!("Saved metadata to {}", metadata_path.display());
    Ok(metadata_path)
}
