use super::metadata::{save_metadata, CaptureMetadata};
use super::sink::{CaptureOutcome, CaptureRecord, CaptureSink};
use crate::config::CaptureConfig;
use crate::error::Result;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info};

/// `IMG_yyyyMMdd_HHmmss.nv21` in local time
pub fn capture_file_name(timestamp: SystemTime) -> String {
    let local: DateTime<Local> = timestamp.into();
    format!("IMG_{}.nv21", local.format("%Y%m%d_%H%M%S"))
}

/// Writes raw motion frames to the capture directory
pub struct CaptureStore {
    path: PathBuf,
    save_metadata: bool,
}

impl CaptureStore {
    pub fn new<P: Into<PathBuf>>(path: P, save_metadata: bool) -> Self {
        Self {
            path: path.into(),
            save_metadata,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(&config.path, config.save_metadata)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl CaptureSink for CaptureStore {
    async fn handle(&self, record: &CaptureRecord) -> Result<CaptureOutcome> {
        fs::create_dir_all(&self.path).await?;

        let file_path = self.path.join(&record.file_name);
        fs::write(&file_path, record.bytes()).await?;
        info!(
            "Stored capture {} ({} bytes)",
            file_path.display(),
            record.bytes().len()
        );

        if self.save_metadata {
            let metadata = CaptureMetadata::from_record(record);
            let metadata_path = save_metadata(&metadata, &self.path).await?;
            debug!("Capture metadata at {}", metadata_path.display());
        }

        Ok(CaptureOutcome::Stored(file_path))
    }

    fn name(&self) -> &str {
        "capture_store"
    }
}
