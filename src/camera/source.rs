use crate::config::CameraConfig;
use crate::error::{Result, WatchcamError};
use crate::frame::{Frame, FrameFormat};
use crate::ingest::IngestHandle;

use std::io::{ErrorKind, SeekFrom};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counters for a replay run
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub frames_read: AtomicU64,
    pub frames_submitted: AtomicU64,
    pub frames_rejected: AtomicU64,
}

/// Frame source that plays back a file of concatenated raw NV21 frames at
/// the configured frame rate
pub struct ReplaySource {
    path: PathBuf,
    width: u32,
    height: u32,
    frame_interval: Duration,
    looping: bool,
    stats: Arc<ReplayStats>,
}

impl ReplaySource {
    pub fn new<P: Into<PathBuf>>(path: P, config: &CameraConfig) -> Self {
        let fps = config.fps.max(1) as u64;
        Self {
            path: path.into(),
            width: config.resolution.0,
            height: config.resolution.1,
            frame_interval: Duration::from_micros(1_000_000 / fps),
            looping: config.replay_loop,
            stats: Arc::new(ReplayStats::default()),
        }
    }

    /// Build a source from `camera.replay_path`, if one is configured
    pub fn from_config(config: &CameraConfig) -> Option<Self> {
        config
            .replay_path
            .as_ref()
            .map(|path| Self::new(path.clone(), config))
    }

    pub fn frame_len(&self) -> usize {
        FrameFormat::Nv21.frame_len(self.width, self.height)
    }

    pub fn stats(&self) -> Arc<ReplayStats> {
        Arc::clone(&self.stats)
    }

    /// Spawn the playback task.
    ///
    /// The task ends at end of file (unless looping), when `cancel` fires, or
    /// when the ingest lane closes. It resolves to the number of frames read.
    pub fn start(self, handle: IngestHandle, cancel: CancellationToken) -> JoinHandle<Result<u64>> {
        tokio::spawn(async move { self.run(handle, cancel).await })
    }

    async fn run(self, handle: IngestHandle, cancel: CancellationToken) -> Result<u64> {
        let mut file = File::open(&self.path).await?;
        let frame_len = self.frame_len();
        if frame_len == 0 {
            return Err(WatchcamError::component(
                "replay_source",
                "Frame resolution must be greater than 0",
            ));
        }

        info!(
            "Replaying {} as {}x{} NV21 every {:?}",
            self.path.display(),
            self.width,
            self.height,
            self.frame_interval
        );

        let mut ticker = tokio::time::interval(self.frame_interval);
        let mut frame_id = 0u64;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Replay cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let mut buffer = vec![0u8; frame_len];
            match file.read_exact(&mut buffer).await {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    if self.looping && frame_id > 0 {
                        debug!("Replay reached end of file, restarting");
                        file.seek(SeekFrom::Start(0)).await?;
                        continue;
                    }
                    info!("Replay finished after {} frames", frame_id);
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            self.stats.frames_read.fetch_add(1, Ordering::Relaxed);
            let frame = Frame::nv21(frame_id, SystemTime::now(), buffer, self.width, self.height);
            frame_id += 1;

            match handle.submit(frame) {
                Ok(()) => {
                    self.stats.frames_submitted.fetch_add(1, Ordering::Relaxed);
                }
                Err(WatchcamError::QueueFull) => {
                    self.stats.frames_rejected.fetch_add(1, Ordering::Relaxed);
                }
                Err(WatchcamError::IngestClosed) => {
                    warn!("Ingest lane closed, stopping replay");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(self.stats.frames_read.load(Ordering::Relaxed))
    }
}
