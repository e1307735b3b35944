use super::queue::{FrameQueue, PushOutcome};
use crate::config::IngestConfig;
use crate::detector::MotionDetector;
use crate::error::{Result, WatchcamError};
use crate::events::{DropReason, EventBus, WatchcamEvent};
use crate::frame::Frame;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Counters for the ingest lane
#[derive(Debug, Default)]
pub struct IngestStats {
    pub frames_submitted: AtomicU64,
    pub frames_processed: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub frames_rejected: AtomicU64,
    pub motion_events: AtomicU64,
}

impl IngestStats {
    pub fn snapshot(&self) -> IngestStatsSnapshot {
        IngestStatsSnapshot {
            frames_submitted: self.frames_submitted.load(Ordering::Relaxed),
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            motion_events: self.motion_events.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStatsSnapshot {
    pub frames_submitted: u64,
    /// Frames the detector accepted, rejected frames excluded
    pub frames_processed: u64,
    /// Discarded by the queue policy or at shutdown
    pub frames_dropped: u64,
    /// Malformed frames the detector refused
    pub frames_rejected: u64,
    pub motion_events: u64,
}

/// Producer side of the ingest lane. Cheap to clone; only ever enqueues.
#[derive(Clone)]
pub struct IngestHandle {
    queue: Arc<FrameQueue>,
    event_bus: Arc<EventBus>,
    stats: Arc<IngestStats>,
}

impl IngestHandle {
    /// Hand a frame to the lane.
    ///
    /// Never blocks. Under the bounded policy a full queue rejects the frame
    /// with `QueueFull`; under drop-oldest the evicted frame is reported on the
    /// event bus instead.
    pub fn submit(&self, frame: Frame) -> Result<()> {
        let frame_id = frame.id;

        match self.queue.push(frame) {
            Ok(PushOutcome::Queued) => {
                self.stats.frames_submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Ok(PushOutcome::Evicted(evicted)) => {
                self.stats.frames_submitted.fetch_add(1, Ordering::Relaxed);
                self.record_drop(evicted.id, DropReason::QueueFull);
                Ok(())
            }
            Err(WatchcamError::QueueFull) => {
                self.record_drop(frame_id, DropReason::QueueFull);
                Err(WatchcamError::QueueFull)
            }
            Err(e) => Err(e),
        }
    }

    fn record_drop(&self, frame_id: u64, reason: DropReason) {
        self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
        self.event_bus
            .publish_lossy(WatchcamEvent::FrameDropped { frame_id, reason });
    }

    /// Stop accepting frames
    pub fn close(&self) {
        for frame in self.queue.close() {
            self.record_drop(frame.id, DropReason::Shutdown);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Frames waiting to be processed
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

/// Single consumer that owns the motion detector and processes frames in
/// arrival order
pub struct FrameIngestWorker {
    queue: Arc<FrameQueue>,
    event_bus: Arc<EventBus>,
    stats: Arc<IngestStats>,
    detector: Option<MotionDetector>,
    task: Option<JoinHandle<MotionDetector>>,
}

impl FrameIngestWorker {
    pub fn new(config: &IngestConfig, detector: MotionDetector, event_bus: Arc<EventBus>) -> Self {
        info!(
            "Creating frame ingest worker ({:?}, capacity {})",
            config.queue_policy, config.queue_capacity
        );

        Self {
            queue: Arc::new(FrameQueue::new(config.queue_policy, config.queue_capacity)),
            event_bus,
            stats: Arc::new(IngestStats::default()),
            detector: Some(detector),
            task: None,
        }
    }

    /// A producer handle for frame sources
    pub fn handle(&self) -> IngestHandle {
        IngestHandle {
            queue: Arc::clone(&self.queue),
            event_bus: Arc::clone(&self.event_bus),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Spawn the processing task
    pub fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            warn!("Frame ingest worker is already running");
            return Ok(());
        }

        let detector = self
            .detector
            .take()
            .ok_or_else(|| WatchcamError::component("ingest_worker", "Detector already consumed"))?;

        let queue = Arc::clone(&self.queue);
        let event_bus = Arc::clone(&self.event_bus);
        let stats = Arc::clone(&self.stats);

        self.task = Some(tokio::spawn(run_lane(queue, detector, event_bus, stats)));
        info!("Frame ingest worker started");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Close the queue and wait for the frame in flight to finish.
    ///
    /// Frames still queued are discarded. The detector is kept so the worker
    /// can be inspected afterwards.
    pub async fn shutdown(&mut self) -> Result<IngestStatsSnapshot> {
        info!("Stopping frame ingest worker");
        self.handle().close();

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(detector) => self.detector = Some(detector),
                Err(e) => {
                    error!("Frame ingest task failed: {}", e);
                    return Err(WatchcamError::component(
                        "ingest_worker".to_string(),
                        e.to_string(),
                    ));
                }
            }
        }

        let stats = self.stats.snapshot();
        info!(
            "Frame ingest worker stopped: {} processed, {} dropped, {} rejected, {} motion events",
            stats.frames_processed, stats.frames_dropped, stats.frames_rejected, stats.motion_events
        );
        Ok(stats)
    }

    pub fn stats(&self) -> IngestStatsSnapshot {
        self.stats.snapshot()
    }

    /// The detector, available before `start` and after `shutdown`
    pub fn detector(&self) -> Option<&MotionDetector> {
        self.detector.as_ref()
    }
}

async fn run_lane(
    queue: Arc<FrameQueue>,
    mut detector: MotionDetector,
    event_bus: Arc<EventBus>,
    stats: Arc<IngestStats>,
) -> MotionDetector {
    debug!("Frame ingest lane running");

    while let Some(frame) = queue.pop().await {
        let frame_id = frame.id;
        let now = frame.timestamp;

        // A frame that cannot be NV21 for its own dimensions never reaches the
        // detector, so it can never become the baseline.
        if !frame.validate_size() {
            warn!(
                "Dropping malformed frame {}: {} bytes for {}x{}, expected {}",
                frame_id,
                frame.len(),
                frame.width,
                frame.height,
                frame.expected_size()
            );
            reject_frame(&event_bus, &stats, frame_id);
            continue;
        }

        if let Some(dimensions) = detector.baseline_dimensions() {
            if dimensions != (frame.width, frame.height) {
                info!(
                    "Frame resolution changed from {}x{} to {}x{}, resetting baseline",
                    dimensions.0, dimensions.1, frame.width, frame.height
                );
                detector.reset();
            }
        }

        match detector.process(frame, now) {
            Ok(event) => {
                stats.frames_processed.fetch_add(1, Ordering::Relaxed);
                if let Some(event) = event {
                    stats.motion_events.fetch_add(1, Ordering::Relaxed);
                    event_bus.publish_lossy(WatchcamEvent::MotionDetected(event));
                }
            }
            Err(e) if e.is_frame_local() => {
                warn!("Dropping malformed frame {}: {}", frame_id, e);
                reject_frame(&event_bus, &stats, frame_id);
            }
            Err(e) => {
                error!("Motion detection failed for frame {}: {}", frame_id, e);
                event_bus.publish_lossy(WatchcamEvent::SystemError {
                    component: "ingest_worker".to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    debug!("Frame ingest lane drained");
    detector
}

fn reject_frame(event_bus: &EventBus, stats: &IngestStats, frame_id: u64) {
    stats.frames_rejected.fetch_add(1, Ordering::Relaxed);
    event_bus.publish_lossy(WatchcamEvent::FrameDropped {
        frame_id,
        reason: DropReason::SizeMismatch,
    });
}

impl Drop for FrameIngestWorker {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.queue.close();
        }
    }
}
