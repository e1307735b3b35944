use super::metadata::{CaptureStats, CaptureStatsSnapshot};
use super::sink::{CaptureOutcome, CaptureRecord, CaptureSink};
use super::store::CaptureStore;
use super::upload::UploadClient;
use crate::config::WatchcamConfig;
use crate::error::{Result, WatchcamError};
use crate::events::{EventBus, EventFilter, EventReceiver, WatchcamEvent};

use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Hands motion events to the configured capture sinks.
///
/// Runs on its own task so slow sinks never hold up the ingest lane.
pub struct CaptureIntegration {
    sinks: Vec<Arc<dyn CaptureSink>>,
    event_bus: Arc<EventBus>,
    stats: Arc<CaptureStats>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CaptureIntegration {
    pub fn new(sinks: Vec<Arc<dyn CaptureSink>>, event_bus: Arc<EventBus>) -> Self {
        Self {
            sinks,
            event_bus,
            stats: Arc::new(CaptureStats::default()),
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Build the sinks enabled in the configuration
    pub fn from_config(config: &WatchcamConfig, event_bus: Arc<EventBus>) -> Result<Self> {
        let mut builder = CaptureIntegration::builder().event_bus(event_bus);

        if config.capture.enabled {
            builder = builder.sink(Arc::new(CaptureStore::from_config(&config.capture)));
        }

        if config.upload.enabled {
            builder = builder.sink(Arc::new(UploadClient::new(&config.upload)?));
        }

        builder.build()
    }

    pub fn builder() -> CaptureIntegrationBuilder {
        CaptureIntegrationBuilder::new()
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|sink| sink.name().to_string()).collect()
    }

    /// Subscribe to motion events and start handing them to the sinks
    pub fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            warn!("Capture integration is already running");
            return Ok(());
        }

        if self.sinks.is_empty() {
            warn!("No capture sinks enabled - motion events will only be logged");
        }

        let receiver = self.event_bus.subscribe_filtered(
            EventFilter::EventTypes(vec!["motion_detected"]),
            "capture_integration",
        );

        self.task = Some(tokio::spawn(capture_loop(
            receiver,
            self.sinks.clone(),
            Arc::clone(&self.event_bus),
            Arc::clone(&self.stats),
            self.cancel.clone(),
        )));

        info!("Capture integration started with sinks: {:?}", self.sink_names());
        Ok(())
    }

    /// Stop listening; a capture already being handled finishes first
    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping capture integration");
        self.cancel.cancel();

        if let Some(task) = self.task.take() {
            task.await.map_err(|e| {
                WatchcamError::component("capture_integration".to_string(), e.to_string())
            })?;
        }

        info!("Capture integration stopped");
        Ok(())
    }

    pub fn stats(&self) -> CaptureStatsSnapshot {
        self.stats.snapshot()
    }
}

async fn capture_loop(
    mut receiver: EventReceiver,
    sinks: Vec<Arc<dyn CaptureSink>>,
    event_bus: Arc<EventBus>,
    stats: Arc<CaptureStats>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = receiver.recv() => event,
        };

        let motion = match event {
            Ok(WatchcamEvent::MotionDetected(motion)) => motion,
            Ok(_) => continue,
            Err(e) => {
                debug!("Capture integration receiver ended: {}", e);
                break;
            }
        };

        stats.captures_received.fetch_add(1, Ordering::Relaxed);
        let record = CaptureRecord::new(motion);
        let frame_id = record.event.frame.id;

        for sink in &sinks {
            match sink.handle(&record).await {
                Ok(CaptureOutcome::Stored(path)) => {
                    stats.captures_stored.fetch_add(1, Ordering::Relaxed);
                    event_bus.publish_lossy(WatchcamEvent::CaptureStored { frame_id, path });
                }
                Ok(CaptureOutcome::Uploaded { status }) => {
                    stats.captures_uploaded.fetch_add(1, Ordering::Relaxed);
                    event_bus.publish_lossy(WatchcamEvent::CaptureUploaded { frame_id, status });
                }
                Err(e) => {
                    stats.sink_failures.fetch_add(1, Ordering::Relaxed);
                    error!("Capture sink {} failed for frame {}: {}", sink.name(), frame_id, e);
                    event_bus.publish_lossy(WatchcamEvent::SystemError {
                        component: sink.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    debug!("Capture loop ended");
}

/// Builder for CaptureIntegration
pub struct CaptureIntegrationBuilder {
    sinks: Vec<Arc<dyn CaptureSink>>,
    event_bus: Option<Arc<EventBus>>,
}

impl CaptureIntegrationBuilder {
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            event_bus: None,
        }
    }

    pub fn sink(mut self, sink: Arc<dyn CaptureSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn build(self) -> Result<CaptureIntegration> {
        let event_bus = self.event_bus.ok_or_else(|| {
            WatchcamError::component("capture_integration_builder", "Event bus is required")
        })?;

        Ok(CaptureIntegration::new(self.sinks, event_bus))
    }
}

impl Default for CaptureIntegrationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
