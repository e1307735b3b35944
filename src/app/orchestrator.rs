use super::runtime::ShutdownHandle;
use super::types::{Component, ComponentState, ShutdownReason};
use crate::camera::ReplaySource;
use crate::capture::CaptureIntegration;
use crate::config::WatchcamConfig;
use crate::detector::MotionDetector;
use crate::error::Result;
use crate::events::EventBus;
use crate::ingest::{FrameIngestWorker, IngestHandle};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Main application coordinator: frame source, ingest lane and capture sinks
pub struct WatchcamApp {
    pub(super) config: WatchcamConfig,
    pub(super) event_bus: Arc<EventBus>,

    // Components
    pub(super) worker: FrameIngestWorker,
    pub(super) capture: CaptureIntegration,
    pub(super) source: Option<ReplaySource>,
    pub(super) source_task: Option<JoinHandle<Result<u64>>>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<Component, ComponentState>>>,
    pub(super) shutdown_sender: Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl WatchcamApp {
    /// Create the application with the given configuration
    pub async fn new(config: WatchcamConfig) -> Result<Self> {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let detector = MotionDetector::new(config.detector.clone());
        let worker = FrameIngestWorker::new(&config.ingest, detector, Arc::clone(&event_bus));
        let capture = CaptureIntegration::from_config(&config, Arc::clone(&event_bus))?;
        let source = ReplaySource::from_config(&config.camera);

        let mut states = HashMap::new();
        states.insert(Component::Ingest, ComponentState::Stopped);
        states.insert(Component::Capture, ComponentState::Stopped);
        if source.is_some() {
            states.insert(Component::Source, ComponentState::Stopped);
        }

        Ok(Self {
            config,
            event_bus,
            worker,
            capture,
            source,
            source_task: None,
            component_states: Arc::new(Mutex::new(states)),
            shutdown_sender: Arc::new(Mutex::new(Some(shutdown_sender))),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Handle for frame sources outside the application
    pub fn ingest_handle(&self) -> IngestHandle {
        self.worker.handle()
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn config(&self) -> &WatchcamConfig {
        &self.config
    }

    /// Handle that ends `run` from anywhere in the process
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(Arc::clone(&self.shutdown_sender))
    }

    /// Start consumers before producers: capture, ingest, then the source
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting watchcam system");

        self.set_component_state(Component::Capture, ComponentState::Starting)
            .await;
        if let Err(e) = self.capture.start() {
            error!("Failed to start capture integration: {}", e);
            self.set_component_state(Component::Capture, ComponentState::Failed)
                .await;
            return Err(e);
        }
        self.set_component_state(Component::Capture, ComponentState::Running)
            .await;

        self.set_component_state(Component::Ingest, ComponentState::Starting)
            .await;
        if let Err(e) = self.worker.start() {
            error!("Failed to start ingest worker: {}", e);
            self.set_component_state(Component::Ingest, ComponentState::Failed)
                .await;
            return Err(e);
        }
        self.set_component_state(Component::Ingest, ComponentState::Running)
            .await;

        if let Some(source) = self.source.take() {
            self.set_component_state(Component::Source, ComponentState::Running)
                .await;
            self.source_task = Some(source.start(
                self.worker.handle(),
                self.cancellation_token.child_token(),
            ));
        } else {
            info!("No replay source configured; waiting for frames on the ingest handle");
        }

        info!("Watchcam system started");
        Ok(())
    }

    /// Stop producers before consumers. Returns the process exit code.
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");
        self.cancellation_token.cancel();

        if let Some(task) = self.source_task.take() {
            self.set_component_state(Component::Source, ComponentState::Stopping)
                .await;
            match timeout(Duration::from_secs(5), task).await {
                Ok(Ok(Ok(frames))) => {
                    info!("Replay source stopped after {} frames", frames);
                    self.set_component_state(Component::Source, ComponentState::Stopped)
                        .await;
                }
                Ok(Ok(Err(e))) => {
                    error!("Replay source failed: {}", e);
                    self.set_component_state(Component::Source, ComponentState::Failed)
                        .await;
                }
                Ok(Err(e)) => {
                    error!("Replay source task panicked: {}", e);
                    self.set_component_state(Component::Source, ComponentState::Failed)
                        .await;
                }
                Err(_) => {
                    warn!("Replay source stop timeout");
                    self.set_component_state(Component::Source, ComponentState::Failed)
                        .await;
                }
            }
        }

        self.set_component_state(Component::Ingest, ComponentState::Stopping)
            .await;
        match timeout(Duration::from_secs(10), self.worker.shutdown()).await {
            Ok(Ok(_)) => {
                self.set_component_state(Component::Ingest, ComponentState::Stopped)
                    .await;
            }
            Ok(Err(e)) => {
                error!("Error stopping ingest worker: {}", e);
                self.set_component_state(Component::Ingest, ComponentState::Failed)
                    .await;
            }
            Err(_) => {
                error!("Ingest worker stop timeout");
                self.set_component_state(Component::Ingest, ComponentState::Failed)
                    .await;
            }
        }

        self.set_component_state(Component::Capture, ComponentState::Stopping)
            .await;
        match timeout(Duration::from_secs(10), self.capture.stop()).await {
            Ok(Ok(())) => {
                self.set_component_state(Component::Capture, ComponentState::Stopped)
                    .await;
            }
            Ok(Err(e)) => {
                error!("Error stopping capture integration: {}", e);
                self.set_component_state(Component::Capture, ComponentState::Failed)
                    .await;
            }
            Err(_) => {
                error!("Capture integration stop timeout");
                self.set_component_state(Component::Capture, ComponentState::Failed)
                    .await;
            }
        }

        let capture_stats = self.capture.stats();
        info!(
            "Captures: {} received, {} stored, {} uploaded, {} sink failures",
            capture_stats.captures_received,
            capture_stats.captures_stored,
            capture_stats.captures_uploaded,
            capture_stats.sink_failures
        );

        let exit_code = if self.has_failed_component().await { 1 } else { 0 };
        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }
}
