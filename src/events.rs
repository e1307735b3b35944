use crate::detector::MotionEvent;
use crate::error::{Result, WatchcamError};
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Why the ingest lane discarded a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Evicted or rejected by the queue policy
    QueueFull,
    /// Frame length did not match the baseline frame
    SizeMismatch,
    /// Still queued when the lane shut down
    Shutdown,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::QueueFull => "queue_full",
            DropReason::SizeMismatch => "size_mismatch",
            DropReason::Shutdown => "shutdown",
        }
    }
}

/// Events that can occur in the watchcam system
#[derive(Debug, Clone)]
pub enum WatchcamEvent {
    /// Motion was detected; carries the baseline frame
    MotionDetected(MotionEvent),
    /// A frame was dropped by the ingest lane
    FrameDropped { frame_id: u64, reason: DropReason },
    /// A motion frame was written to disk
    CaptureStored { frame_id: u64, path: PathBuf },
    /// A motion frame was uploaded
    CaptureUploaded { frame_id: u64, status: u16 },
    /// A system error occurred in a component
    SystemError { component: String, error: String },
    /// System shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl WatchcamEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            WatchcamEvent::MotionDetected(motion) => {
                format!("Motion detected relative to frame {}", motion.frame.id)
            }
            WatchcamEvent::FrameDropped { frame_id, reason } => {
                format!("Frame {} dropped ({})", frame_id, reason.as_str())
            }
            WatchcamEvent::CaptureStored { frame_id, path } => {
                format!("Frame {} stored at {}", frame_id, path.display())
            }
            WatchcamEvent::CaptureUploaded { frame_id, status } => {
                format!("Frame {} uploaded (status {})", frame_id, status)
            }
            WatchcamEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
            WatchcamEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            WatchcamEvent::MotionDetected(_) => "motion_detected",
            WatchcamEvent::FrameDropped { .. } => "frame_dropped",
            WatchcamEvent::CaptureStored { .. } => "capture_stored",
            WatchcamEvent::CaptureUploaded { .. } => "capture_uploaded",
            WatchcamEvent::SystemError { .. } => "system_error",
            WatchcamEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WatchcamEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<WatchcamEvent> {
        self.sender.subscribe()
    }

    /// Subscribe with a filter applied to every received event
    pub fn subscribe_filtered(&self, filter: EventFilter, name: &str) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), filter, name.to_string())
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: WatchcamEvent) -> Result<usize> {
        match &event {
            WatchcamEvent::MotionDetected(motion) => {
                info!(
                    frame_id = motion.frame.id,
                    "Motion detected at {:?}", motion.detected_at
                );
            }
            WatchcamEvent::FrameDropped { frame_id, reason } => {
                warn!("Frame {} dropped: {}", frame_id, reason.as_str());
            }
            WatchcamEvent::SystemError { component, error } => {
                error!("System error in {}: {}", component, error);
            }
            WatchcamEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => debug!("Event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| WatchcamError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Publish, treating "no subscribers" as a normal condition
    pub fn publish_lossy(&self, event: WatchcamEvent) {
        if self.publish(event).is_err() {
            debug!("Event published with no active subscribers");
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &WatchcamEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<WatchcamEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    pub fn new(
        receiver: broadcast::Receiver<WatchcamEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event.
    ///
    /// A lagging receiver skips the events it missed and keeps going.
    pub async fn recv(&mut self) -> Result<WatchcamEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(WatchcamError::ChannelClosed);
                }
            }
        }
    }
}
