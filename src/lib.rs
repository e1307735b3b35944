pub mod app;
pub mod camera;
pub mod capture;
pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod frame;
pub mod ingest;

pub use app::{Component, ComponentState, ShutdownHandle, ShutdownReason, WatchcamApp};
pub use camera::{
    compute_orientation, select_fps_range, select_preview_size, CameraCapabilities,
    CameraSettings, CameraSetup, Facing, FpsRange, ReplaySource, Rotation, Size, SurfaceInfo,
};
pub use capture::{CaptureIntegration, CaptureRecord, CaptureSink, CaptureStore, UploadClient};
pub use config::{QueuePolicy, WatchcamConfig};
pub use detector::{difference_count, is_motion, FrameBuffer, MotionDetector, MotionEvent};
pub use error::{Result, WatchcamError};
pub use events::{DropReason, EventBus, EventFilter, EventReceiver, WatchcamEvent};
pub use frame::{Frame, FrameFormat};
pub use ingest::{FrameIngestWorker, FrameQueue, IngestHandle};
