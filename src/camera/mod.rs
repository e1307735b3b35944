mod orientation;
mod preview;
mod setup;
mod source;
#[cfg(test)]
mod tests;

pub use orientation::{compute as compute_orientation, Facing, Rotation};
pub use preview::{select as select_preview_size, Size, ASPECT_TOLERANCE};
pub use setup::{
    select_fps_range, CameraCapabilities, CameraSettings, CameraSetup, FpsRange, SurfaceInfo,
};
pub use source::{ReplaySource, ReplayStats};
