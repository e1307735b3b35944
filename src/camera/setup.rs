use super::orientation::{compute, Facing, Rotation};
use super::preview::{select, Size};
use crate::error::Result;
use crate::frame::FrameFormat;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Supported preview frame-rate range, in frames per second scaled by 1000
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FpsRange {
    pub min: u32,
    pub max: u32,
}

/// What the capture device reports about itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraCapabilities {
    pub facing: Facing,
    /// Clockwise rotation of the sensor image relative to the device's natural orientation
    pub sensor_orientation: u32,
    pub preview_sizes: Vec<Size>,
    /// Supported frame-rate ranges, ordered from highest to lowest
    pub fps_ranges: Vec<FpsRange>,
}

/// The preview surface after a layout change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
}

/// Settings to apply to the capture device for a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    pub display_orientation: u32,
    pub preview_size: Size,
    pub preview_format: FrameFormat,
    pub fps_range: Option<FpsRange>,
}

/// The last supported range, pinned to its lower bound
pub fn select_fps_range(ranges: &[FpsRange]) -> Option<FpsRange> {
    ranges.last().map(|range| FpsRange {
        min: range.min,
        max: range.min,
    })
}

/// Recomputes capture settings whenever the preview surface changes
pub struct CameraSetup {
    capabilities: CameraCapabilities,
}

impl CameraSetup {
    pub fn new(capabilities: CameraCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &CameraCapabilities {
        &self.capabilities
    }

    /// Derive orientation, preview size and frame rate for a surface
    pub fn configure(&self, surface: SurfaceInfo) -> Result<CameraSettings> {
        let display_orientation = compute(
            self.capabilities.sensor_orientation,
            self.capabilities.facing,
            surface.rotation,
        );

        let preview_size = select(
            &self.capabilities.preview_sizes,
            surface.width,
            surface.height,
        )?;

        let fps_range = select_fps_range(&self.capabilities.fps_ranges);
        debug!("Selected preview fps range: {:?}", fps_range);

        info!(
            "Surface {}x{} ({:?}): preview {}x{}, display orientation {}",
            surface.width,
            surface.height,
            surface.rotation,
            preview_size.width,
            preview_size.height,
            display_orientation
        );

        Ok(CameraSettings {
            display_orientation,
            preview_size,
            preview_format: FrameFormat::Nv21,
            fps_range,
        })
    }
}
