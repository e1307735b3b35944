use crate::error::{Result, WatchcamError};
use serde::{Deserialize, Serialize};

/// Which way the camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Front,
    Back,
}

/// Rotation of the display relative to its natural orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl Rotation {
    /// Get rotation angle in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Rotation0 => 0,
            Rotation::Rotation90 => 90,
            Rotation::Rotation180 => 180,
            Rotation::Rotation270 => 270,
        }
    }

    pub fn from_degrees(degrees: u32) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::Rotation0),
            90 => Ok(Rotation::Rotation90),
            180 => Ok(Rotation::Rotation180),
            270 => Ok(Rotation::Rotation270),
            _ => Err(WatchcamError::InvalidRotationAngle { degrees }),
        }
    }
}

/// Rotation to apply to the sensor image so it appears upright on the display.
///
/// Front-facing cameras are mirrored, so their result is reflected.
pub fn compute(sensor_orientation: u32, facing: Facing, device_rotation: Rotation) -> u32 {
    let sensor = sensor_orientation % 360;
    let degrees = device_rotation.degrees();

    match facing {
        Facing::Front => {
            let result = (sensor + degrees) % 360;
            (360 - result) % 360
        }
        Facing::Back => (sensor + 360 - degrees) % 360,
    }
}
