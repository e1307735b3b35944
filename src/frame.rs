use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel layouts delivered by the camera preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Full-resolution luma plane followed by interleaved V/U at quarter resolution
    Nv21,
}

impl FrameFormat {
    /// Expected buffer length for a frame of the given dimensions
    pub fn frame_len(&self, width: u32, height: u32) -> usize {
        match self {
            FrameFormat::Nv21 => width as usize * height as usize * 3 / 2,
        }
    }
}

/// One captured preview frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequence number assigned by the source
    pub id: u64,
    /// Arrival time of the frame
    pub timestamp: SystemTime,
    /// Raw frame bytes, never mutated after construction
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame format
    pub format: FrameFormat,
}

impl Frame {
    /// Create a new frame
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Create an NV21 frame
    pub fn nv21(id: u64, timestamp: SystemTime, data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(id, timestamp, data, width, height, FrameFormat::Nv21)
    }

    /// Number of bytes in the frame buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Expected buffer length for the frame's dimensions and format
    pub fn expected_size(&self) -> usize {
        self.format.frame_len(self.width, self.height)
    }

    /// Validate the buffer length against the frame's dimensions
    pub fn validate_size(&self) -> bool {
        self.data.len() == self.expected_size()
    }
}
