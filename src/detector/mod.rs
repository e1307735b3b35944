mod buffer;
mod differ;
mod motion;

pub use buffer::FrameBuffer;
pub use differ::{difference_count, is_motion, PIXEL_VALUE_DIFFERENCE_THRESHOLD};
pub use motion::{DetectorState, MotionDetector, MotionEvent};
