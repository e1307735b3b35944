use crate::error::{Result, WatchcamError};
use crate::frame::Frame;

/// Per-byte change that counts as a differing pixel
pub const PIXEL_VALUE_DIFFERENCE_THRESHOLD: u8 = 32;

/// Count the byte positions whose absolute difference exceeds
/// [`PIXEL_VALUE_DIFFERENCE_THRESHOLD`].
///
/// Both frames must have the same byte length; a mismatch is reported as
/// [`WatchcamError::SizeMismatch`] rather than comparing a truncated prefix.
pub fn difference_count(a: &Frame, b: &Frame) -> Result<u64> {
    if a.len() != b.len() {
        return Err(WatchcamError::SizeMismatch {
            expected: b.len(),
            actual: a.len(),
        });
    }

    Ok(a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .filter(|(x, y)| x.abs_diff(**y) > PIXEL_VALUE_DIFFERENCE_THRESHOLD)
        .count() as u64)
}

/// Classify a difference count as motion.
///
/// The 1% unit is `total_bytes / 100` with floor division, so small frames
/// need proportionally fewer differing bytes.
pub fn is_motion(diff_count: u64, total_bytes: u64, percent_threshold: u64) -> bool {
    diff_count > (total_bytes / 100) * percent_threshold
}
