use crate::error::{Result, WatchcamError};
use serde::{Deserialize, Serialize};

/// Maximum difference between a candidate's aspect ratio and the target ratio
pub const ASPECT_TOLERANCE: f64 = 0.1;

/// A capture resolution supported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Pick the preview size closest in height to the target.
///
/// The target ratio is `height / width` while each candidate's ratio is
/// `width / height`; candidates within [`ASPECT_TOLERANCE`] of the target are
/// searched first. When none qualify every candidate is considered. Ties go
/// to the earliest candidate.
pub fn select(candidates: &[Size], target_width: u32, target_height: u32) -> Result<Size> {
    if candidates.is_empty() {
        return Err(WatchcamError::NoCandidates);
    }

    let target_ratio = target_height as f64 / target_width as f64;

    let aspect_matched = closest_height(
        candidates.iter().filter(|size| {
            let ratio = size.width as f64 / size.height as f64;
            (ratio - target_ratio).abs() <= ASPECT_TOLERANCE
        }),
        target_height,
    );

    match aspect_matched {
        Some(size) => Ok(size),
        None => closest_height(candidates.iter(), target_height).ok_or(WatchcamError::NoCandidates),
    }
}

fn closest_height<'a>(sizes: impl Iterator<Item = &'a Size>, target_height: u32) -> Option<Size> {
    let mut best: Option<(Size, u32)> = None;
    for size in sizes {
        let diff = size.height.abs_diff(target_height);
        if best.map_or(true, |(_, min_diff)| diff < min_diff) {
            best = Some((*size, diff));
        }
    }
    best.map(|(size, _)| size)
}
