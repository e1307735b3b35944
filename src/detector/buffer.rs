use super::differ::difference_count;
use crate::error::Result;
use crate::frame::Frame;

/// Holds the single baseline frame new frames are compared against
#[derive(Debug, Default)]
pub struct FrameBuffer {
    previous: Option<Frame>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self { previous: None }
    }

    pub fn previous(&self) -> Option<&Frame> {
        self.previous.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_none()
    }

    /// Compare `frame` with the stored baseline, then make `frame` the new
    /// baseline.
    ///
    /// Returns `None` when there was no baseline yet. On a size mismatch the
    /// stored baseline is left untouched and `frame` is discarded.
    pub fn compare_and_replace(&mut self, frame: Frame) -> Result<Option<(Frame, u64)>> {
        let outcome = match self.previous.take() {
            None => None,
            Some(previous) => match difference_count(&frame, &previous) {
                Ok(diff_count) => Some((previous, diff_count)),
                Err(e) => {
                    self.previous = Some(previous);
                    return Err(e);
                }
            },
        };

        self.previous = Some(frame);
        Ok(outcome)
    }

    /// Forget the baseline
    pub fn clear(&mut self) {
        self.previous = None;
    }
}
