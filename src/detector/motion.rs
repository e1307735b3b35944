use super::buffer::FrameBuffer;
use super::differ::is_motion;
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::frame::Frame;

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Motion detected between two consecutive frames
#[derive(Debug, Clone)]
pub struct MotionEvent {
    /// The baseline frame the motion was detected relative to, i.e. the frame
    /// immediately before the one that confirmed the motion
    pub frame: Frame,
    pub detected_at: SystemTime,
}

/// Trigger state, evaluated lazily against a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// The next qualifying motion fires an event
    Armed,
    /// An event fired within the debounce window
    Cooldown,
}

/// Frame-to-frame motion detector with a debounce window
pub struct MotionDetector {
    config: DetectorConfig,
    buffer: FrameBuffer,
    last_trigger_time: SystemTime,
    frames_processed: u64,
    events_emitted: u64,
}

impl MotionDetector {
    /// Create a new detector with the given configuration
    pub fn new(config: DetectorConfig) -> Self {
        info!(
            "Initializing motion detector: {}% threshold, {}ms trigger interval",
            config.percent_threshold, config.min_trigger_interval_ms
        );

        Self {
            config,
            buffer: FrameBuffer::new(),
            last_trigger_time: UNIX_EPOCH,
            frames_processed: 0,
            events_emitted: 0,
        }
    }

    /// Feed one frame through the detector.
    ///
    /// The first frame only establishes the baseline. Every later frame is
    /// compared against the frame before it and then replaces it as the
    /// baseline, whether or not an event fires. A frame whose length differs
    /// from the baseline is rejected and leaves the detector unchanged.
    pub fn process(&mut self, new_frame: Frame, now: SystemTime) -> Result<Option<MotionEvent>> {
        let frame_id = new_frame.id;
        let total_bytes = new_frame.len() as u64;

        let compared = self.buffer.compare_and_replace(new_frame)?;
        self.frames_processed += 1;

        let Some((previous, diff_count)) = compared else {
            debug!("Frame {} established the motion baseline", frame_id);
            return Ok(None);
        };

        if !is_motion(diff_count, total_bytes, self.config.percent_threshold) {
            debug!(
                "No motion in frame {} ({} of {} bytes differ)",
                frame_id, diff_count, total_bytes
            );
            return Ok(None);
        }

        if self.elapsed_since_trigger(now) <= self.config.min_trigger_interval() {
            debug!(
                "Motion in frame {} suppressed by trigger interval ({} bytes differ)",
                frame_id, diff_count
            );
            return Ok(None);
        }

        self.last_trigger_time = now;
        self.events_emitted += 1;
        info!(
            "Motion detected in frame {}: {} of {} bytes differ",
            frame_id, diff_count, total_bytes
        );

        Ok(Some(MotionEvent {
            frame: previous,
            detected_at: now,
        }))
    }

    /// Trigger state as of `now`
    pub fn state(&self, now: SystemTime) -> DetectorState {
        if self.events_emitted > 0
            && self.elapsed_since_trigger(now) <= self.config.min_trigger_interval()
        {
            DetectorState::Cooldown
        } else {
            DetectorState::Armed
        }
    }

    // A clock that moved backwards counts as no time elapsed.
    fn elapsed_since_trigger(&self, now: SystemTime) -> Duration {
        now.duration_since(self.last_trigger_time)
            .unwrap_or(Duration::ZERO)
    }

    /// Drop the baseline so the next frame starts a fresh comparison.
    /// The trigger time is kept.
    pub fn reset(&mut self) {
        debug!("Resetting motion detector baseline");
        self.buffer.clear();
    }

    pub fn has_baseline(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Dimensions of the current baseline frame
    pub fn baseline_dimensions(&self) -> Option<(u32, u32)> {
        self.buffer
            .previous()
            .map(|frame| (frame.width, frame.height))
    }

    pub fn last_trigger_time(&self) -> SystemTime {
        self.last_trigger_time
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted
    }

    /// Get current configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}
