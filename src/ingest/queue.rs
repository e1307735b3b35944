use crate::config::QueuePolicy;
use crate::error::{Result, WatchcamError};
use crate::frame::Frame;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::{debug, trace};

/// Result of a successful push
#[derive(Debug)]
pub enum PushOutcome {
    Queued,
    /// Queued after evicting the oldest frame
    Evicted(Frame),
}

/// Statistics for queue monitoring
#[derive(Debug, Default)]
pub struct QueueStats {
    pub frames_pushed: AtomicU64,
    pub frames_popped: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub high_water_mark: AtomicUsize,
}

impl QueueStats {
    pub fn snapshot(&self) -> QueueStatsSnapshot {
        QueueStatsSnapshot {
            frames_pushed: self.frames_pushed.load(Ordering::Relaxed),
            frames_popped: self.frames_popped.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            high_water_mark: self.high_water_mark.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatsSnapshot {
    pub frames_pushed: u64,
    pub frames_popped: u64,
    pub frames_dropped: u64,
    pub high_water_mark: usize,
}

struct QueueState {
    frames: VecDeque<Frame>,
    closed: bool,
}

/// Multi-producer, single-consumer frame queue with a configurable full policy
pub struct FrameQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    policy: QueuePolicy,
    capacity: usize,
    stats: QueueStats,
}

impl FrameQueue {
    /// Create a queue; `capacity` is ignored for [`QueuePolicy::Unbounded`]
    pub fn new(policy: QueuePolicy, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        debug!(
            "Created frame queue with policy {:?} and capacity {}",
            policy, capacity
        );

        let initial = match policy {
            QueuePolicy::Unbounded => 0,
            _ => capacity,
        };

        Self {
            state: Mutex::new(QueueState {
                frames: VecDeque::with_capacity(initial),
                closed: false,
            }),
            notify: Notify::new(),
            policy,
            capacity,
            stats: QueueStats::default(),
        }
    }

    /// Enqueue a frame without blocking.
    ///
    /// Fails with `IngestClosed` after [`close`](Self::close), and with
    /// `QueueFull` when the bounded policy is at capacity.
    pub fn push(&self, frame: Frame) -> Result<PushOutcome> {
        let (outcome, len) = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(WatchcamError::IngestClosed);
            }

            let full = self.policy != QueuePolicy::Unbounded && state.frames.len() >= self.capacity;
            let outcome = match (self.policy, full) {
                (QueuePolicy::Bounded, true) => {
                    self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                    return Err(WatchcamError::QueueFull);
                }
                (QueuePolicy::DropOldest, true) => match state.frames.pop_front() {
                    Some(evicted) => {
                        self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                        PushOutcome::Evicted(evicted)
                    }
                    None => PushOutcome::Queued,
                },
                _ => PushOutcome::Queued,
            };

            trace!("Queueing frame {}", frame.id);
            state.frames.push_back(frame);
            (outcome, state.frames.len())
        };

        self.stats.frames_pushed.fetch_add(1, Ordering::Relaxed);
        self.stats.high_water_mark.fetch_max(len, Ordering::Relaxed);
        self.notify.notify_one();
        Ok(outcome)
    }

    /// Wait for the next frame. Returns `None` once the queue is closed.
    pub async fn pop(&self) -> Option<Frame> {
        loop {
            {
                let mut state = self.state.lock();
                if state.closed {
                    return None;
                }
                if let Some(frame) = state.frames.pop_front() {
                    self.stats.frames_popped.fetch_add(1, Ordering::Relaxed);
                    return Some(frame);
                }
            }
            self.notify.notified().await;
        }
    }

    /// Stop accepting frames and discard what is still queued.
    ///
    /// Returns the discarded frames. A frame already handed out by
    /// [`pop`](Self::pop) is unaffected.
    pub fn close(&self) -> Vec<Frame> {
        let discarded: Vec<Frame> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.frames.drain(..).collect()
        };

        self.stats
            .frames_dropped
            .fetch_add(discarded.len() as u64, Ordering::Relaxed);
        self.notify.notify_one();
        debug!("Frame queue closed, {} frames discarded", discarded.len());
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    pub fn capacity(&self) -> Option<usize> {
        match self.policy {
            QueuePolicy::Unbounded => None,
            _ => Some(self.capacity),
        }
    }

    pub fn stats(&self) -> QueueStatsSnapshot {
        self.stats.snapshot()
    }
}
