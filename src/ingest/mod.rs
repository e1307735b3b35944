mod queue;
mod worker;

pub use queue::{FrameQueue, PushOutcome, QueueStats, QueueStatsSnapshot};
pub use worker::{FrameIngestWorker, IngestHandle, IngestStats, IngestStatsSnapshot};
