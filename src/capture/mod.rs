mod integration;
mod metadata;
mod sink;
mod store;
mod upload;
#[cfg(test)]
mod tests;

pub use integration::{CaptureIntegration, CaptureIntegrationBuilder};
pub use metadata::{CaptureMetadata, CaptureStats, CaptureStatsSnapshot};
pub use sink::{CaptureOutcome, CaptureRecord, CaptureSink};
pub use store::{capture_file_name, CaptureStore};
pub use upload::UploadClient;
