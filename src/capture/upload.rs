use super::sink::{CaptureOutcome, CaptureRecord, CaptureSink};
use crate::config::UploadConfig;
use crate::error::Result;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sends motion frames to the remote upload service as a multipart PUT with
/// a single `photo` part. Failures are reported once and not retried.
pub struct UploadClient {
    client: reqwest::Client,
    url: String,
}

impl UploadClient {
    pub fn new(config: &UploadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            url: join_url(&config.endpoint, &config.route),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn join_url(endpoint: &str, route: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

#[async_trait]
impl CaptureSink for UploadClient {
    async fn handle(&self, record: &CaptureRecord) -> Result<CaptureOutcome> {
        let part = Part::bytes(record.bytes().to_vec())
            .file_name(record.file_name.clone())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("photo", part);

        debug!("Uploading {} to {}", record.file_name, self.url);
        let response = self.client.put(&self.url).multipart(form).send().await?;
        let status = response.status();

        if status.is_success() {
            info!("upload: {}", status.as_u16());
        } else {
            warn!("Upload of {} returned {}", record.file_name, status);
        }

        Ok(CaptureOutcome::Uploaded {
            status: status.as_u16(),
        })
    }

    fn name(&self) -> &str {
        "upload_client"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://example.com/", "/upload/photo"),
            "http://example.com/upload/photo"
        );
        assert_eq!(
            join_url("http://example.com", "upload/photo"),
            "http://example.com/upload/photo"
        );
    }
}
