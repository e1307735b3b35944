use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchcamConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub ingest: IngestConfig,
    pub capture: CaptureConfig,
    pub upload: UploadConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Camera device index
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Frame resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second delivered by the source
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Raw NV21 file to replay as the frame source
    #[serde(default)]
    pub replay_path: Option<String>,

    /// Restart the replay file when it runs out of frames
    #[serde(default = "default_replay_loop")]
    pub replay_loop: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DetectorConfig {
    /// Percentage of differing bytes required to count as motion
    #[serde(default = "default_percent_threshold")]
    pub percent_threshold: u64,

    /// Minimum time between two motion events in milliseconds
    #[serde(default = "default_min_trigger_interval_ms")]
    pub min_trigger_interval_ms: u64,
}

impl DetectorConfig {
    pub fn min_trigger_interval(&self) -> Duration {
        Duration::from_millis(self.min_trigger_interval_ms)
    }
}

/// What happens to a frame that arrives while the ingest queue is full
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Never drop; the queue grows without limit
    Unbounded,
    /// Reject the incoming frame
    Bounded,
    /// Evict the oldest queued frame so the newest is always kept
    DropOldest,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_queue_policy")]
    pub queue_policy: QueuePolicy,

    /// Queue capacity, ignored for the unbounded policy
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// Store motion frames on disk
    #[serde(default = "default_capture_enabled")]
    pub enabled: bool,

    /// Base path for storing captures
    #[serde(default = "default_capture_path")]
    pub path: String,

    /// Save a JSON metadata file next to each capture
    #[serde(default = "default_save_metadata")]
    pub save_metadata: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadConfig {
    /// Upload motion frames to the remote endpoint
    #[serde(default = "default_upload_enabled")]
    pub enabled: bool,

    /// Base URL of the upload service
    #[serde(default = "default_upload_endpoint")]
    pub endpoint: String,

    /// Route the photo is PUT to
    #[serde(default = "default_upload_route")]
    pub route: String,

    /// Request timeout in seconds
    #[serde(default = "default_upload_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl WatchcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("watchcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("camera.replay_loop", default_replay_loop())?
            .set_default("detector.percent_threshold", default_percent_threshold())?
            .set_default(
                "detector.min_trigger_interval_ms",
                default_min_trigger_interval_ms(),
            )?
            .set_default("ingest.queue_policy", "drop_oldest")?
            .set_default("ingest.queue_capacity", default_queue_capacity() as i64)?
            .set_default("capture.enabled", default_capture_enabled())?
            .set_default("capture.path", default_capture_path())?
            .set_default("capture.save_metadata", default_save_metadata())?
            .set_default("upload.enabled", default_upload_enabled())?
            .set_default("upload.endpoint", default_upload_endpoint())?
            .set_default("upload.route", default_upload_route())?
            .set_default("upload.timeout_seconds", default_upload_timeout())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("WATCHCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: WatchcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.detector.percent_threshold > 100 {
            return Err(ConfigError::Message(
                "Detector percent_threshold must be at most 100".to_string(),
            ));
        }

        if self.ingest.queue_policy != QueuePolicy::Unbounded && self.ingest.queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Ingest queue capacity must be greater than 0".to_string(),
            ));
        }

        if self.capture.enabled && self.capture.path.is_empty() {
            return Err(ConfigError::Message(
                "Capture path cannot be empty".to_string(),
            ));
        }

        if self.upload.enabled && self.upload.endpoint.is_empty() {
            return Err(ConfigError::Message(
                "Upload endpoint cannot be empty".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for WatchcamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                index: default_camera_index(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                replay_path: None,
                replay_loop: default_replay_loop(),
            },
            detector: DetectorConfig::default(),
            ingest: IngestConfig {
                queue_policy: default_queue_policy(),
                queue_capacity: default_queue_capacity(),
            },
            capture: CaptureConfig {
                enabled: default_capture_enabled(),
                path: default_capture_path(),
                save_metadata: default_save_metadata(),
            },
            upload: UploadConfig {
                enabled: default_upload_enabled(),
                endpoint: default_upload_endpoint(),
                route: default_upload_route(),
                timeout_seconds: default_upload_timeout(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            percent_threshold: default_percent_threshold(),
            min_trigger_interval_ms: default_min_trigger_interval_ms(),
        }
    }
}

// Default value functions
fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_camera_fps() -> u32 {
    15
}
fn default_replay_loop() -> bool {
    false
}

fn default_percent_threshold() -> u64 {
    10
}
fn default_min_trigger_interval_ms() -> u64 {
    2000
}

fn default_queue_policy() -> QueuePolicy {
    QueuePolicy::DropOldest
}
fn default_queue_capacity() -> usize {
    4
}

fn default_capture_enabled() -> bool {
    true
}
fn default_capture_path() -> String {
    "./captures".to_string()
}
fn default_save_metadata() -> bool {
    false
}

fn default_upload_enabled() -> bool {
    false
}
fn default_upload_endpoint() -> String {
    "http://localhost:8080".to_string()
}
fn default_upload_route() -> String {
    "/upload/photo".to_string()
}
fn default_upload_timeout() -> u64 {
    30
}

fn default_event_bus_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = WatchcamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.percent_threshold, 10);
        assert_eq!(
            config.detector.min_trigger_interval(),
            Duration::from_millis(2000)
        );
        assert_eq!(config.ingest.queue_policy, QueuePolicy::DropOldest);
        assert_eq!(config.upload.route, "/upload/photo");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[camera]
resolution = [320, 240]

[detector]
percent_threshold = 20

[ingest]
queue_policy = "bounded"
queue_capacity = 8
"#
        )
        .unwrap();

        let config = WatchcamConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.camera.resolution, (320, 240));
        assert_eq!(config.camera.fps, 15);
        assert_eq!(config.detector.percent_threshold, 20);
        assert_eq!(config.detector.min_trigger_interval_ms, 2000);
        assert_eq!(config.ingest.queue_policy, QueuePolicy::Bounded);
        assert_eq!(config.ingest.queue_capacity, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = WatchcamConfig::load_from_file("/nonexistent/watchcam.toml").unwrap();
        assert_eq!(config.camera.resolution, (640, 480));
        assert_eq!(config.capture.path, "./captures");
    }

    #[test]
    fn test_config_validation() {
        let mut config = WatchcamConfig::default();
        config.camera.resolution = (0, 0);
        assert!(config.validate().is_err());

        config.camera.resolution = (640, 480);
        config.ingest.queue_policy = QueuePolicy::Bounded;
        config.ingest.queue_capacity = 0;
        assert!(config.validate().is_err());

        config.ingest.queue_policy = QueuePolicy::Unbounded;
        assert!(config.validate().is_ok());

        config.detector.percent_threshold = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = WatchcamConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: WatchcamConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.ingest.queue_policy, config.ingest.queue_policy);
        assert_eq!(parsed.upload.endpoint, config.upload.endpoint);
    }
}
