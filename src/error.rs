use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchcamError {
    #[error("Frame size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("No candidate preview sizes supplied")]
    NoCandidates,

    #[error("Invalid device rotation angle: {degrees}")]
    InvalidRotationAngle { degrees: u32 },

    #[error("Ingest queue is full")]
    QueueFull,

    #[error("Ingest lane is closed")]
    IngestClosed,

    #[error("Event publish failed: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upload error: {0}")]
    Upload(#[from] reqwest::Error),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl WatchcamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether the error only concerns a single frame and the lane can keep going
    pub fn is_frame_local(&self) -> bool {
        matches!(self, WatchcamError::SizeMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, WatchcamError>;
