/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    SourceFinished,
    UserRequest,
}

/// Components whose lifecycle the application tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Source,
    Ingest,
    Capture,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Source => "source",
            Component::Ingest => "ingest",
            Component::Capture => "capture",
        }
    }
}
