mod orchestrator;
mod runtime;
mod state;
mod types;


pub use orchestrator::WatchcamApp;
pub use runtime::ShutdownHandle;
pub use types::{Component, ComponentState, ShutdownReason};
