use super::{Component, ComponentState, ShutdownReason, WatchcamApp};
use crate::error::{Result, WatchcamError};
use crate::events::WatchcamEvent;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};

type SharedShutdownSender = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

/// Requests a graceful shutdown of a running [`WatchcamApp`].
///
/// Only the first request, from any handle or signal, is delivered.
#[derive(Clone)]
pub struct ShutdownHandle {
    sender: SharedShutdownSender,
}

impl ShutdownHandle {
    pub(super) fn new(sender: SharedShutdownSender) -> Self {
        Self { sender }
    }

    pub async fn request(&self, reason: ShutdownReason) -> Result<()> {
        let sender = self
            .sender
            .lock()
            .await
            .take()
            .ok_or_else(|| WatchcamError::system("Shutdown already requested"))?;

        sender
            .send(reason)
            .map_err(|_| WatchcamError::system("Shutdown receiver dropped"))
    }
}

impl WatchcamApp {
    /// Run until a signal, a shutdown request or the end of the frame source,
    /// then shut down
    pub async fn run(&mut self) -> Result<i32> {
        info!("Watchcam system is running");

        let mut shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| WatchcamError::system("Shutdown receiver already taken"))?;

        self.setup_signal_handlers();

        let shutdown_reason = match self.source_task.take() {
            Some(mut task) => {
                tokio::select! {
                    reason = &mut shutdown_receiver => {
                        self.source_task = Some(task);
                        reason.map_err(|_| {
                            WatchcamError::system("Shutdown channel closed unexpectedly")
                        })?
                    }
                    finished = &mut task => match finished {
                        Ok(Ok(frames)) => {
                            info!("Frame source finished after {} frames", frames);
                            self.set_component_state(Component::Source, ComponentState::Stopped)
                                .await;
                            ShutdownReason::SourceFinished
                        }
                        Ok(Err(e)) => {
                            error!("Frame source failed: {}", e);
                            self.set_component_state(Component::Source, ComponentState::Failed)
                                .await;
                            ShutdownReason::Error(e.to_string())
                        }
                        Err(e) => {
                            error!("Frame source task panicked: {}", e);
                            self.set_component_state(Component::Source, ComponentState::Failed)
                                .await;
                            ShutdownReason::Error(e.to_string())
                        }
                    },
                }
            }
            None => shutdown_receiver
                .await
                .map_err(|_| WatchcamError::system("Shutdown channel closed unexpectedly"))?,
        };

        info!("Shutdown initiated: {:?}", shutdown_reason);
        self.event_bus
            .publish_lossy(WatchcamEvent::ShutdownRequested {
                timestamp: SystemTime::now(),
                reason: format!("{:?}", shutdown_reason),
            });

        let exit_code = self.shutdown().await?;

        info!("Watchcam system shutdown complete");
        Ok(exit_code)
    }

    fn setup_signal_handlers(&self) {
        // SIGTERM from systemd
        #[cfg(unix)]
        {
            let shutdown = self.shutdown_handle();
            tokio::spawn(async move {
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            warn!("Failed to register SIGTERM handler: {}", e);
                            return;
                        }
                    };

                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    let _ = shutdown
                        .request(ShutdownReason::Signal("SIGTERM".to_string()))
                        .await;
                }
            });
        }

        let shutdown = self.shutdown_handle();
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                let _ = shutdown
                    .request(ShutdownReason::Signal("SIGINT".to_string()))
                    .await;
            }
        });
    }

    /// Request shutdown from inside the process
    pub async fn request_shutdown(&self, reason: ShutdownReason) -> Result<()> {
        self.shutdown_handle().request(reason).await
    }
}
