//! SIGINT/SIGTERM handling.
//!
//! A signal cancels the running session. The session stops at the next
//! change boundary, so a partially written file is never left behind.

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shutdown coordinator
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token observed by the sync session
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel the session without waiting for a signal
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Cancel the token on the first SIGINT or SIGTERM.
    pub fn listen(&self) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                signal = wait_for_signal() => {
                    match signal {
                        Ok(name) => info!("Received {}, cancelling sync...", name),
                        Err(e) => {
                            warn!("Failed to install signal handler: {}", e);
                            return;
                        }
                    }
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        })
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result.map(|_| "SIGINT (Ctrl+C)"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.map(|_| "Ctrl+C")
    }
}
