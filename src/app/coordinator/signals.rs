//! Signal handling for graceful shutdown
//!
//! A [`ShutdownSignal`] is a broadcast trigger shared by the coordinator and
//! anything that wants to stop a run: the OS signal listener (Ctrl-C,
//! SIGTERM) or a caller holding a clone.

use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Broadcast shutdown trigger
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: broadcast::Sender<()>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Request shutdown of every subscriber
    pub fn trigger(&self) {
        // No subscribers means nothing is running yet
        let _ = self.tx.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown on Ctrl-C or SIGTERM
    ///
    /// Returns the listener task; abort it once the run is over.
    pub fn listen_for_os_signals(&self) -> JoinHandle<()> {
        let shutdown = self.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received Ctrl+C, finishing in-flight notices before shutdown");
                },
                _ = terminate => {
                    info!("Received terminate signal, finishing in-flight notices before shutdown");
                },
            }

            shutdown.trigger();
        })
    }
}
