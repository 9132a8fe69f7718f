//! Tokio runtime configuration and shutdown signal handling for the binary

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Worker threads used unless told otherwise
///
/// The dashboard spends its time waiting on the API server, so a couple of
/// workers are plenty.
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    worker_threads: usize,
}

impl RuntimeConfig {
    /// `0` means one worker per available CPU
    #[must_use]
    pub fn new(worker_threads: usize) -> Self {
        let worker_threads = if worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        } else {
            worker_threads
        };
        Self { worker_threads }
    }

    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    #[must_use]
    pub const fn is_single_threaded(&self) -> bool {
        self.worker_threads == 1
    }

    /// Build the tokio runtime
    ///
    /// # Errors
    /// Returns error if runtime creation fails
    pub fn build_runtime(self) -> Result<tokio::runtime::Runtime> {
        let rt = if self.is_single_threaded() {
            info!("Starting with single-threaded runtime");
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
        } else {
            info!(workers = self.worker_threads, "Starting multi-threaded runtime");
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(self.worker_threads)
                .thread_name("kmet-worker")
                .enable_all()
                .build()?
        };
        Ok(rt)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_THREADS)
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
///
/// Raw mode swallows Ctrl+C as a key press, so in practice this fires on
/// SIGTERM or when the terminal is not in raw mode yet.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Spawn a task that reports the first shutdown signal on the returned channel
#[must_use]
pub fn spawn_shutdown_handler() -> mpsc::Receiver<()> {
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(()).await;
    });
    shutdown_rx
}
