use anyhow::Result;
use signal_hook::consts::signal::*;
use signal_hook_tokio::Signals;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{info, warn};

/// Signal types that can be received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalType {
    /// SIGTERM or SIGINT
    Shutdown,
    /// SIGHUP: reload the configuration and re-render
    Rescan,
}

/// Maps process signals onto watch-loop actions
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
    signal_sender: mpsc::UnboundedSender<SignalType>,
}

impl SignalHandler {
    pub fn new(signal_sender: mpsc::UnboundedSender<SignalType>) -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            signal_sender,
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    /// Forward one received signal. Returns false once shutdown was requested.
    pub fn dispatch(&self, signal: i32) -> bool {
        match signal {
            SIGTERM | SIGINT => {
                info!(
                    "Received shutdown signal ({}), initiating graceful shutdown",
                    signal
                );
                self.shutdown_flag.store(true, Ordering::Relaxed);
                let _ = self.signal_sender.send(SignalType::Shutdown);
                false
            }
            SIGHUP => {
                info!("Received SIGHUP signal, reloading configuration and rescanning devices");
                if let Err(e) = self.signal_sender.send(SignalType::Rescan) {
                    warn!("Failed to send rescan signal: {}", e);
                }
                true
            }
            _ => {
                warn!("Received unexpected signal: {}", signal);
                true
            }
        }
    }

    /// Listen for SIGTERM, SIGINT and SIGHUP until shutdown
    pub async fn listen_for_signals(&self) -> Result<()> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP])?;

        info!("Signal handler initialized, listening for SIGTERM, SIGINT, SIGHUP");

        while let Some(signal) = signals.next().await {
            if !self.dispatch(signal) {
                break;
            }
        }

        Ok(())
    }
}
