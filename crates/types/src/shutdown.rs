//! Cooperative shutdown flag
//!
//! A cloneable token set by termination signals and consulted by every
//! long-running loop. Loops check the flag before starting a new unit
//! of work and during multi-second sleeps in one-second increments, so
//! shutdown latency stays around a second regardless of the configured
//! sleep duration. In-flight work is always allowed to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

const CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Shared shutdown token. Cloning yields a handle to the same flag, so
/// several pipeline instances can be driven by one signal handler or
/// each given their own flag in tests.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    triggered: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark shutdown as requested. Never blocks.
    pub fn trigger(&self) {
        info!("shutdown signal received; will exit after current unit of work");
        self.triggered.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Spawn a task that triggers this flag on SIGINT or SIGTERM.
    pub fn install_signal_handlers(&self) {
        let flag = self.clone();
        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(mut term) => {
                        tokio::select! {
                            _ = tokio::signal::ctrl_c() => {}
                            _ = term.recv() => {}
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to install SIGTERM handler");
                        let _ = tokio::signal::ctrl_c().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
            flag.trigger();
        });
    }

    /// Sleep for `total`, waking early if the flag is triggered. The
    /// flag is checked at least once per second.
    pub async fn sleep_interruptible(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while !self.is_triggered() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(remaining.min(CHECK_INTERVAL)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_sets_the_flag() {
        let flag = ShutdownFlag::new();
        assert!(!flag.is_triggered());
        flag.trigger();
        assert!(flag.is_triggered());
    }

    #[test]
    fn clones_share_state() {
        let flag = ShutdownFlag::new();
        let other = flag.clone();
        other.trigger();
        assert!(flag.is_triggered());
    }

    #[tokio::test]
    async fn sleep_returns_promptly_after_trigger() {
        let flag = ShutdownFlag::new();
        let setter = flag.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            setter.trigger();
        });

        let start = std::time::Instant::now();
        flag.sleep_interruptible(Duration::from_secs(60)).await;
        // One check interval plus scheduling slack, nowhere near 60s.
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn sleep_elapses_normally_without_trigger() {
        let flag = ShutdownFlag::new();
        let start = std::time::Instant::now();
        flag.sleep_interruptible(Duration::from_millis(50)).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
