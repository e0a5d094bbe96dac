//! Progress reporting and cancellation of a running read.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Receives progress and is polled for cancellation while rows are read.
///
/// Polling happens between rows, every `progress_interval` rows and at
/// source boundaries.
pub trait ReadMonitor {
    fn is_canceled(&self) -> bool;

    /// `fraction` is in `0.0..=1.0`.
    fn set_progress(&self, fraction: f64, message: &str);
}

/// A monitor that never cancels and ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl ReadMonitor for NoopMonitor {
    fn is_canceled(&self) -> bool {
        false
    }

    fn set_progress(&self, _fraction: f64, _message: &str) {}
}

/// A monitor canceled through a [`CancellationToken`].
///
/// The latest progress is kept and can be read from another thread.
#[derive(Debug, Default)]
pub struct CancellationMonitor {
    token: CancellationToken,
    progress: AtomicU64,
}

impl CancellationMonitor {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            progress: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The fraction last reported by the read.
    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }
}

impl ReadMonitor for CancellationMonitor {
    fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn set_progress(&self, fraction: f64, message: &str) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.progress.store(fraction.to_bits(), Ordering::Relaxed);
        debug!(progress = fraction, "{message}");
    }
}
