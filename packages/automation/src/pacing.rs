//! Fixed-delay pacing between target interactions.

use std::time::Duration;

use tracing::debug;

use crate::cancel::CancelObserver;

/// Waits a fixed duration after each interaction.
///
/// The delay is a suspension point: it ends early when cancellation is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for the configured delay. Returns `false` if cancelled while waiting.
    pub async fn pause(&self, cancel: &CancelObserver) -> bool {
        if self.delay.is_zero() {
            return !cancel.is_cancelled();
        }

        debug!(delay_ms = self.delay.as_millis() as u64, "pacing");
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => true,
            _ = cancel.cancelled() => false,
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
