//! Process-wide cooperative cancellation.
//!
//! The HTTP boundary arms the controller; the running Job observes it at its
//! suspension points. Each Job gets a fresh token from [`CancellationController::start_job`],
//! so a cancel aimed at a previous Job never leaks into the next one.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelState {
    Idle,
    Armed,
}

/// Single-writer, multi-reader cancellation flag shared across requests.
#[derive(Debug, Clone, Default)]
pub struct CancellationController {
    current: Arc<Mutex<CancellationToken>>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    fn token(&self) -> MutexGuard<'_, CancellationToken> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Arm the controller. Idempotent, valid with or without an active Job.
    pub fn request_cancel(&self) {
        self.token().cancel();
    }

    /// Reset to `Idle` and hand out the observer for the Job that is starting.
    pub fn start_job(&self) -> CancelObserver {
        let fresh = CancellationToken::new();
        *self.token() = fresh.clone();
        CancelObserver { token: fresh }
    }

    pub fn state(&self) -> CancelState {
        if self.token().is_cancelled() {
            CancelState::Armed
        } else {
            CancelState::Idle
        }
    }
}

/// Read-only view of the cancellation state for one Job.
#[derive(Debug, Clone, Default)]
pub struct CancelObserver {
    token: CancellationToken,
}

impl CancelObserver {
    /// An observer that is never armed.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
