//! Per-Job context owning the agent session.

use std::future::Future;
use std::panic::{resume_unwind, AssertUnwindSafe};

use futures::FutureExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cancel::CancelObserver;
use crate::error::Result;
use crate::traits::AgentSession;
use crate::types::ActiveJob;

/// Outcome of a Job body driven under [`guarded`]: its result, or
/// the payload of a panic.
pub type Guarded<T> = std::thread::Result<Result<T>>;

/// Run a Job body, capturing panics so the session can still be released.
pub async fn guarded<T, F>(body: F) -> Guarded<T>
where
    F: Future<Output = Result<T>>,
{
    AssertUnwindSafe(body).catch_unwind().await
}

/// Everything a running Job needs: its identity, its cancellation observer,
/// and the one agent session it acquired.
///
/// Release happens exactly once, in [`JobContext::finish`], which consumes the
/// context. Pipelines drive their body with [`guarded`] so a panic
/// still reaches `finish`.
pub struct JobContext<'j, S: AgentSession + ?Sized> {
    job: &'j ActiveJob,
    session: Box<S>,
}

impl<'j, S: AgentSession + ?Sized> JobContext<'j, S> {
    pub fn new(job: &'j ActiveJob, session: Box<S>) -> Self {
        Self { job, session }
    }

    pub fn job_id(&self) -> Uuid {
        self.job.id()
    }

    pub fn cancel(&self) -> &CancelObserver {
        self.job.cancel()
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Release the session, then hand back the body's result. A captured
    /// panic is re-raised after release.
    pub async fn finish<T>(mut self, driven: Guarded<T>) -> Result<T> {
        let job_id = self.job.id();
        match self.session.release().await {
            Ok(()) => debug!(job_id = %job_id, "agent session released"),
            Err(e) => warn!(job_id = %job_id, error = %e, "failed to release agent session"),
        }

        match driven {
            Ok(result) => result,
            Err(panic) => resume_unwind(panic),
        }
    }
}
