//! Job lifecycle: the single-job slot and the terminal report.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;
use uuid::Uuid;

use crate::aggregate::{count_outcomes, AggregateResult, OutcomeCounts};
use crate::cancel::{CancelObserver, CancelState, CancellationController};
use crate::error::{PipelineError, Result};
use crate::types::OutcomeRecord;

/// Owns the cancellation controller and admits at most one Job at a time.
#[derive(Debug, Clone, Default)]
pub struct JobRunner {
    cancel: CancellationController,
    slot: Arc<Mutex<()>>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancellation(&self) -> &CancellationController {
        &self.cancel
    }

    /// Arm cancellation for whatever Job is (or is about to be) running.
    pub fn request_cancel(&self) {
        self.cancel.request_cancel();
    }

    pub fn cancel_state(&self) -> CancelState {
        self.cancel.state()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.try_lock().is_err()
    }

    /// Claim the job slot and reset cancellation for the new Job.
    pub fn begin(&self) -> Result<ActiveJob> {
        let guard = self
            .slot
            .clone()
            .try_lock_owned()
            .map_err(|_| PipelineError::Busy)?;

        let job = ActiveJob {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            cancel: self.cancel.start_job(),
            _slot: guard,
        };
        info!(job_id = %job.id, "job started");
        Ok(job)
    }
}

/// The running Job. Dropping it frees the slot.
#[derive(Debug)]
pub struct ActiveJob {
    id: Uuid,
    started_at: DateTime<Utc>,
    cancel: CancelObserver,
    _slot: OwnedMutexGuard<()>,
}

impl ActiveJob {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn cancel(&self) -> &CancelObserver {
        &self.cancel
    }

    /// Build the terminal report from the Job's records.
    pub fn report<T>(
        &self,
        status: JobStatus,
        records: Vec<OutcomeRecord<T>>,
        aggregate: AggregateResult<T>,
    ) -> JobReport<T> {
        let counts = count_outcomes(&records);
        let report = JobReport {
            job_id: self.id,
            status,
            interactions: records.len(),
            counts,
            records,
            aggregate,
            started_at: self.started_at,
            finished_at: Utc::now(),
        };
        info!(
            job_id = %report.job_id,
            status = ?report.status,
            interactions = report.interactions,
            succeeded = counts.succeeded,
            skipped = counts.skipped,
            failed = counts.failed,
            "job finished"
        );
        report
    }
}

/// Terminal status of a Job that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Cancelled,
}

/// Everything a finished Job produced.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport<T> {
    pub job_id: Uuid,
    pub status: JobStatus,

    /// Targets actually interacted with.
    pub interactions: usize,
    pub counts: OutcomeCounts,
    pub records: Vec<OutcomeRecord<T>>,
    pub aggregate: AggregateResult<T>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<T> JobReport<T> {
    pub fn is_cancelled(&self) -> bool {
        self.status == JobStatus::Cancelled
    }
}
