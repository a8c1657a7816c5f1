//! Messaging pipeline: verify and deliver one message per recipient.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::context::{guarded, JobContext};
use crate::aggregate::Aggregator;
use crate::error::Result;
use crate::pacing::Pacer;
use crate::phone::digits_only;
use crate::traits::{Messenger, MessengerSession};
use crate::types::{ActiveJob, Delivery, JobReport, JobStatus, MessageBatch, Outcome, Target};

/// Tunables for a messaging Job.
#[derive(Debug, Clone, Default)]
pub struct MessagingSettings {
    /// Delay between recipients unless the batch overrides it.
    pub pacing: Pacer,
}

/// Recipients in request order; the resolved id is the digits-only number.
pub fn enumerate_recipients(numbers: &[String]) -> Vec<Target> {
    numbers
        .iter()
        .enumerate()
        .map(|(index, raw)| Target::new(index, raw.clone(), digits_only(raw)))
        .collect()
}

/// Delivers a [`MessageBatch`] through a [`Messenger`].
pub struct MessagingPipeline {
    messenger: Arc<dyn Messenger>,
    settings: MessagingSettings,
}

impl MessagingPipeline {
    pub fn new(messenger: Arc<dyn Messenger>, settings: MessagingSettings) -> Self {
        Self {
            messenger,
            settings,
        }
    }

    pub fn settings(&self) -> &MessagingSettings {
        &self.settings
    }

    /// Run one messaging Job. Cancellation yields a `Cancelled` report, not an error.
    pub async fn run(&self, job: &ActiveJob, batch: &MessageBatch) -> Result<JobReport<Delivery>> {
        let pacer = batch.interval.map(Pacer::new).unwrap_or(self.settings.pacing);
        let targets = enumerate_recipients(&batch.numbers);
        info!(job_id = %job.id(), recipients = targets.len(), "messaging job starting");

        let session = self.messenger.connect().await?;
        let mut ctx = JobContext::new(job, session);
        let driven = guarded(self.drive(&mut ctx, targets, &batch.message, pacer)).await;
        let (status, aggregator) = ctx.finish(driven).await?;

        let (records, aggregate) = aggregator.finalize();
        Ok(job.report(status, records, aggregate))
    }

    async fn drive(
        &self,
        ctx: &mut JobContext<'_, dyn MessengerSession>,
        targets: Vec<Target>,
        message: &str,
        pacer: Pacer,
    ) -> Result<(JobStatus, Aggregator<Delivery>)> {
        let job_id = ctx.job_id();
        let cancel = ctx.cancel().clone();
        let session = ctx.session_mut();
        let mut aggregator = Aggregator::new();

        let total = targets.len();
        for target in targets {
            if cancel.is_cancelled() {
                info!(job_id = %job_id, processed = aggregator.len(), "cancellation observed");
                return Ok((JobStatus::Cancelled, aggregator));
            }

            let outcome = deliver(session, &target, message).await;
            match &outcome {
                Outcome::Success(_) => debug!(job_id = %job_id, item = %target, "message sent"),
                Outcome::Skipped { reason } => {
                    info!(job_id = %job_id, item = %target, reason = %reason, "recipient skipped")
                }
                Outcome::Failed { reason } => {
                    warn!(job_id = %job_id, item = %target, reason = %reason, "recipient failed")
                }
            }
            aggregator.add(target, outcome);

            if aggregator.len() < total {
                pacer.pause(&cancel).await;
            }
        }

        Ok((JobStatus::Completed, aggregator))
    }
}

/// Verify one recipient and send. Never fails the Job.
async fn deliver(
    session: &mut dyn MessengerSession,
    target: &Target,
    message: &str,
) -> Outcome<Delivery> {
    if target.resolved.is_empty() {
        return Outcome::skipped("invalid number");
    }

    match session.is_registered(&target.resolved).await {
        Ok(true) => {}
        Ok(false) => return Outcome::skipped("not registered"),
        Err(e) => return Outcome::failed(format!("registration check failed: {}", e)),
    }

    match session.send_message(&target.resolved, message).await {
        Ok(()) => Outcome::Success(Delivery {
            phone: target.resolved.clone(),
        }),
        Err(e) => Outcome::failed(format!("send failed: {}", e)),
    }
}
