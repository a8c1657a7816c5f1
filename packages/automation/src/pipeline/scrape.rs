//! Scraping pipeline: search → enumerate results → inspect each → export.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::context::{guarded, JobContext};
use crate::aggregate::Aggregator;
use crate::cancel::CancelObserver;
use crate::error::{AgentResult, PipelineError, Result};
use crate::export::{ExportHandle, ExportSink};
use crate::pacing::Pacer;
use crate::phone::{normalize_phone, DEFAULT_COUNTRY_CODE};
use crate::traits::{BrowserAgent, DetailFields, Probe, SearchSession};
use crate::types::{ActiveJob, JobReport, JobStatus, Listing, Outcome, ScrapeQuery, Target};

/// Tunables for a scraping Job.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    /// Bounded wait for the results container to appear.
    pub results_timeout: Duration,

    /// Bounded wait for each detail view.
    pub detail_timeout: Duration,

    /// How often bounded waits re-probe the page.
    pub poll_interval: Duration,

    pub pacing: Pacer,

    /// Prefix added to phone numbers that lack it.
    pub country_code: String,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            results_timeout: Duration::from_secs(150),
            detail_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(250),
            pacing: Pacer::new(Duration::from_secs(5)),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

/// Terminal result of a scraping Job that did not fail.
#[derive(Debug)]
pub enum ScrapeRun {
    Exported {
        report: JobReport<Listing>,
        export: ExportHandle,
    },
    Cancelled {
        report: JobReport<Listing>,
    },
}

impl ScrapeRun {
    pub fn report(&self) -> &JobReport<Listing> {
        match self {
            ScrapeRun::Exported { report, .. } | ScrapeRun::Cancelled { report } => report,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Ready,
    TimedOut,
    Cancelled,
}

/// Poll `probe` until it holds, the timeout elapses, or (when an observer is
/// given) cancellation is armed.
async fn wait_for(
    session: &mut dyn SearchSession,
    probe: Probe,
    timeout: Duration,
    poll: Duration,
    cancel: Option<&CancelObserver>,
) -> AgentResult<Wait> {
    let deadline = Instant::now() + timeout;

    loop {
        if session.probe(probe).await? {
            return Ok(Wait::Ready);
        }
        if cancel.is_some_and(|c| c.is_cancelled()) {
            return Ok(Wait::Cancelled);
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(Wait::TimedOut);
        }
        let nap = poll.min(deadline - now);

        match cancel {
            Some(cancel) => {
                tokio::select! {
                    _ = tokio::time::sleep(nap) => {}
                    _ = cancel.cancelled() => return Ok(Wait::Cancelled),
                }
            }
            None => tokio::time::sleep(nap).await,
        }
    }
}

/// Turn raw detail fields into an outcome. Only the title is required.
pub fn build_listing(fields: DetailFields, country_code: &str) -> Outcome<Listing> {
    let title = fields
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let Some(title) = title else {
        return Outcome::skipped("missing title");
    };

    Outcome::Success(Listing {
        title,
        phone: fields
            .phone
            .and_then(|p| normalize_phone(&p, country_code)),
        website: fields
            .website
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty()),
    })
}

/// Drives a [`BrowserAgent`] through one search and exports what it finds.
pub struct ScrapePipeline {
    browser: Arc<dyn BrowserAgent>,
    exporter: Arc<dyn ExportSink>,
    settings: ScrapeSettings,
}

impl ScrapePipeline {
    pub fn new(
        browser: Arc<dyn BrowserAgent>,
        exporter: Arc<dyn ExportSink>,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            browser,
            exporter,
            settings,
        }
    }

    pub fn settings(&self) -> &ScrapeSettings {
        &self.settings
    }

    /// Run one scraping Job end to end.
    ///
    /// The browser session is released before the export is written.
    pub async fn run(&self, job: &ActiveJob, query: &ScrapeQuery) -> Result<ScrapeRun> {
        info!(job_id = %job.id(), search = %query.search_text(), "scrape job starting");

        let session = self.browser.open().await?;
        let mut ctx = JobContext::new(job, session);
        let driven = guarded(self.drive(&mut ctx, query)).await;
        let (status, aggregator) = ctx.finish(driven).await?;

        let (records, aggregate) = aggregator.finalize();
        let report = job.report(status, records, aggregate);

        if report.is_cancelled() {
            return Ok(ScrapeRun::Cancelled { report });
        }

        let export = self
            .exporter
            .export(&query.export_name(), &report.aggregate)
            .await?;

        Ok(ScrapeRun::Exported { report, export })
    }

    async fn drive(
        &self,
        ctx: &mut JobContext<'_, dyn SearchSession>,
        query: &ScrapeQuery,
    ) -> Result<(JobStatus, Aggregator<Listing>)> {
        let job_id = ctx.job_id();
        let cancel = ctx.cancel().clone();
        let session = ctx.session_mut();
        let mut aggregator = Aggregator::new();

        session
            .search(query)
            .await
            .map_err(|e| PipelineError::discovery(format!("search failed: {}", e)))?;

        let waited = wait_for(
            session,
            Probe::ResultsFeed,
            self.settings.results_timeout,
            self.settings.poll_interval,
            Some(&cancel),
        )
        .await
        .map_err(|e| PipelineError::discovery(e.to_string()))?;

        match waited {
            Wait::Ready => {}
            Wait::Cancelled => {
                info!(job_id = %job_id, "cancelled during discovery");
                return Ok((JobStatus::Cancelled, aggregator));
            }
            Wait::TimedOut => {
                return Err(PipelineError::discovery(format!(
                    "{} not visible after {:?}",
                    Probe::ResultsFeed,
                    self.settings.results_timeout
                )));
            }
        }

        let targets = enumerate_results(session).await?;
        info!(job_id = %job_id, count = targets.len(), "results discovered");

        let total = targets.len();
        for target in targets {
            if cancel.is_cancelled() {
                info!(job_id = %job_id, processed = aggregator.len(), "cancellation observed");
                return Ok((JobStatus::Cancelled, aggregator));
            }

            let outcome = self.interact(session, &target).await;
            match &outcome {
                Outcome::Success(listing) => {
                    debug!(job_id = %job_id, item = %target, title = %listing.title, "listing captured")
                }
                Outcome::Skipped { reason } => {
                    debug!(job_id = %job_id, item = %target, reason = %reason, "target skipped")
                }
                Outcome::Failed { reason } => {
                    warn!(job_id = %job_id, item = %target, reason = %reason, "target failed")
                }
            }
            aggregator.add(target, outcome);

            if aggregator.len() < total {
                self.settings.pacing.pause(&cancel).await;
            }
        }

        Ok((JobStatus::Completed, aggregator))
    }

    /// Select one result and read its detail view. Never fails the Job.
    async fn interact(&self, session: &mut dyn SearchSession, target: &Target) -> Outcome<Listing> {
        if let Err(e) = session.select_target(target).await {
            return Outcome::failed(format!("select failed: {}", e));
        }

        match wait_for(
            session,
            Probe::DetailView,
            self.settings.detail_timeout,
            self.settings.poll_interval,
            None,
        )
        .await
        {
            Ok(Wait::Ready) => {}
            Ok(_) => debug!(item = %target, "detail view not visible, reading what is present"),
            Err(e) => debug!(item = %target, error = %e, "detail probe failed"),
        }

        match session.extract_fields().await {
            Ok(fields) => build_listing(fields, &self.settings.country_code),
            Err(e) => Outcome::failed(format!("extract failed: {}", e)),
        }
    }
}

/// Read the full result list once, before any interaction.
async fn enumerate_results(session: &mut dyn SearchSession) -> Result<Vec<Target>> {
    let raw = session
        .locate_targets()
        .await
        .map_err(|e| PipelineError::discovery(format!("could not read results: {}", e)))?;

    Ok(Target::enumerate(raw))
}
