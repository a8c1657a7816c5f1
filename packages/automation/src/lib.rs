//! Cancellable Sequential Automation Pipeline
//!
//! Drives an external agent (a browser, a messaging client) through an ordered
//! list of targets, one at a time, and aggregates per-target outcomes.
//!
//! # Guarantees
//!
//! - Exactly one agent session per Job, released exactly once on every exit path
//! - Targets are enumerated once, before any interaction
//! - Per-target failures are recorded and never abort the Job
//! - Cancellation is observed before each target and during waits and pacing
//! - At most one Job runs at a time (see [`JobRunner`])
//!
//! # Usage
//!
//! ```rust,ignore
//! use automation::{CsvExporter, JobRunner, ScrapePipeline, ScrapeQuery, ScrapeSettings};
//! use automation::testing::MockBrowser;
//!
//! let runner = JobRunner::new();
//! let pipeline = ScrapePipeline::new(
//!     Arc::new(MockBrowser::new().with_titled("Padaria Central")),
//!     Arc::new(CsvExporter::new("./exports")),
//!     ScrapeSettings::default(),
//! );
//!
//! let job = runner.begin()?;
//! let query = ScrapeQuery::new(Some("padaria".into()), Some("Sao Paulo".into()), Some("SP".into()))?;
//! let run = pipeline.run(&job, &query).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Agent capability interfaces (BrowserAgent, Messenger)
//! - [`types`] - Targets, outcomes, job parameters and the job lifecycle
//! - [`pipeline`] - The scraping and messaging pipelines
//! - [`cancel`] - Process-wide cooperative cancellation
//! - [`export`] - CSV export of the scraping aggregate
//! - [`testing`] - Mock agents for testing

#[cfg(feature = "chromium")]
pub mod agents;
pub mod aggregate;
pub mod cancel;
pub mod error;
pub mod export;
pub mod pacing;
pub mod phone;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use aggregate::{AggregateResult, Aggregator, OutcomeCounts};
pub use cancel::{CancelObserver, CancelState, CancellationController};
pub use error::{AgentError, AgentResult, ExportError, PipelineError, Result};
pub use export::{CsvExporter, ExportHandle, ExportSink, EXPORT_COLUMNS};
pub use pacing::Pacer;
pub use phone::{digits_only, normalize_phone, DEFAULT_COUNTRY_CODE};
pub use pipeline::{
    MessagingPipeline, MessagingSettings, ScrapePipeline, ScrapeRun, ScrapeSettings,
};
pub use traits::{
    AgentSession, BrowserAgent, DetailFields, Messenger, MessengerSession, Probe, SearchSession,
};
pub use types::{
    ActiveJob, Delivery, JobReport, JobRunner, JobStatus, Keyed, Listing, MessageBatch, Outcome,
    OutcomeRecord, ScrapeQuery, Target,
};

#[cfg(feature = "chromium")]
pub use agents::{ChromiumBrowser, ChromiumConfig};
