//! Sequential, cancellable pipelines.
//!
//! Both variants follow the same shape: acquire one agent session, enumerate
//! every target up front, interact with each in order (checking cancellation
//! before each one and pacing between them), release the session, then
//! finalize the aggregate.

pub mod context;
pub mod messaging;
pub mod scrape;

pub use context::{guarded, Guarded, JobContext};
pub use messaging::{enumerate_recipients, MessagingPipeline, MessagingSettings};
pub use scrape::{build_listing, ScrapePipeline, ScrapeRun, ScrapeSettings};
