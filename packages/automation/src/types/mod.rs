//! Domain types for the automation pipeline.

pub mod job;
pub mod outcome;
pub mod query;
pub mod target;

pub use job::{ActiveJob, JobReport, JobRunner, JobStatus};
pub use outcome::{Delivery, Keyed, Listing, Outcome, OutcomeRecord};
pub use query::{MessageBatch, ScrapeQuery};
pub use target::Target;
