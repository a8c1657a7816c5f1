//! Typed errors for the automation pipeline.
//!
//! Per-target failures never show up here: they are recorded as
//! [`Outcome`](crate::types::Outcome) variants. These errors terminate a Job.

use thiserror::Error;

/// Errors raised by an agent (browser session, messaging client).
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent could not be started or is not ready (auth failure, disconnected).
    #[error("agent unavailable: {0}")]
    Unavailable(String),

    /// A bounded wait on the agent elapsed.
    #[error("timed out waiting for {what}")]
    Timeout { what: String },

    /// An element or field the interaction needed was not present.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other failure of a single agent call.
    #[error("interaction failed: {0}")]
    Interaction(String),
}

impl AgentError {
    pub fn interaction(err: impl std::fmt::Display) -> Self {
        AgentError::Interaction(err.to_string())
    }
}

/// Errors writing the tabular export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid export name: {0}")]
    InvalidName(String),
}

/// Job-level errors. Each one ends the Job with an error response.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or missing job parameters; no Job was created.
    #[error("validation error: {reason}")]
    Validation { reason: String },

    /// Another Job is already running.
    #[error("a job is already running")]
    Busy,

    /// The agent session could not be acquired.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// The agent never reached the state needed to enumerate targets.
    #[error("discovery failed: {reason}")]
    Discovery { reason: String },

    /// The aggregate could not be written.
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    pub fn validation(reason: impl Into<String>) -> Self {
        PipelineError::Validation {
            reason: reason.into(),
        }
    }

    pub fn discovery(reason: impl Into<String>) -> Self {
        PipelineError::Discovery {
            reason: reason.into(),
        }
    }
}

/// Result type alias for agent calls.
pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
