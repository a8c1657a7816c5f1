//! Capability interface for a search-results browser agent.
//!
//! The pipeline only knows these operations; selectors, DOM queries and page
//! navigation live in the implementation (see `agents::chromium`).

use async_trait::async_trait;

use super::agent::AgentSession;
use crate::error::AgentResult;
use crate::types::{ScrapeQuery, Target};

/// Conditions the pipeline waits on with a bounded poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The search results container is visible.
    ResultsFeed,
    /// The detail view for the selected result is visible.
    DetailView,
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Probe::ResultsFeed => write!(f, "results feed"),
            Probe::DetailView => write!(f, "detail view"),
        }
    }
}

/// Raw fields read from a detail view. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub title: Option<String>,

    /// Phone as displayed, prefix labels already stripped but not normalized.
    pub phone: Option<String>,

    pub website: Option<String>,
}

/// Opens browser sessions. One session per Job.
#[async_trait]
pub trait BrowserAgent: Send + Sync {
    async fn open(&self) -> AgentResult<Box<dyn SearchSession>>;
}

/// A browser page driven through a search-then-inspect flow.
#[async_trait]
pub trait SearchSession: AgentSession {
    /// Navigate to the search page and submit the query.
    async fn search(&mut self, query: &ScrapeQuery) -> AgentResult<()>;

    /// Check (without waiting) whether a condition currently holds.
    async fn probe(&mut self, probe: Probe) -> AgentResult<bool>;

    /// Read back the identifiers of every result entry, in display order.
    async fn locate_targets(&mut self) -> AgentResult<Vec<String>>;

    /// Open the detail view for a target.
    async fn select_target(&mut self, target: &Target) -> AgentResult<()>;

    /// Read the fields of the currently open detail view.
    async fn extract_fields(&mut self) -> AgentResult<DetailFields>;
}
