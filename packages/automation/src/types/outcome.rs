//! Per-target outcomes and the payloads they carry.

use serde::Serialize;

use super::target::Target;

/// Result of interacting with one Target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome<T> {
    Success(T),
    Skipped { reason: String },
    Failed { reason: String },
}

impl<T> Outcome<T> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Outcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Outcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// An outcome paired with the target it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord<T> {
    pub target: Target,
    pub outcome: Outcome<T>,
}

/// Stable identity used for deduplication.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// A business listing scraped from a search result detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub title: String,

    /// Digits only, country-code prefixed.
    pub phone: Option<String>,

    pub website: Option<String>,
}

impl Keyed for Listing {
    fn key(&self) -> &str {
        &self.title
    }
}

/// A message accepted by the messaging agent for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Digits-only recipient number.
    pub phone: String,
}

impl Keyed for Delivery {
    fn key(&self) -> &str {
        &self.phone
    }
}
