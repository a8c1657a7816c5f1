//! Outcome collection and first-occurrence deduplication.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::{Keyed, Outcome, OutcomeRecord, Target};

/// Counts of each outcome variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Deduplicated, ordered success payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult<T> {
    entries: Vec<T>,
}

impl<T> AggregateResult<T> {
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<T> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }
}

impl<T> Default for AggregateResult<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// Collects outcomes in arrival order for one Job.
///
/// Nothing is exposed until [`Aggregator::finalize`], so a partial run can
/// never leak a half-built result.
#[derive(Debug)]
pub struct Aggregator<T> {
    records: Vec<OutcomeRecord<T>>,
}

impl<T> Default for Aggregator<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: Keyed + Clone> Aggregator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: Target, outcome: Outcome<T>) {
        self.records.push(OutcomeRecord { target, outcome });
    }

    /// Number of outcomes recorded so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the collector, returning the raw records and the deduplicated aggregate.
    pub fn finalize(self) -> (Vec<OutcomeRecord<T>>, AggregateResult<T>) {
        let mut seen = HashSet::new();
        let entries = self
            .records
            .iter()
            .filter_map(|record| record.outcome.success())
            .filter(|value| seen.insert(value.key().to_string()))
            .cloned()
            .collect();

        (self.records, AggregateResult { entries })
    }
}

/// Tally the variants of a record list.
pub fn count_outcomes<T>(records: &[OutcomeRecord<T>]) -> OutcomeCounts {
    records
        .iter()
        .fold(OutcomeCounts::default(), |mut counts, record| {
            match record.outcome {
                Outcome::Success(_) => counts.succeeded += 1,
                Outcome::Skipped { .. } => counts.skipped += 1,
                Outcome::Failed { .. } => counts.failed += 1,
            }
            counts
        })
}
