//! Interaction targets.

use serde::Serialize;

/// One unit of work within a Job. Immutable once enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Position in the enumerated list.
    pub index: usize,

    /// Identifier as read from the agent or the request (link href, phone as typed).
    pub raw: String,

    /// Normalized identifier used for interaction.
    pub resolved: String,
}

impl Target {
    pub fn new(index: usize, raw: impl Into<String>, resolved: impl Into<String>) -> Self {
        Self {
            index,
            raw: raw.into(),
            resolved: resolved.into(),
        }
    }

    /// Build an ordered target list where the resolved id equals the raw id.
    pub fn enumerate<I, S>(raw_ids: I) -> Vec<Target>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        raw_ids
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let raw = raw.into();
                Target::new(index, raw.clone(), raw)
            })
            .collect()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.index, self.resolved)
    }
}
