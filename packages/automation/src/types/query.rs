//! Job parameters for the two pipeline variants.

use std::time::Duration;

use crate::error::{PipelineError, Result};

/// Search parameters for a scraping Job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeQuery {
    pub segment: String,
    pub city: String,
    pub region: String,
}

impl ScrapeQuery {
    /// Build a query, rejecting missing or blank fields.
    pub fn new(
        segment: Option<String>,
        city: Option<String>,
        region: Option<String>,
    ) -> Result<Self> {
        match (non_blank(segment), non_blank(city), non_blank(region)) {
            (Some(segment), Some(city), Some(region)) => Ok(Self {
                segment,
                city,
                region,
            }),
            _ => Err(PipelineError::validation(
                "segment, city and region are required",
            )),
        }
    }

    /// Text typed into the search box.
    pub fn search_text(&self) -> String {
        format!("{} em {}, {}", self.segment, self.city, self.region)
    }

    /// Export artifact name derived from the parameters.
    pub fn export_name(&self) -> String {
        format!("{}_{}_{}.csv", self.segment, self.city, self.region)
    }
}

/// A batch of messages to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBatch {
    pub message: String,
    pub numbers: Vec<String>,

    /// Per-request pacing override.
    pub interval: Option<Duration>,
}

impl MessageBatch {
    pub fn new(
        message: Option<String>,
        numbers: Option<Vec<String>>,
        interval_ms: Option<f64>,
    ) -> Result<Self> {
        let message = non_blank(message)
            .ok_or_else(|| PipelineError::validation("message and numbers are required"))?;
        let numbers = numbers
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PipelineError::validation("message and numbers are required"))?;

        let interval = match interval_ms {
            Some(ms) if !ms.is_finite() || ms < 0.0 => {
                return Err(PipelineError::validation(
                    "interval must be a non-negative number of milliseconds",
                ))
            }
            Some(ms) => Some(Duration::from_secs_f64(ms / 1000.0)),
            None => None,
        };

        Ok(Self {
            message,
            numbers,
            interval,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_scrape_query_requires_all_fields() {
        assert!(ScrapeQuery::new(s("padaria"), s("Sao Paulo"), None).is_err());
        assert!(ScrapeQuery::new(s("padaria"), s("  "), s("SP")).is_err());
        assert!(ScrapeQuery::new(s("padaria"), s("Sao Paulo"), s("SP")).is_ok());
    }

    #[test]
    fn test_export_name_and_search_text() {
        let query = ScrapeQuery::new(s("padaria"), s("Sao Paulo"), s("SP")).unwrap();
        assert_eq!(query.export_name(), "padaria_Sao Paulo_SP.csv");
        assert_eq!(query.search_text(), "padaria em Sao Paulo, SP");
    }

    #[test]
    fn test_message_batch_validation() {
        assert!(MessageBatch::new(s("hi"), Some(vec![]), None).is_err());
        assert!(MessageBatch::new(None, Some(vec!["1".into()]), None).is_err());

        let batch = MessageBatch::new(s("hi"), Some(vec!["1".into()]), Some(250.0)).unwrap();
        assert_eq!(batch.interval, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_message_batch_fractional_interval() {
        let batch = MessageBatch::new(s("hi"), Some(vec!["1".into()]), Some(1.5)).unwrap();
        assert_eq!(batch.interval, Some(Duration::from_micros(1500)));

        let batch = MessageBatch::new(s("hi"), Some(vec!["1".into()]), Some(0.0)).unwrap();
        assert_eq!(batch.interval, Some(Duration::ZERO));
    }

    #[test]
    fn test_message_batch_rejects_negative_interval() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let result = MessageBatch::new(s("hi"), Some(vec!["1".into()]), Some(bad));
            assert!(matches!(result, Err(PipelineError::Validation { .. })));
        }
    }
}
