//! Export sinks for the scraping aggregate.

pub mod csv;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::aggregate::AggregateResult;
use crate::error::ExportError;
use crate::types::Listing;

pub use self::csv::CsvExporter;

/// Column headers of the tabular export, in order.
pub const EXPORT_COLUMNS: [&str; 3] = ["Título", "Telefone", "Website"];

/// Where an export landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportHandle {
    /// Name to present for download.
    pub file_name: String,

    /// Location of the written artifact.
    pub path: PathBuf,

    /// Data rows written (header excluded).
    pub rows: usize,

    pub content_type: &'static str,
}

/// Serializes a deduplicated aggregate into a durable artifact.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn export(
        &self,
        name: &str,
        listings: &AggregateResult<Listing>,
    ) -> Result<ExportHandle, ExportError>;
}
