//! CSV file export.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::{ExportHandle, ExportSink, EXPORT_COLUMNS};
use crate::aggregate::AggregateResult;
use crate::error::ExportError;
use crate::types::Listing;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Writes one CSV file per export into a directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Encode listings as CSV bytes with the fixed export header.
pub fn encode_listings(listings: &AggregateResult<Listing>) -> Result<Vec<u8>, ExportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;

    for listing in listings.iter() {
        writer.write_record([
            listing.title.as_str(),
            listing.phone.as_deref().unwrap_or(""),
            listing.website.as_deref().unwrap_or(""),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Make a caller-derived name safe to use as a single path component.
pub fn sanitize_file_name(name: &str) -> Result<String, ExportError> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(ExportError::InvalidName(name.to_string()));
    }

    Ok(cleaned)
}

#[async_trait]
impl ExportSink for CsvExporter {
    async fn export(
        &self,
        name: &str,
        listings: &AggregateResult<Listing>,
    ) -> Result<ExportHandle, ExportError> {
        let file_name = sanitize_file_name(name)?;
        let bytes = encode_listings(listings)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        info!(path = %path.display(), rows = listings.len(), "export written");

        Ok(ExportHandle {
            file_name,
            path,
            rows: listings.len(),
            content_type: CSV_CONTENT_TYPE,
        })
    }
}
