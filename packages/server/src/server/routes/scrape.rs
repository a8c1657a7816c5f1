use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use automation::{ExportError, PipelineError, ScrapeQuery, ScrapeRun};

use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Body of `POST /scrape`. The Portuguese field names are accepted too.
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(alias = "segmento")]
    pub segment: Option<String>,
    #[serde(alias = "cidade")]
    pub city: Option<String>,
    #[serde(alias = "estado")]
    pub region: Option<String>,
}

/// Run a scraping Job and return the CSV export as a download.
///
/// The Job runs on its own task so a dropped connection cannot interrupt
/// session release.
pub async fn scrape_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let query = ScrapeQuery::new(request.segment, request.city, request.region)?;

    let job = state.runner.begin()?;
    let pipeline = state.deps.scrape_pipeline();
    let run = tokio::spawn(async move { pipeline.run(&job, &query).await })
        .await
        .map_err(|e| ApiError::Internal(format!("scrape job aborted: {}", e)))??;

    match run {
        ScrapeRun::Cancelled { report } => Ok(Json(json!({
            "status": "cancelled",
            "collected": report.aggregate.len(),
        }))
        .into_response()),
        ScrapeRun::Exported { export, .. } => {
            let body = tokio::fs::read(&export.path)
                .await
                .map_err(|e| PipelineError::Export(ExportError::Io(e)))?;
            let disposition = format!("attachment; filename=\"{}\"", export.file_name);

            Ok((
                [
                    (CONTENT_TYPE, export.content_type.to_string()),
                    (CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response())
        }
    }
}
