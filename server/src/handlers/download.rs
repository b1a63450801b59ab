use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// Streams the finished workbook once; the job is gone afterwards.
pub async fn download(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let artifact = state.store().take_artifact(&job_id)?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        artifact.filename
    ))
    .map_err(|e| ApiError::Internal(format!("Invalid download filename: {}", e)))?;
    let content_type = HeaderValue::from_static(artifact.content_type());

    tracing::info!(job_id = %job_id, filename = %artifact.filename, "Serving download");

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}
