use axum::extract::{Multipart, State};
use axum::Json;
use fapiao::UploadedImage;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field names that carry images. `photo` is what the single-file
/// form posts, `photos` the multi-file one.
const IMAGE_FIELDS: [&str; 2] = ["photos", "photo"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: String,
    pub total: usize,
}

/// Reads every image part, registers a job and returns before any OCR runs.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let is_image = field
            .name()
            .map(|name| IMAGE_FIELDS.contains(&name))
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("image-{}", images.len() + 1));
        let bytes = field.bytes().await?;
        // Browsers send an empty part when no file was picked.
        if bytes.is_empty() {
            continue;
        }
        images.push(UploadedImage::new(filename, bytes.to_vec()));
    }

    if images.is_empty() {
        return Err(ApiError::BadRequest("No images uploaded".to_string()));
    }

    let total = images.len();
    let job_id = state.dispatcher.submit(images)?;
    tracing::info!(job_id = %job_id, total, "Accepted upload");

    Ok(Json(UploadResponse { job_id, total }))
}
