use axum::extract::{Path, State};
use axum::Json;
use fapiao::JobSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    Ok(Json(state.store().get(&job_id)?))
}
