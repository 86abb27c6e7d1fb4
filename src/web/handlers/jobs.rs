//! # Job Status Handler

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::orchestration::JobRecord;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

/// `GET /jobs/{id}`
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobRecord>> {
    state
        .queue()
        .status(id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("job {id}")))
}
