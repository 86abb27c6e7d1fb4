//! # Trigger Handlers
//!
//! On-demand runs. Each handler submits a [`PrintJob`] and replies `202 Accepted` with the
//! job id; the outcome is read back from `GET /jobs/{id}`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{ReprintSheetLabelRequest, ReprintSheetRequest, ReprintSingleLabelRequest};
use crate::orchestration::PrintJob;
use crate::web::errors::ApiResult;
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobAcceptedResponse {
    pub job_id: Uuid,
    pub kind: &'static str,
    pub status_url: String,
}

fn accept(state: &AppState, job: PrintJob) -> ApiResult<(StatusCode, Json<JobAcceptedResponse>)> {
    let kind = job.kind();
    let job_id = state.queue().submit(job)?;

    info!(%job_id, kind, "Print job accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAcceptedResponse {
            job_id,
            kind,
            status_url: format!("/jobs/{job_id}"),
        }),
    ))
}

/// `POST /label`
pub async fn reprint_single_label(
    State(state): State<AppState>,
    Json(request): Json<ReprintSingleLabelRequest>,
) -> ApiResult<(StatusCode, Json<JobAcceptedResponse>)> {
    accept(&state, PrintJob::ReprintSingleLabel(request))
}

/// `POST /sheet/labels`
pub async fn reprint_sheet_labels(
    State(state): State<AppState>,
    Json(request): Json<ReprintSheetLabelRequest>,
) -> ApiResult<(StatusCode, Json<JobAcceptedResponse>)> {
    accept(&state, PrintJob::ReprintSheetLabels(request))
}

/// `POST /sheet`
pub async fn reprint_sheet(
    State(state): State<AppState>,
    Json(request): Json<ReprintSheetRequest>,
) -> ApiResult<(StatusCode, Json<JobAcceptedResponse>)> {
    accept(&state, PrintJob::ReprintSheet(request))
}

/// `POST /sheet/all`
pub async fn force_print_remaining(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<JobAcceptedResponse>)> {
    accept(&state, PrintJob::ForcePrintRemaining)
}
