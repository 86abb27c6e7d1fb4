//! # Health Check Handler
//!
//! `GET /health` answers with the number of order custom rows, which proves the database
//! is reachable.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub item_count: i64,
    pub timestamp: String,
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let item_count = state.coordinator().health_check().await.map_err(|e| {
        error!(error = %e, "Health check failed");
        ApiError::from(e)
    })?;

    debug!(item_count, "Health check passed");

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        item_count,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
