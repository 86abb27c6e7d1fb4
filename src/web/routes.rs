//! # Routes

use axum::routing::{get, post};
use axum::Router;

use crate::web::handlers::{health, jobs, triggers};
use crate::web::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/label", post(triggers::reprint_single_label))
        .route("/sheet", post(triggers::reprint_sheet))
        .route("/sheet/labels", post(triggers::reprint_sheet_labels))
        .route("/sheet/all", post(triggers::force_print_remaining))
        .route("/jobs/:id", get(jobs::job_status))
        .with_state(state)
}
