//! # Web API
//!
//! HTTP trigger surface. Every trigger is handed to the [`crate::orchestration::JobQueue`]
//! and answered immediately; the pipeline itself never runs on a request task.
//!
//! | Method | Path            | Body                                               |
//! |--------|-----------------|----------------------------------------------------|
//! | GET    | `/health`       |                                                    |
//! | POST   | `/label`        | `{orderCustomId}`                                  |
//! | POST   | `/sheet/labels` | `{batchGuid}`                                      |
//! | POST   | `/sheet`        | `{batchId, batchGuid, fileUrl, printerNo}`         |
//! | POST   | `/sheet/all`    |                                                    |
//! | GET    | `/jobs/{id}`    |                                                    |

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
