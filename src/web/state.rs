//! # Web API Application State
//!
//! Shared state handed to every handler: the job queue triggers are submitted to and the
//! coordinator used for health checks.

use crate::orchestration::{FulfillmentCoordinator, JobQueue};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    queue: JobQueue,
    coordinator: Arc<FulfillmentCoordinator>,
}

impl AppState {
    pub fn new(queue: JobQueue, coordinator: Arc<FulfillmentCoordinator>) -> Self {
        Self { queue, coordinator }
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    pub fn coordinator(&self) -> &FulfillmentCoordinator {
        &self.coordinator
    }
}
