//! # Fulfillment Error Types
//!
//! Structured error handling for the print fulfillment pipeline.
//!
//! Errors fall into two classes that drive the pipeline's failure isolation:
//!
//! - **Item-level** faults (render, delivery, token exchange, transport, payload
//!   serialization) exclude a single render unit from the current run. The unit's
//!   items keep their status and are picked up again by the next run.
//! - **Run-fatal** faults (repository reads and checkpoint writes) abort the run.

use crate::config::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {operation}: {message}")]
    Repository { operation: String, message: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Job queue error: {0}")]
    Queue(String),
}

impl FulfillmentError {
    pub fn repository(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Repository {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// True when the fault only affects the unit being processed.
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            FulfillmentError::Render(_)
                | FulfillmentError::Delivery(_)
                | FulfillmentError::Authentication(_)
                | FulfillmentError::Http(_)
                | FulfillmentError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FulfillmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_level_classification() {
        assert!(FulfillmentError::Render("502".to_string()).is_item_level());
        assert!(FulfillmentError::Delivery("folder missing".to_string()).is_item_level());
        assert!(FulfillmentError::Authentication("invalid_grant".to_string()).is_item_level());
        assert!(!FulfillmentError::repository("update_item_status", "timeout").is_item_level());
        assert!(!FulfillmentError::NotFound("order custom 7".to_string()).is_item_level());
    }

    #[test]
    fn test_repository_error_display() {
        let err = FulfillmentError::repository("append_batch_history", "connection reset");
        assert_eq!(
            err.to_string(),
            "Repository error: append_batch_history: connection reset"
        );
    }
}
