//! # Fulfillment Configuration System
//!
//! Every environment-derived value the pipeline needs (template ids, batch size, printer
//! folders, credentials, connection string) lives in one [`FulfillmentConfig`] value that
//! is loaded once and handed to components at construction time.
//!
//! ## Sources
//!
//! Merged in order, later sources winning:
//!
//! 1. `config/fulfillment.yaml`
//! 2. `config/fulfillment.{environment}.yaml`
//! 3. Environment variables prefixed with `FULFILLMENT`, nested with `__`
//!    (`FULFILLMENT__PIPELINE__BATCH_SIZE=15`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use print_fulfillment_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let batch_size = manager.config().pipeline.batch_size;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::pipeline;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring fulfillment.yaml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FulfillmentConfig {
    /// Order database connection
    pub database: DatabaseConfig,

    /// Document rendering service
    pub api_template: ApiTemplateConfig,

    /// Drive delivery service and its OAuth credentials
    pub google: GoogleConfig,

    /// Destination printer folders
    pub printers: PrinterConfig,

    /// Batch sizes and chunk sizes
    pub pipeline: PipelineConfig,

    /// Outbound HTTP settings
    pub http: HttpConfig,

    /// Periodic full run
    pub scheduler: SchedulerConfig,

    /// Trigger surface
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            acquire_timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiTemplateConfig {
    pub base_url: String,
    pub api_key: String,
    pub sheet_template_id: String,
    pub label_template_id: String,
    pub image_label_template_id: String,
}

impl Default for ApiTemplateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.apitemplate.io/v1/".to_string(),
            api_key: String::new(),
            sheet_template_id: String::new(),
            label_template_id: String::new(),
            image_label_template_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub oauth_base_url: String,
    pub script_base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_expiration_buffer_seconds: i64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            oauth_base_url: "https://www.googleapis.com/oauth2/v4/".to_string(),
            script_base_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            token_expiration_buffer_seconds: pipeline::DEFAULT_TOKEN_EXPIRATION_BUFFER_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PrinterConfig {
    pub printer1: String,
    pub printer2: String,
    pub image_label_printer: String,
    pub engravable_label_printer: String,
}

impl PrinterConfig {
    /// Sheet printer folder for a printer number; anything but 1 goes to printer 2
    pub fn sheet_printer(&self, printer_no: i32) -> &str {
        if printer_no == 1 {
            &self.printer1
        } else {
            &self.printer2
        }
    }
}

/// Sizes that shape grouping and chunking
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub sheet_chunk_size: usize,
    pub label_chunk_size: usize,
    pub url_check_chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: pipeline::DEFAULT_BATCH_SIZE,
            sheet_chunk_size: pipeline::DEFAULT_SHEET_CHUNK_SIZE,
            label_chunk_size: pipeline::DEFAULT_LABEL_CHUNK_SIZE,
            url_check_chunk_size: pipeline::DEFAULT_URL_CHECK_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 60,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 900,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind_address: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl FulfillmentConfig {
    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        let required = [
            ("database.url", &self.database.url),
            ("api_template.base_url", &self.api_template.base_url),
            ("api_template.api_key", &self.api_template.api_key),
            ("api_template.sheet_template_id", &self.api_template.sheet_template_id),
            ("api_template.label_template_id", &self.api_template.label_template_id),
            (
                "api_template.image_label_template_id",
                &self.api_template.image_label_template_id,
            ),
            ("google.oauth_base_url", &self.google.oauth_base_url),
            ("google.script_base_url", &self.google.script_base_url),
            ("google.client_id", &self.google.client_id),
            ("google.client_secret", &self.google.client_secret),
            ("google.refresh_token", &self.google.refresh_token),
            ("printers.printer1", &self.printers.printer1),
            ("printers.printer2", &self.printers.printer2),
            ("printers.image_label_printer", &self.printers.image_label_printer),
            (
                "printers.engravable_label_printer",
                &self.printers.engravable_label_printer,
            ),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    field,
                    "fulfillment configuration",
                ));
            }
        }

        let sizes = [
            ("pipeline.batch_size", self.pipeline.batch_size),
            ("pipeline.sheet_chunk_size", self.pipeline.sheet_chunk_size),
            ("pipeline.label_chunk_size", self.pipeline.label_chunk_size),
            ("pipeline.url_check_chunk_size", self.pipeline.url_check_chunk_size),
        ];

        for (field, value) in sizes {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "must be greater than zero",
                ));
            }
        }

        if self.google.token_expiration_buffer_seconds < 0 {
            return Err(ConfigurationError::invalid_value(
                "google.token_expiration_buffer_seconds",
                self.google.token_expiration_buffer_seconds.to_string(),
                "must not be negative",
            ));
        }

        if self.scheduler.enabled && self.scheduler.interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.interval_seconds",
                "0",
                "must be greater than zero when the scheduler is enabled",
            ));
        }

        Ok(())
    }
}
