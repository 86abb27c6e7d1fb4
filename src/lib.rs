#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Print Fulfillment Core
//!
//! Batch-and-checkpoint pipeline that turns custom product orders into printed sheets and
//! labels.
//!
//! ## Overview
//!
//! Pending order items are read from PostgreSQL, grouped into render units (one sheet per
//! batch, one label per item), rendered by a template service and dropped into printer
//! folders by a delivery endpoint. Work proceeds in small chunks; after every chunk the
//! delivered items are checkpointed (status, print count, history rows) so a crash or a
//! failing service never loses more than one chunk of progress and never marks an
//! undelivered item as printed.
//!
//! ## Failure isolation
//!
//! - A unit whose render or delivery fails is skipped; its items keep their status and are
//!   picked up by the next run.
//! - A repository failure aborts the run. Chunks checkpointed before it stay committed.
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (`config/fulfillment.yaml`, overlays, environment)
//! - [`constants`] - Status, type and station enums and pipeline defaults
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging bootstrap
//! - [`models`] - Order items, render payloads, history rows, trigger requests
//! - [`database`] - Repository contract and the PostgreSQL implementation
//! - [`client`] - Render, delivery, token and URL probe clients
//! - [`orchestration`] - Grouping, chunked execution, checkpointing, job queue, scheduler
//! - [`web`] - HTTP trigger surface
//! - [`test_helpers`] - In-memory repository and scripted clients
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use print_fulfillment_core::config::ConfigManager;
//! use print_fulfillment_core::orchestration::BatchGrouper;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let grouper = BatchGrouper::from_config(&manager.config().pipeline);
//! println!("full sheets hold {} items", grouper.batch_size());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Everything below the repository and client traits runs in-process against
//! [`test_helpers`]:
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod test_helpers;
pub mod web;

pub use config::{ConfigManager, FulfillmentConfig, PipelineConfig};
pub use constants::{OrderCustomStatus, OrderCustomType, Station};
pub use database::{OrderRepository, PgOrderRepository};
pub use error::{FulfillmentError, Result};
pub use models::{BatchKey, DeliveryReceipt, OrderItem, RenderUnit};
pub use orchestration::{
    BatchGrouper, ChunkedPipelineExecutor, FulfillmentCoordinator, JobQueue, PipelineRunSummary,
    PrintJob, StatusCheckpointer,
};
