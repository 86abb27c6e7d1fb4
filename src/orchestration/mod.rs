//! # Fulfillment Orchestration
//!
//! The batch-and-checkpoint pipeline and the machinery that triggers it.
//!
//! ## Pipeline
//!
//! ```text
//! OrderRepository ──► BatchGrouper / LabelBuilder ──► ChunkedPipelineExecutor
//!                                                      │  render ─► deliver
//!                                                      ▼
//!                                    StatusCheckpointer ──► OrderRepository
//! ```
//!
//! - [`batch_grouper`] - image items into sheets, with the full-batch policy
//! - [`label_builder`] - items into single labels
//! - [`chunked_executor`] - bounded chunks, per-unit failure isolation
//! - [`status_checkpointer`] - status and history writes per completed chunk
//! - [`sheet_service`] / [`label_service`] - the two document flows
//! - [`fulfillment_coordinator`] - scheduled run, force print, reprints, health
//!
//! ## Triggers
//!
//! - [`job_queue`] - single-worker queue with observable job status
//! - [`scheduler`] - interval trigger for the scheduled run

pub mod batch_grouper;
pub mod chunked_executor;
pub mod fulfillment_coordinator;
pub mod job_queue;
pub mod label_builder;
pub mod label_service;
pub mod scheduler;
pub mod sheet_service;
pub mod status_checkpointer;

pub use batch_grouper::{BatchGroup, BatchGrouper};
pub use chunked_executor::{ChunkedPipelineExecutor, PipelineRunSummary, UnitOutcome};
pub use fulfillment_coordinator::{FulfillmentCoordinator, FulfillmentRunReport};
pub use job_queue::{JobHandler, JobQueue, JobRecord, JobRegistry, JobState, JobWorker, PrintJob};
pub use label_builder::{LabelBuilder, LabelExclusion};
pub use label_service::LabelService;
pub use scheduler::Scheduler;
pub use sheet_service::SheetService;
pub use status_checkpointer::{
    CheckpointMode, LabelReceiptSink, ReceiptSink, SheetReceiptSink, StatusCheckpointer,
};
