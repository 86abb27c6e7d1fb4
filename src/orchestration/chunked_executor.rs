//! # Chunked Pipeline Executor
//!
//! Drives render units through render and delivery in bounded chunks.
//!
//! ## Execution Model
//!
//! - Units are split into `ceil(N / chunk_size)` chunks, order preserved
//! - Chunks run one after another; units inside a chunk run one after another
//! - Each unit yields a [`UnitOutcome`]; only `Delivered` outcomes become receipts
//! - After every chunk its receipts go to the [`ReceiptSink`] before the next chunk starts
//!
//! A failed render or delivery only drops that unit. A failing sink is a repository fault:
//! it propagates and stops the run, leaving earlier chunks checkpointed.

use super::status_checkpointer::ReceiptSink;
use crate::client::{DeliveryClient, TemplateRenderClient};
use crate::error::Result;
use crate::logging::log_pipeline_operation;
use crate::models::{DeliveryReceipt, RenderUnit};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one unit
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Delivered(DeliveryReceipt),
    RenderFailed { error: String },
    DeliveryRefused,
    DeliveryFailed { error: String },
}

impl UnitOutcome {
    pub fn receipt(self) -> Option<DeliveryReceipt> {
        match self {
            UnitOutcome::Delivered(receipt) => Some(receipt),
            _ => None,
        }
    }
}

/// Totals for one executor run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineRunSummary {
    pub chunks_processed: usize,
    pub units_attempted: usize,
    pub units_delivered: usize,
    pub units_failed: usize,
    pub items_checkpointed: usize,
}

impl PipelineRunSummary {
    pub fn merge(&mut self, other: &PipelineRunSummary) {
        self.chunks_processed += other.chunks_processed;
        self.units_attempted += other.units_attempted;
        self.units_delivered += other.units_delivered;
        self.units_failed += other.units_failed;
        self.items_checkpointed += other.items_checkpointed;
    }
}

#[derive(Clone)]
pub struct ChunkedPipelineExecutor {
    render_client: Arc<dyn TemplateRenderClient>,
    delivery_client: Arc<dyn DeliveryClient>,
    chunk_size: usize,
}

impl std::fmt::Debug for ChunkedPipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedPipelineExecutor")
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl ChunkedPipelineExecutor {
    pub fn new(
        render_client: Arc<dyn TemplateRenderClient>,
        delivery_client: Arc<dyn DeliveryClient>,
        chunk_size: usize,
    ) -> Self {
        Self {
            render_client,
            delivery_client,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Same clients, different chunk size
    pub fn with_chunk_size(&self, chunk_size: usize) -> Self {
        Self::new(
            Arc::clone(&self.render_client),
            Arc::clone(&self.delivery_client),
            chunk_size,
        )
    }

    #[instrument(skip(self, units, sink), fields(unit_count = units.len(), chunk_size = self.chunk_size))]
    pub async fn execute(
        &self,
        operation: &str,
        units: &[RenderUnit],
        sink: &dyn ReceiptSink,
    ) -> Result<PipelineRunSummary> {
        let mut summary = PipelineRunSummary::default();

        for (chunk_index, chunk) in units.chunks(self.chunk_size).enumerate() {
            let mut receipts = Vec::with_capacity(chunk.len());

            for unit in chunk {
                summary.units_attempted += 1;
                match self.process_unit(unit).await.receipt() {
                    Some(receipt) => receipts.push(receipt),
                    None => summary.units_failed += 1,
                }
            }

            summary.units_delivered += receipts.len();
            let checkpointed = sink.commit(&receipts).await.map_err(|e| {
                error!(
                    operation,
                    chunk_index,
                    error = %e,
                    "Checkpoint failed, aborting run"
                );
                e
            })?;
            summary.items_checkpointed += checkpointed;
            summary.chunks_processed += 1;

            debug!(
                operation,
                chunk_index,
                delivered = receipts.len(),
                checkpointed,
                "Chunk complete"
            );
        }

        log_pipeline_operation(
            operation,
            summary.units_attempted,
            summary.units_delivered,
            summary.items_checkpointed,
            if summary.units_failed == 0 { "success" } else { "partial" },
            None,
        );
        Ok(summary)
    }

    /// Render then deliver one unit; never returns an error
    pub async fn process_unit(&self, unit: &RenderUnit) -> UnitOutcome {
        let target = unit.delivery_target();

        let document = match self.render_client.render(unit).await {
            Ok(document) => document,
            Err(e) => {
                error!(
                    kind = unit.kind(),
                    unit_guid = %target.guid,
                    error = %e,
                    "Failed to render document"
                );
                return UnitOutcome::RenderFailed {
                    error: e.to_string(),
                };
            }
        };

        match self
            .delivery_client
            .deliver(&document.document_url, unit.destination(), &target)
            .await
        {
            Ok(true) => {
                info!(
                    kind = unit.kind(),
                    unit_guid = %target.guid,
                    file_name = %target.file_name(),
                    "Document delivered"
                );
                UnitOutcome::Delivered(DeliveryReceipt {
                    unit_guid: target.guid,
                    sheet_no: target.sequence_no,
                    member_ids: unit.member_ids(),
                    document_url: document.document_url,
                })
            }
            Ok(false) => {
                warn!(kind = unit.kind(), unit_guid = %target.guid, "Delivery refused");
                UnitOutcome::DeliveryRefused
            }
            Err(e) => {
                error!(
                    kind = unit.kind(),
                    unit_guid = %target.guid,
                    error = %e,
                    "Failed to deliver document"
                );
                UnitOutcome::DeliveryFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}
