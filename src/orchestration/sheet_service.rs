//! # Sheet Service
//!
//! Image sheets: fetch pending image items, group them into sheets, render and deliver the
//! sheets chunk by chunk, and checkpoint every chunk as it completes.

use super::batch_grouper::BatchGrouper;
use super::chunked_executor::{ChunkedPipelineExecutor, PipelineRunSummary};
use super::status_checkpointer::{SheetReceiptSink, StatusCheckpointer};
use crate::client::DeliveryClient;
use crate::config::{ApiTemplateConfig, PrinterConfig};
use crate::database::OrderRepository;
use crate::error::{FulfillmentError, Result};
use crate::models::{DeliveryTarget, ReprintSheetRequest};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct SheetService {
    repository: Arc<dyn OrderRepository>,
    delivery_client: Arc<dyn DeliveryClient>,
    grouper: BatchGrouper,
    executor: ChunkedPipelineExecutor,
    checkpointer: Arc<StatusCheckpointer>,
    templates: ApiTemplateConfig,
    printers: PrinterConfig,
}

impl std::fmt::Debug for SheetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetService")
            .field("grouper", &self.grouper)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl SheetService {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        delivery_client: Arc<dyn DeliveryClient>,
        grouper: BatchGrouper,
        executor: ChunkedPipelineExecutor,
        checkpointer: Arc<StatusCheckpointer>,
        templates: ApiTemplateConfig,
        printers: PrinterConfig,
    ) -> Self {
        Self {
            repository,
            delivery_client,
            grouper,
            executor,
            checkpointer,
            templates,
            printers,
        }
    }

    /// Print every pending sheet. With `only_full_batches`, partial sheets are left for a
    /// later run.
    #[instrument(skip(self))]
    pub async fn generate_image_sheets(&self, only_full_batches: bool) -> Result<PipelineRunSummary> {
        let items = self.repository.fetch_pending_image_batch_items().await?;
        if items.is_empty() || (only_full_batches && items.len() < self.grouper.batch_size()) {
            return Ok(PipelineRunSummary::default());
        }

        info!(item_count = items.len(), "Generating image sheets");

        let sink = SheetReceiptSink::new(&self.checkpointer, &items);
        let units =
            self.grouper
                .group_into_units(items, only_full_batches, &self.templates, &self.printers);
        if units.is_empty() {
            return Ok(PipelineRunSummary::default());
        }

        let summary = self.executor.execute("image_sheets", &units, &sink).await?;
        info!(
            sheets_delivered = summary.units_delivered,
            items_printed = summary.items_checkpointed,
            "Image sheets complete"
        );
        Ok(summary)
    }

    /// Deliver an already rendered sheet again. Nothing is rendered and no status changes.
    #[instrument(skip(self, request), fields(batch_id = request.batch_id, batch_guid = %request.batch_guid))]
    pub async fn reprint_sheet(&self, request: &ReprintSheetRequest) -> Result<()> {
        let printer = self.printers.sheet_printer(request.printer_no);
        let target = DeliveryTarget {
            guid: request.batch_guid,
            sequence_no: Some(request.batch_id),
        };

        let delivered = self
            .delivery_client
            .deliver(&request.file_url, printer, &target)
            .await?;

        if delivered {
            info!(file_name = %target.file_name(), printer, "Sheet redelivered");
            Ok(())
        } else {
            Err(FulfillmentError::Delivery(format!(
                "delivery of {} to {printer} was refused",
                target.file_name()
            )))
        }
    }
}
