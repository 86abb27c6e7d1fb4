//! # Fulfillment Coordinator
//!
//! Top-level entry points of the pipeline, wired once from a [`FulfillmentConfig`] and the
//! external collaborators.
//!
//! ## Scheduled Run
//!
//! 1. Pull new orders into the order custom table
//! 2. Confirm production image URLs are reachable
//! 3. Assign ready image items to sheets
//! 4. Print full sheets only
//! 5. Print pending labels
//!
//! ## Force Print Remaining
//!
//! Assign batches, print every sheet including partial ones, then print labels.

use super::batch_grouper::BatchGrouper;
use super::chunked_executor::{ChunkedPipelineExecutor, PipelineRunSummary};
use super::label_builder::LabelBuilder;
use super::label_service::LabelService;
use super::sheet_service::SheetService;
use super::status_checkpointer::StatusCheckpointer;
use crate::client::{DeliveryClient, TemplateRenderClient, UrlProbe};
use crate::config::FulfillmentConfig;
use crate::database::OrderRepository;
use crate::error::Result;
use crate::models::{ReprintSheetLabelRequest, ReprintSheetRequest, ReprintSingleLabelRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Outcome of a scheduled or forced run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FulfillmentRunReport {
    pub urls_confirmed: usize,
    pub sheets: PipelineRunSummary,
    pub labels: PipelineRunSummary,
}

pub struct FulfillmentCoordinator {
    repository: Arc<dyn OrderRepository>,
    url_probe: Arc<dyn UrlProbe>,
    url_check_chunk_size: usize,
    sheets: SheetService,
    labels: LabelService,
}

impl std::fmt::Debug for FulfillmentCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentCoordinator")
            .field("url_check_chunk_size", &self.url_check_chunk_size)
            .field("sheets", &self.sheets)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl FulfillmentCoordinator {
    pub fn new(
        config: &FulfillmentConfig,
        repository: Arc<dyn OrderRepository>,
        render_client: Arc<dyn TemplateRenderClient>,
        delivery_client: Arc<dyn DeliveryClient>,
        url_probe: Arc<dyn UrlProbe>,
    ) -> Self {
        let checkpointer = Arc::new(StatusCheckpointer::new(Arc::clone(&repository)));

        let sheets = SheetService::new(
            Arc::clone(&repository),
            Arc::clone(&delivery_client),
            BatchGrouper::from_config(&config.pipeline),
            ChunkedPipelineExecutor::new(
                Arc::clone(&render_client),
                Arc::clone(&delivery_client),
                config.pipeline.sheet_chunk_size,
            ),
            Arc::clone(&checkpointer),
            config.api_template.clone(),
            config.printers.clone(),
        );

        let labels = LabelService::new(
            Arc::clone(&repository),
            LabelBuilder::new(&config.api_template, &config.printers),
            ChunkedPipelineExecutor::new(
                render_client,
                delivery_client,
                config.pipeline.label_chunk_size,
            ),
            checkpointer,
        );

        Self {
            repository,
            url_probe,
            url_check_chunk_size: config.pipeline.url_check_chunk_size.max(1),
            sheets,
            labels,
        }
    }

    pub fn sheets(&self) -> &SheetService {
        &self.sheets
    }

    pub fn labels(&self) -> &LabelService {
        &self.labels
    }

    #[instrument(skip(self))]
    pub async fn print_sheets_and_labels(&self) -> Result<FulfillmentRunReport> {
        self.repository.populate_custom_orders().await?;
        let urls_confirmed = self.perform_url_check().await?;
        self.repository.assign_batches().await?;

        let sheets = self.sheets.generate_image_sheets(true).await?;
        let labels = self.labels.generate_labels().await?;

        let report = FulfillmentRunReport {
            urls_confirmed,
            sheets,
            labels,
        };
        info!(
            urls_confirmed = report.urls_confirmed,
            sheet_items = report.sheets.items_checkpointed,
            labels = report.labels.items_checkpointed,
            "Scheduled fulfillment run complete"
        );
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn force_print_remaining(&self) -> Result<FulfillmentRunReport> {
        self.repository.assign_batches().await?;

        let sheets = self.sheets.generate_image_sheets(false).await?;
        let labels = self.labels.generate_labels().await?;

        Ok(FulfillmentRunReport {
            urls_confirmed: 0,
            sheets,
            labels,
        })
    }

    /// Probe unconfirmed production URLs; returns how many were confirmed
    pub async fn perform_url_check(&self) -> Result<usize> {
        let items = self.repository.fetch_items_for_production_url_check().await?;
        if items.is_empty() {
            return Ok(0);
        }

        info!(item_count = items.len(), "Performing production url status check");

        let mut confirmed = 0;
        for chunk in items.chunks(self.url_check_chunk_size) {
            let mut ready = Vec::with_capacity(chunk.len());
            for item in chunk {
                let Some(url) = item.image_url.as_deref().filter(|url| !url.is_empty()) else {
                    debug!(order_custom_id = item.id, "No production url to check");
                    continue;
                };
                match self.url_probe.is_reachable(url).await {
                    Ok(true) => ready.push(item.id),
                    Ok(false) => {}
                    Err(e) => {
                        error!(order_custom_id = item.id, error = %e, "Production url check failed");
                    }
                }
            }

            if !ready.is_empty() {
                self.repository.update_production_url_status(&ready).await?;
                confirmed += ready.len();
            }
        }

        Ok(confirmed)
    }

    pub async fn reprint_single_label(
        &self,
        request: &ReprintSingleLabelRequest,
    ) -> Result<PipelineRunSummary> {
        self.labels.reprint_single_label(request).await
    }

    pub async fn reprint_sheet_labels(
        &self,
        request: &ReprintSheetLabelRequest,
    ) -> Result<PipelineRunSummary> {
        self.labels.reprint_all_labels_for_sheet(request).await
    }

    pub async fn reprint_sheet(&self, request: &ReprintSheetRequest) -> Result<()> {
        self.sheets.reprint_sheet(request).await
    }

    /// Order custom row count
    pub async fn health_check(&self) -> Result<i64> {
        self.repository.health_check().await
    }
}
