//! # Label Service
//!
//! Scheduled labels are checkpointed chunk by chunk as `LabelPrinted`. Reprints, for one
//! item or for every item on a sheet, run as a single chunk and are checkpointed as
//! `Reprint`. Both move the item to station 1 and append station history.

use super::chunked_executor::{ChunkedPipelineExecutor, PipelineRunSummary};
use super::label_builder::LabelBuilder;
use super::status_checkpointer::{CheckpointMode, LabelReceiptSink, StatusCheckpointer};
use crate::database::OrderRepository;
use crate::error::{FulfillmentError, Result};
use crate::models::{OrderItem, ReprintSheetLabelRequest, ReprintSingleLabelRequest};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct LabelService {
    repository: Arc<dyn OrderRepository>,
    builder: LabelBuilder,
    executor: ChunkedPipelineExecutor,
    checkpointer: Arc<StatusCheckpointer>,
}

impl std::fmt::Debug for LabelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelService")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl LabelService {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        builder: LabelBuilder,
        executor: ChunkedPipelineExecutor,
        checkpointer: Arc<StatusCheckpointer>,
    ) -> Self {
        Self {
            repository,
            builder,
            executor,
            checkpointer,
        }
    }

    #[instrument(skip(self))]
    pub async fn generate_labels(&self) -> Result<PipelineRunSummary> {
        let items = self.repository.fetch_pending_label_items().await?;
        if items.is_empty() {
            return Ok(PipelineRunSummary::default());
        }

        info!(label_count = items.len(), "Generating labels");

        let units = self.builder.build_all(&items);
        let sink = LabelReceiptSink::new(&self.checkpointer, CheckpointMode::LabelPrinted);
        self.executor.execute("labels", &units, &sink).await
    }

    #[instrument(skip(self, request), fields(batch_guid = %request.batch_guid))]
    pub async fn reprint_all_labels_for_sheet(
        &self,
        request: &ReprintSheetLabelRequest,
    ) -> Result<PipelineRunSummary> {
        let items = self
            .repository
            .fetch_items_by_batch_guid(request.batch_guid)
            .await?;
        self.reprint_labels(&items).await
    }

    #[instrument(skip(self, request), fields(order_custom_id = request.order_custom_id))]
    pub async fn reprint_single_label(
        &self,
        request: &ReprintSingleLabelRequest,
    ) -> Result<PipelineRunSummary> {
        let item = self
            .repository
            .fetch_item_by_id(request.order_custom_id)
            .await?
            .ok_or_else(|| {
                FulfillmentError::NotFound(format!("order custom {}", request.order_custom_id))
            })?;
        self.reprint_labels(std::slice::from_ref(&item)).await
    }

    async fn reprint_labels(&self, items: &[OrderItem]) -> Result<PipelineRunSummary> {
        if items.is_empty() {
            return Ok(PipelineRunSummary::default());
        }

        info!(label_count = items.len(), "Reprinting labels");

        let units = self.builder.build_all(items);
        let sink = LabelReceiptSink::new(&self.checkpointer, CheckpointMode::LabelReprint);
        self.executor
            .with_chunk_size(units.len())
            .execute("label_reprint", &units, &sink)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{OrderCustomStatus, OrderCustomType, Station};
    use crate::test_helpers::{
        test_config, InMemoryOrderRepository, OrderItemBuilder, ScriptedDeliveryClient,
        ScriptedRenderClient,
    };
    use uuid::Uuid;

    struct Fixture {
        repository: Arc<InMemoryOrderRepository>,
        render: Arc<ScriptedRenderClient>,
        delivery: Arc<ScriptedDeliveryClient>,
        service: LabelService,
    }

    fn fixture(repository: InMemoryOrderRepository) -> Fixture {
        let config = test_config();
        let repository = Arc::new(repository);
        let render = Arc::new(ScriptedRenderClient::new());
        let delivery = Arc::new(ScriptedDeliveryClient::new());
        let service = LabelService::new(
            repository.clone(),
            LabelBuilder::new(&config.api_template, &config.printers),
            ChunkedPipelineExecutor::new(
                render.clone(),
                delivery.clone(),
                config.pipeline.label_chunk_size,
            ),
            Arc::new(StatusCheckpointer::new(repository.clone())),
        );
        Fixture {
            repository,
            render,
            delivery,
            service,
        }
    }

    fn label_item(id: i64) -> OrderItem {
        OrderItemBuilder::new(id)
            .custom_type(OrderCustomType::Engrave)
            .station(Station::Station2)
            .description("SKU-1 Engraved ring")
            .attributes(r#"{"options": [{"name": "Text", "value": "Ava", "type": "text input"}]}"#)
            .build()
    }

    #[tokio::test]
    async fn test_scheduled_labels_checkpoint_as_label_printed() {
        let items: Vec<OrderItem> = (1..=3).map(label_item).collect();
        let f = fixture(InMemoryOrderRepository::with_items(items));

        let summary = f.service.generate_labels().await.unwrap();

        assert_eq!(summary.chunks_processed, 2);
        assert_eq!(summary.items_checkpointed, 3);
        let item = f.repository.item(2).unwrap();
        assert_eq!(item.custom_status_id, OrderCustomStatus::LabelPrinted);
        assert_eq!(item.current_station_id, Station::Station1);
        assert_eq!(f.repository.station_history().len(), 3);
        assert_eq!(f.delivery.deliveries()[0].destination, "EngraveLabels");
        assert_eq!(
            f.delivery.deliveries()[0].file_name,
            format!("{}.pdf", f.repository.item(1).unwrap().guid)
        );
    }

    #[tokio::test]
    async fn test_reprint_sheet_labels_runs_as_one_chunk() {
        let guid = Uuid::new_v4();
        let items: Vec<OrderItem> = (1..=5)
            .map(|id| {
                let mut item = label_item(id);
                item.printer_batch_guid = guid;
                item.custom_status_id = OrderCustomStatus::LabelPrinted;
                item
            })
            .collect();
        let f = fixture(InMemoryOrderRepository::with_items(items));

        let summary = f
            .service
            .reprint_all_labels_for_sheet(&ReprintSheetLabelRequest { batch_guid: guid })
            .await
            .unwrap();

        assert_eq!(summary.chunks_processed, 1);
        assert_eq!(summary.items_checkpointed, 5);
        assert_eq!(
            f.repository.item(4).unwrap().custom_status_id,
            OrderCustomStatus::Reprint
        );
    }

    #[tokio::test]
    async fn test_reprint_unknown_item_is_not_found() {
        let f = fixture(InMemoryOrderRepository::new());
        let err = f
            .service
            .reprint_single_label(&ReprintSingleLabelRequest { order_custom_id: 99 })
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reprint_malformed_item_writes_nothing() {
        let item = OrderItemBuilder::new(8).attributes("{broken").build();
        let f = fixture(InMemoryOrderRepository::with_items(vec![item]));

        let summary = f
            .service
            .reprint_single_label(&ReprintSingleLabelRequest { order_custom_id: 8 })
            .await
            .unwrap();

        assert_eq!(summary.units_attempted, 0);
        assert_eq!(summary.items_checkpointed, 0);
        assert_eq!(f.render.rendered_count(), 0);
        assert_eq!(f.repository.write_count(), 0);
    }
}
