#![allow(dead_code)]

use print_fulfillment_core::config::FulfillmentConfig;
use print_fulfillment_core::models::OrderItem;
use print_fulfillment_core::orchestration::FulfillmentCoordinator;
use print_fulfillment_core::test_helpers::{
    test_config, InMemoryOrderRepository, OrderItemBuilder, ScriptedDeliveryClient,
    ScriptedRenderClient, ScriptedUrlProbe,
};
use std::sync::Arc;
use uuid::Uuid;

/// A coordinator over in-memory fakes, with handles to every fake
pub struct Harness {
    pub config: FulfillmentConfig,
    pub repository: Arc<InMemoryOrderRepository>,
    pub render: Arc<ScriptedRenderClient>,
    pub delivery: Arc<ScriptedDeliveryClient>,
    pub probe: Arc<ScriptedUrlProbe>,
    pub coordinator: Arc<FulfillmentCoordinator>,
}

impl Harness {
    pub fn new(items: Vec<OrderItem>) -> Self {
        Self::with_config(test_config(), items)
    }

    pub fn with_config(config: FulfillmentConfig, items: Vec<OrderItem>) -> Self {
        let repository = Arc::new(InMemoryOrderRepository::with_items(items));
        let render = Arc::new(ScriptedRenderClient::new());
        let delivery = Arc::new(ScriptedDeliveryClient::new());
        let probe = Arc::new(ScriptedUrlProbe::reachable());
        let coordinator = Arc::new(FulfillmentCoordinator::new(
            &config,
            repository.clone(),
            render.clone(),
            delivery.clone(),
            probe.clone(),
        ));

        Self {
            config,
            repository,
            render,
            delivery,
            probe,
            coordinator,
        }
    }
}

/// `count` image items on one sheet, ids starting at `first_id`
pub fn sheet_items(first_id: i64, count: i64, batch_id: i64, printer_no: i32) -> Vec<OrderItem> {
    let batch_guid = Uuid::new_v4();
    (first_id..first_id + count)
        .map(|id| {
            OrderItemBuilder::new(id)
                .batch(Some(batch_id), batch_guid, printer_no)
                .image_url(format!("https://img.test/{id}.png"))
                .barcode(format!("BC-{id}"))
                .build()
        })
        .collect()
}

/// A label-ready engrave item
pub fn engrave_item(id: i64) -> OrderItem {
    OrderItemBuilder::new(id)
        .custom_type(print_fulfillment_core::OrderCustomType::Engrave)
        .description(format!("SKU-{id} Brushed steel tag"))
        .attributes(r#"{"options":[{"name":"Font","value":"Serif","type":"dropdown"}]}"#)
        .build()
}
