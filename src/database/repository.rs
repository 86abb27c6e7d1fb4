//! # Order Repository Contract
//!
//! The system of record for order items. The pipeline reads pending items through this
//! trait and writes every status transition and history row back through it.
//!
//! Reads and writes that fail here are run-fatal: callers propagate them instead of
//! isolating them per unit.

use crate::constants::{OrderCustomStatus, Station};
use crate::error::Result;
use crate::models::{
    BatchDocumentUpdate, BatchHistoryRecord, ImageItemUpdate, OrderItem, ProductionUrlCheck,
};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Pull newly placed orders into the order custom table
    async fn populate_custom_orders(&self) -> Result<()>;

    /// Assign ready image items to sheets and printers
    async fn assign_batches(&self) -> Result<()>;

    /// Image items whose production URL has not been confirmed yet
    async fn fetch_items_for_production_url_check(&self) -> Result<Vec<ProductionUrlCheck>>;

    /// Mark production URLs as confirmed reachable
    async fn update_production_url_status(&self, ids: &[i64]) -> Result<()>;

    /// Image items assigned to a sheet and not yet printed, in sheet order
    async fn fetch_pending_image_batch_items(&self) -> Result<Vec<OrderItem>>;

    /// Items whose label has not been printed yet
    async fn fetch_pending_label_items(&self) -> Result<Vec<OrderItem>>;

    /// Every item printed on the sheet identified by `batch_guid`
    async fn fetch_items_by_batch_guid(&self, batch_guid: Uuid) -> Result<Vec<OrderItem>>;

    async fn fetch_item_by_id(&self, id: i64) -> Result<Option<OrderItem>>;

    /// Move items to `status`, and to `station` when one is given
    async fn update_item_status(
        &self,
        ids: &[i64],
        status: OrderCustomStatus,
        station: Option<Station>,
    ) -> Result<()>;

    /// Per-item status, print count and header updates for printed sheets
    async fn update_image_items(&self, updates: &[ImageItemUpdate]) -> Result<()>;

    async fn append_station_history(&self, ids: &[i64], station: Station) -> Result<()>;

    async fn append_batch_history(&self, records: &[BatchHistoryRecord]) -> Result<()>;

    async fn update_batch_document_url(&self, updates: &[BatchDocumentUpdate]) -> Result<()>;

    /// Number of order custom rows, used as a liveness probe
    async fn health_check(&self) -> Result<i64>;
}
