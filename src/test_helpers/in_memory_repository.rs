//! In-memory [`OrderRepository`] for pipeline tests.
//!
//! Pending fetches approximate the stored routines:
//!
//! - image batch items: image items assigned to a sheet and not yet printed
//! - label items: image items already printed on a sheet, plus any other item not yet
//!   printed
//!
//! Every call is recorded by name, and writes can be made to fail on demand.

use crate::constants::pipeline::STATION_HISTORY_USER;
use crate::constants::{OrderCustomStatus, OrderCustomType, Station};
use crate::database::OrderRepository;
use crate::error::{FulfillmentError, Result};
use crate::models::{
    BatchDocumentUpdate, BatchHistoryRecord, ImageItemUpdate, OrderItem, ProductionUrlCheck,
    StationHistoryRecord,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    items: Vec<OrderItem>,
    url_checks: Vec<ProductionUrlCheck>,
    production_url_updates: Vec<Vec<i64>>,
    batch_history: Vec<BatchHistoryRecord>,
    station_history: Vec<StationHistoryRecord>,
    batch_documents: Vec<BatchDocumentUpdate>,
    calls: Vec<&'static str>,
    write_count: usize,
    fail_writes: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    state: Mutex<State>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<OrderItem>) -> Self {
        let repository = Self::new();
        repository.state.lock().items = items;
        repository
    }

    pub fn with_url_checks(self, checks: Vec<ProductionUrlCheck>) -> Self {
        self.state.lock().url_checks = checks;
        self
    }

    /// Make every subsequent write fail with a repository error
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    pub fn item(&self, id: i64) -> Option<OrderItem> {
        self.state.lock().items.iter().find(|item| item.id == id).cloned()
    }

    pub fn items(&self) -> Vec<OrderItem> {
        self.state.lock().items.clone()
    }

    pub fn batch_history(&self) -> Vec<BatchHistoryRecord> {
        self.state.lock().batch_history.clone()
    }

    pub fn station_history(&self) -> Vec<StationHistoryRecord> {
        self.state.lock().station_history.clone()
    }

    /// `(batch_id, file_url)` for every document URL update
    pub fn batch_documents(&self) -> Vec<(i64, String)> {
        self.state
            .lock()
            .batch_documents
            .iter()
            .map(|update| (update.batch_id, update.file_url.clone()))
            .collect()
    }

    pub fn production_url_updates(&self) -> Vec<Vec<i64>> {
        self.state.lock().production_url_updates.clone()
    }

    /// Names of every repository call, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    /// Number of write calls that reached the repository
    pub fn write_count(&self) -> usize {
        self.state.lock().write_count
    }

    fn record_call(&self, operation: &'static str) {
        self.state.lock().calls.push(operation);
    }

    fn record_read(&self, operation: &'static str) -> parking_lot::MutexGuard<'_, State> {
        let mut state = self.state.lock();
        state.calls.push(operation);
        state
    }

    fn record_write(&self, operation: &'static str) -> Result<parking_lot::MutexGuard<'_, State>> {
        let mut state = self.state.lock();
        state.calls.push(operation);
        state.write_count += 1;
        if state.fail_writes {
            return Err(FulfillmentError::repository(operation, "injected write failure"));
        }
        Ok(state)
    }
}

fn is_pending_sheet_item(item: &OrderItem) -> bool {
    item.custom_type_id == OrderCustomType::Image
        && item.printer_batch_guid != Uuid::nil()
        && !item.custom_status_id.is_printed()
}

fn is_pending_label_item(item: &OrderItem) -> bool {
    match item.custom_type_id {
        OrderCustomType::Image => item.custom_status_id == OrderCustomStatus::Printed,
        _ => !item.custom_status_id.is_printed(),
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn populate_custom_orders(&self) -> Result<()> {
        self.record_call("populate_custom_orders");
        Ok(())
    }

    async fn assign_batches(&self) -> Result<()> {
        self.record_call("assign_batches");
        Ok(())
    }

    async fn fetch_items_for_production_url_check(&self) -> Result<Vec<ProductionUrlCheck>> {
        let state = self.record_read("fetch_items_for_production_url_check");
        Ok(state.url_checks.clone())
    }

    async fn update_production_url_status(&self, ids: &[i64]) -> Result<()> {
        let mut state = self.record_write("update_production_url_status")?;
        state.production_url_updates.push(ids.to_vec());
        state.url_checks.retain(|check| !ids.contains(&check.id));
        Ok(())
    }

    async fn fetch_pending_image_batch_items(&self) -> Result<Vec<OrderItem>> {
        let state = self.record_read("fetch_pending_image_batch_items");
        Ok(state
            .items
            .iter()
            .filter(|item| is_pending_sheet_item(item))
            .cloned()
            .collect())
    }

    async fn fetch_pending_label_items(&self) -> Result<Vec<OrderItem>> {
        let state = self.record_read("fetch_pending_label_items");
        Ok(state
            .items
            .iter()
            .filter(|item| is_pending_label_item(item))
            .cloned()
            .collect())
    }

    async fn fetch_items_by_batch_guid(&self, batch_guid: Uuid) -> Result<Vec<OrderItem>> {
        let state = self.record_read("fetch_items_by_batch_guid");
        Ok(state
            .items
            .iter()
            .filter(|item| item.printer_batch_guid == batch_guid)
            .cloned()
            .collect())
    }

    async fn fetch_item_by_id(&self, id: i64) -> Result<Option<OrderItem>> {
        let state = self.record_read("fetch_item_by_id");
        Ok(state.items.iter().find(|item| item.id == id).cloned())
    }

    async fn update_item_status(
        &self,
        ids: &[i64],
        status: OrderCustomStatus,
        station: Option<Station>,
    ) -> Result<()> {
        let mut state = self.record_write("update_item_status")?;
        for item in state.items.iter_mut().filter(|item| ids.contains(&item.id)) {
            item.custom_status_id = status;
            if let Some(station) = station {
                item.current_station_id = station;
            }
        }
        Ok(())
    }

    async fn update_image_items(&self, updates: &[ImageItemUpdate]) -> Result<()> {
        let mut state = self.record_write("update_image_items")?;
        for update in updates {
            if let Some(item) = state.items.iter_mut().find(|item| item.id == update.id) {
                item.custom_status_id = update.custom_status_id;
                item.print_count = update.print_count;
                item.item_header = Some(update.item_header.clone());
            }
        }
        Ok(())
    }

    async fn append_station_history(&self, ids: &[i64], station: Station) -> Result<()> {
        let mut state = self.record_write("append_station_history")?;
        let now = Utc::now();
        state
            .station_history
            .extend(ids.iter().map(|id| StationHistoryRecord {
                order_custom_id: *id,
                order_station_id: station,
                station_user_name: STATION_HISTORY_USER.to_string(),
                created_date_utc: now,
            }));
        Ok(())
    }

    async fn append_batch_history(&self, records: &[BatchHistoryRecord]) -> Result<()> {
        let mut state = self.record_write("append_batch_history")?;
        state.batch_history.extend_from_slice(records);
        Ok(())
    }

    async fn update_batch_document_url(&self, updates: &[BatchDocumentUpdate]) -> Result<()> {
        let mut state = self.record_write("update_batch_document_url")?;
        state.batch_documents.extend_from_slice(updates);
        Ok(())
    }

    async fn health_check(&self) -> Result<i64> {
        let state = self.record_read("health_check");
        Ok(state.items.len() as i64)
    }
}
