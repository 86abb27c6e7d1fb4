//! # Status Checkpointer
//!
//! Writes the durable proof that delivered items are done, so the next run's pending fetches
//! no longer return them.
//!
//! Every checkpoint pairs a status write with an append-only history write. The writes for one
//! receipt set touch disjoint targets and are issued concurrently; the call returns only once
//! all of them have completed. Any write failure propagates and aborts the run.
//!
//! | Mode           | Status         | Station   | History                     |
//! |----------------|----------------|-----------|-----------------------------|
//! | `SheetPrinted` | `Printed`      | unchanged | batch history + sheet URL   |
//! | `LabelPrinted` | `LabelPrinted` | station 1 | station history             |
//! | `LabelReprint` | `Reprint`      | station 1 | station history             |

use crate::constants::{OrderCustomStatus, Station};
use crate::database::OrderRepository;
use crate::error::{FulfillmentError, Result};
use crate::logging::log_checkpoint_operation;
use crate::models::{
    BatchDocumentUpdate, BatchHistoryRecord, DeliveryReceipt, ImageItemUpdate, OrderItem,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointMode {
    SheetPrinted,
    LabelPrinted,
    LabelReprint,
}

impl CheckpointMode {
    pub fn status(&self) -> OrderCustomStatus {
        match self {
            CheckpointMode::SheetPrinted => OrderCustomStatus::Printed,
            CheckpointMode::LabelPrinted => OrderCustomStatus::LabelPrinted,
            CheckpointMode::LabelReprint => OrderCustomStatus::Reprint,
        }
    }
}

/// Receives the receipts of each completed chunk
#[async_trait]
pub trait ReceiptSink: Send + Sync {
    /// Persist `receipts`; returns how many items were checkpointed
    async fn commit(&self, receipts: &[DeliveryReceipt]) -> Result<usize>;
}

pub struct StatusCheckpointer {
    repository: Arc<dyn OrderRepository>,
}

impl std::fmt::Debug for StatusCheckpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusCheckpointer").finish_non_exhaustive()
    }
}

impl StatusCheckpointer {
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }

    /// Checkpoint delivered sheets. `snapshots` supplies each member's descriptive fields
    /// as they were fetched at the start of the run.
    pub async fn checkpoint_sheets(
        &self,
        receipts: &[DeliveryReceipt],
        snapshots: &HashMap<i64, OrderItem>,
    ) -> Result<usize> {
        if receipts.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        let now = Utc::now();
        let status = CheckpointMode::SheetPrinted.status();

        // Every member must be written, or its sheet would be marked printed without it
        let printed: Vec<&OrderItem> = receipts
            .iter()
            .flat_map(|receipt| receipt.member_ids.iter())
            .map(|id| {
                snapshots.get(id).ok_or_else(|| {
                    FulfillmentError::repository(
                        "checkpoint_sheets",
                        format!("delivered item {id} has no snapshot"),
                    )
                })
            })
            .collect::<Result<_>>()?;

        let item_updates: Vec<ImageItemUpdate> = printed
            .iter()
            .map(|item| ImageItemUpdate {
                id: item.id,
                custom_status_id: status,
                print_count: item.print_count + 1,
                item_header: item.printed_item_header(),
            })
            .collect();

        let history: Vec<BatchHistoryRecord> = printed
            .iter()
            .map(|item| BatchHistoryRecord {
                custom_status_id: status,
                order_custom_id: item.id,
                order_custom_guid: item.guid,
                order_batch_id: item.batch_id,
                order_batch_guid: item.printer_batch_guid,
                image_url: item.image_url.clone(),
                barcode: item.barcode.clone(),
                item_header: Some(item.printed_item_header()),
                item_description: item.item_description.clone(),
                created_date_utc: now,
            })
            .collect();

        let documents: Vec<BatchDocumentUpdate> = receipts
            .iter()
            .filter_map(|receipt| {
                receipt.sheet_no.map(|batch_id| BatchDocumentUpdate {
                    batch_id,
                    file_url: receipt.document_url.clone(),
                    printed_date_utc: now,
                })
            })
            .collect();

        tokio::try_join!(
            self.repository.update_image_items(&item_updates),
            self.repository.append_batch_history(&history),
            self.repository.update_batch_document_url(&documents),
        )?;

        let ids: Vec<i64> = item_updates.iter().map(|update| update.id).collect();
        log_checkpoint_operation(
            "checkpoint_sheets",
            status.as_str(),
            &ids,
            "committed",
            Some(started.elapsed().as_millis() as u64),
        );

        Ok(ids.len())
    }

    /// Checkpoint delivered labels as printed or reprinted
    pub async fn checkpoint_labels(
        &self,
        receipts: &[DeliveryReceipt],
        mode: CheckpointMode,
    ) -> Result<usize> {
        let ids: Vec<i64> = receipts
            .iter()
            .flat_map(|receipt| receipt.member_ids.iter().copied())
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        let status = mode.status();
        let station = Station::Station1;

        tokio::try_join!(
            self.repository.update_item_status(&ids, status, Some(station)),
            self.repository.append_station_history(&ids, station),
        )?;

        log_checkpoint_operation(
            "checkpoint_labels",
            status.as_str(),
            &ids,
            "committed",
            Some(started.elapsed().as_millis() as u64),
        );

        Ok(ids.len())
    }
}

/// Checkpoints each chunk of delivered sheets
pub struct SheetReceiptSink<'a> {
    checkpointer: &'a StatusCheckpointer,
    snapshots: HashMap<i64, OrderItem>,
}

impl<'a> SheetReceiptSink<'a> {
    pub fn new(checkpointer: &'a StatusCheckpointer, items: &[OrderItem]) -> Self {
        let snapshots = items.iter().map(|item| (item.id, item.clone())).collect();
        Self {
            checkpointer,
            snapshots,
        }
    }
}

#[async_trait]
impl ReceiptSink for SheetReceiptSink<'_> {
    async fn commit(&self, receipts: &[DeliveryReceipt]) -> Result<usize> {
        self.checkpointer
            .checkpoint_sheets(receipts, &self.snapshots)
            .await
    }
}

/// Checkpoints each chunk of delivered labels
pub struct LabelReceiptSink<'a> {
    checkpointer: &'a StatusCheckpointer,
    mode: CheckpointMode,
}

impl<'a> LabelReceiptSink<'a> {
    pub fn new(checkpointer: &'a StatusCheckpointer, mode: CheckpointMode) -> Self {
        Self { checkpointer, mode }
    }
}

#[async_trait]
impl ReceiptSink for LabelReceiptSink<'_> {
    async fn commit(&self, receipts: &[DeliveryReceipt]) -> Result<usize> {
        self.checkpointer.checkpoint_labels(receipts, self.mode).await
    }
}
