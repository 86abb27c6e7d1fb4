//! # Checkpoint Write Models
//!
//! Rows written when delivered items are checkpointed. History rows are append-only:
//! the pipeline never updates or deletes them.

use crate::constants::{OrderCustomStatus, Station};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of an item at the moment its sheet was printed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchHistoryRecord {
    pub custom_status_id: OrderCustomStatus,
    pub order_custom_id: i64,
    pub order_custom_guid: Uuid,
    pub order_batch_id: Option<i64>,
    pub order_batch_guid: Uuid,
    pub image_url: Option<String>,
    pub barcode: Option<String>,
    pub item_header: Option<String>,
    pub item_description: Option<String>,
    pub created_date_utc: DateTime<Utc>,
}

/// Station arrival of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationHistoryRecord {
    pub order_custom_id: i64,
    pub order_station_id: Station,
    pub station_user_name: String,
    pub created_date_utc: DateTime<Utc>,
}

/// Mutable item fields advanced when a sheet is printed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageItemUpdate {
    pub id: i64,
    pub custom_status_id: OrderCustomStatus,
    pub print_count: i32,
    pub item_header: String,
}

/// Document URL recorded on a printed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDocumentUpdate {
    pub batch_id: i64,
    pub file_url: String,
    pub printed_date_utc: DateTime<Utc>,
}
