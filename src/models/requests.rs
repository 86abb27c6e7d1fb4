//! # Trigger Requests
//!
//! Bodies accepted by the on-demand trigger endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reprint every label that belongs to one sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprintSheetLabelRequest {
    pub batch_guid: Uuid,
}

/// Redeliver an already rendered sheet document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprintSheetRequest {
    pub batch_id: i64,
    pub batch_guid: Uuid,
    pub file_url: String,
    pub printer_no: i32,
}

/// Reprint the label of a single item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprintSingleLabelRequest {
    pub order_custom_id: i64,
}
