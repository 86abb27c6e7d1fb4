//! # Order Item Model
//!
//! A single customizable product line awaiting (or past) printing.
//!
//! ## Overview
//!
//! `OrderItem` carries the identity, classification, lifecycle status, batch affiliation
//! and rendering payload of one order custom row. The pipeline never deletes items; it only
//! moves them forward through status-transition writes issued by the checkpointer.
//!
//! ## Batch Affiliation
//!
//! Items that share `(batch_id, printer_batch_guid, printer_no)` belong to one printable
//! sheet. See [`BatchKey`].
//!
//! ## Database Schema
//!
//! Maps to the `order_custom` table. Read routines may return a subset of the columns
//! (the image batch routine omits shipping details), so every column has a default.

use crate::constants::{OrderCustomStatus, OrderCustomType, Station};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromRow)]
#[sqlx(default)]
pub struct OrderItem {
    pub id: i64,
    pub guid: Uuid,
    pub batch_id: Option<i64>,
    pub printer_batch_guid: Uuid,
    pub printer_no: i32,
    pub order_id: i32,
    pub customer_id: i32,
    pub custom_type_id: OrderCustomType,
    pub custom_status_id: OrderCustomStatus,
    pub current_station_id: Station,
    pub image_url: Option<String>,
    pub barcode: Option<String>,
    pub item_header: Option<String>,
    pub item_description: Option<String>,
    /// Raw JSON attribute set captured at checkout
    pub attributes: Option<String>,
    pub print_count: i32,
    pub remake: bool,
    pub billing_info: Option<String>,
    pub shipping_info: Option<String>,
    pub shipping_number: Option<String>,
    pub order_date: Option<NaiveDateTime>,
    pub shipping_country_code: Option<String>,
}

/// Composite key identifying one renderable sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchKey {
    pub batch_id: Option<i64>,
    pub batch_guid: Uuid,
    pub printer_no: i32,
}

impl OrderItem {
    pub fn batch_key(&self) -> BatchKey {
        BatchKey {
            batch_id: self.batch_id,
            batch_guid: self.printer_batch_guid,
            printer_no: self.printer_no,
        }
    }

    /// Item number printed next to the image on a sheet: `[batch] guid`
    pub fn sheet_item_number(&self) -> String {
        format!("[{}] {}", format_batch_id(self.batch_id), self.guid)
    }

    /// Header recorded on the item once its sheet is printed: `[batch]guid`
    pub fn printed_item_header(&self) -> String {
        format!("[{}]{}", format_batch_id(self.batch_id), self.guid)
    }
}

fn format_batch_id(batch_id: Option<i64>) -> String {
    batch_id.map(|id| id.to_string()).unwrap_or_default()
}

/// Image item whose production URL has not been confirmed reachable yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProductionUrlCheck {
    pub id: i64,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_key_groups_by_all_three_fields() {
        let guid = Uuid::new_v4();
        let a = OrderItem {
            id: 1,
            batch_id: Some(10),
            printer_batch_guid: guid,
            printer_no: 1,
            ..Default::default()
        };
        let b = OrderItem {
            id: 2,
            printer_no: 2,
            ..a.clone()
        };

        assert_eq!(a.batch_key(), OrderItem { id: 3, ..a.clone() }.batch_key());
        assert_ne!(a.batch_key(), b.batch_key());
    }

    #[test]
    fn test_item_headers() {
        let guid = Uuid::parse_str("5c3f0b64-8c0e-4d0a-9c7e-0f1d2e3a4b5c").unwrap();
        let item = OrderItem {
            id: 1,
            guid,
            batch_id: Some(42),
            ..Default::default()
        };

        assert_eq!(
            item.sheet_item_number(),
            "[42] 5c3f0b64-8c0e-4d0a-9c7e-0f1d2e3a4b5c"
        );
        assert_eq!(
            item.printed_item_header(),
            "[42]5c3f0b64-8c0e-4d0a-9c7e-0f1d2e3a4b5c"
        );

        let unbatched = OrderItem {
            batch_id: None,
            ..item
        };
        assert_eq!(
            unbatched.printed_item_header(),
            "[]5c3f0b64-8c0e-4d0a-9c7e-0f1d2e3a4b5c"
        );
    }
}
