//! # Render Models
//!
//! Outbound document requests and their results.
//!
//! A [`RenderUnit`] is one document: either a sheet (many items embedded as sub-items) or
//! a single label. The payload structs serialize to the JSON the rendering service expects;
//! routing data (template, destination folder, member ids) stays outside the payload.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sub-item embedded in a sheet document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetItemPayload {
    #[serde(rename = "item_no")]
    pub item_number: String,
    #[serde(rename = "document_id", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub remake: bool,
}

/// Request body for a sheet document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPayload {
    pub sheet_no: i64,
    pub batch_guid: Uuid,
    pub items: Vec<SheetItemPayload>,
}

/// Product option printed on a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelOption {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type", default)]
    pub option_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_value: Option<String>,
}

/// Request body for a label document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPayload {
    #[serde(rename = "production_Url", skip_serializing_if = "Option::is_none")]
    pub production_url: Option<String>,
    pub options: Vec<LabelOption>,
    #[serde(rename = "textoptions")]
    pub text_options: Vec<LabelOption>,
    pub order_id: i32,
    pub customer_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_info: Option<String>,
    pub item_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// One sheet: every item of a single batch key
#[derive(Debug, Clone, PartialEq)]
pub struct SheetUnit {
    pub template_id: String,
    pub printer: String,
    /// Member item ids in source order
    pub member_ids: Vec<i64>,
    pub payload: SheetPayload,
}

/// One label for one item
#[derive(Debug, Clone, PartialEq)]
pub struct LabelUnit {
    pub template_id: String,
    pub printer: String,
    pub order_custom_id: i64,
    pub order_custom_guid: Uuid,
    pub payload: LabelPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderUnit {
    Sheet(SheetUnit),
    Label(LabelUnit),
}

impl RenderUnit {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderUnit::Sheet(_) => "sheet",
            RenderUnit::Label(_) => "label",
        }
    }

    pub fn template_id(&self) -> &str {
        match self {
            RenderUnit::Sheet(sheet) => &sheet.template_id,
            RenderUnit::Label(label) => &label.template_id,
        }
    }

    /// Destination printer folder
    pub fn destination(&self) -> &str {
        match self {
            RenderUnit::Sheet(sheet) => &sheet.printer,
            RenderUnit::Label(label) => &label.printer,
        }
    }

    pub fn member_ids(&self) -> Vec<i64> {
        match self {
            RenderUnit::Sheet(sheet) => sheet.member_ids.clone(),
            RenderUnit::Label(label) => vec![label.order_custom_id],
        }
    }

    /// Deterministic name of the delivered artifact
    pub fn delivery_target(&self) -> DeliveryTarget {
        match self {
            RenderUnit::Sheet(sheet) => DeliveryTarget {
                guid: sheet.payload.batch_guid,
                sequence_no: Some(sheet.payload.sheet_no),
            },
            RenderUnit::Label(label) => DeliveryTarget {
                guid: label.order_custom_guid,
                sequence_no: None,
            },
        }
    }

    /// JSON body sent to the rendering service
    pub fn request_body(&self) -> Result<serde_json::Value> {
        let body = match self {
            RenderUnit::Sheet(sheet) => serde_json::to_value(&sheet.payload)?,
            RenderUnit::Label(label) => serde_json::to_value(&label.payload)?,
        };
        Ok(body)
    }
}

/// Identity used to name a delivered artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub guid: Uuid,
    /// Sheet number for multi-item sheets
    pub sequence_no: Option<i64>,
}

impl DeliveryTarget {
    /// `[{sequence}]{guid}.pdf` for sheets, `{guid}.pdf` otherwise
    pub fn file_name(&self) -> String {
        match self.sequence_no {
            Some(sequence_no) => format!("[{sequence_no}]{}.pdf", self.guid),
            None => format!("{}.pdf", self.guid),
        }
    }
}

/// Response of the rendering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub transaction_ref: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A rendered document ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub document_url: String,
    pub template_id: Option<String>,
    pub transaction_ref: Option<String>,
}

/// Proof that a unit was rendered and delivered
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    pub unit_guid: Uuid,
    /// Sheet number, present for sheets only
    pub sheet_no: Option<i64>,
    pub member_ids: Vec<i64>,
    pub document_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sheet_unit() -> RenderUnit {
        RenderUnit::Sheet(SheetUnit {
            template_id: "sheet-tpl".to_string(),
            printer: "Printer1".to_string(),
            member_ids: vec![3, 1, 2],
            payload: SheetPayload {
                sheet_no: 77,
                batch_guid: Uuid::nil(),
                items: vec![SheetItemPayload {
                    item_number: "[77] item".to_string(),
                    document_id: Some("BC-1".to_string()),
                    item_description: None,
                    image: Some("https://img/1.png".to_string()),
                    remake: true,
                }],
            },
        })
    }

    #[test]
    fn test_sheet_request_body_shape() {
        let body = sheet_unit().request_body().unwrap();
        assert_eq!(
            body,
            json!({
                "sheetNo": 77,
                "batchGuid": "00000000-0000-0000-0000-000000000000",
                "items": [{
                    "item_no": "[77] item",
                    "document_id": "BC-1",
                    "image": "https://img/1.png",
                    "remake": true
                }]
            })
        );
    }

    #[test]
    fn test_delivery_file_names() {
        let sheet_target = sheet_unit().delivery_target();
        assert_eq!(
            sheet_target.file_name(),
            "[77]00000000-0000-0000-0000-000000000000.pdf"
        );

        let label_target = DeliveryTarget {
            guid: Uuid::nil(),
            sequence_no: None,
        };
        assert_eq!(
            label_target.file_name(),
            "00000000-0000-0000-0000-000000000000.pdf"
        );
    }

    #[test]
    fn test_member_ids_keep_source_order() {
        assert_eq!(sheet_unit().member_ids(), vec![3, 1, 2]);
        assert_eq!(sheet_unit().destination(), "Printer1");
        assert_eq!(sheet_unit().kind(), "sheet");
    }

    #[test]
    fn test_render_response_tolerates_missing_fields() {
        let response: RenderResponse =
            serde_json::from_value(json!({"download_url": "https://pdf/1", "status": "success"}))
                .unwrap();
        assert_eq!(response.download_url.as_deref(), Some("https://pdf/1"));
        assert!(response.transaction_ref.is_none());
    }
}
