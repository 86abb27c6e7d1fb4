//! # Label Builder
//!
//! Turns label-eligible items into single-item label render units.
//!
//! An item is excluded, never fatal, when its attributes or description are empty or when its
//! attributes are not valid JSON. Exclusions are logged with the item id and the rest of the
//! input keeps going.

use crate::config::{ApiTemplateConfig, PrinterConfig};
use crate::constants::{OrderCustomType, SELECTABLE_OPTION_TYPES, TEXT_OPTION_TYPES};
use crate::models::{LabelOption, LabelPayload, LabelUnit, OrderAttributes, OrderItem, RenderUnit};
use std::fmt;
use tracing::{error, warn};
use url::form_urlencoded;

/// Why an item produced no label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelExclusion {
    MissingAttributes,
    MissingDescription,
    MalformedAttributes(String),
}

impl fmt::Display for LabelExclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelExclusion::MissingAttributes => write!(f, "attributes are empty"),
            LabelExclusion::MissingDescription => write!(f, "item description is empty"),
            LabelExclusion::MalformedAttributes(reason) => {
                write!(f, "attributes are not valid JSON: {reason}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabelBuilder {
    engrave_template_id: String,
    image_template_id: String,
    engrave_printer: String,
    image_printer: String,
}

impl LabelBuilder {
    pub fn new(templates: &ApiTemplateConfig, printers: &PrinterConfig) -> Self {
        Self {
            engrave_template_id: templates.label_template_id.clone(),
            image_template_id: templates.image_label_template_id.clone(),
            engrave_printer: printers.engravable_label_printer.clone(),
            image_printer: printers.image_label_printer.clone(),
        }
    }

    /// Label units for every eligible item, in input order
    pub fn build_all(&self, items: &[OrderItem]) -> Vec<RenderUnit> {
        items
            .iter()
            .filter_map(|item| match self.build(item) {
                Ok(unit) => Some(RenderUnit::Label(unit)),
                Err(LabelExclusion::MalformedAttributes(reason)) => {
                    error!(
                        order_custom_id = item.id,
                        error = %reason,
                        "Unable to parse attributes, skipping label"
                    );
                    None
                }
                Err(exclusion) => {
                    warn!(
                        order_custom_id = item.id,
                        reason = %exclusion,
                        "Item not eligible for a label"
                    );
                    None
                }
            })
            .collect()
    }

    pub fn build(&self, item: &OrderItem) -> Result<LabelUnit, LabelExclusion> {
        let raw_attributes = match item.attributes.as_deref() {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(LabelExclusion::MissingAttributes),
        };
        let description = match item.item_description.as_deref() {
            Some(description) if !description.is_empty() => description,
            _ => return Err(LabelExclusion::MissingDescription),
        };

        let attributes = OrderAttributes::parse(raw_attributes)
            .map_err(|e| LabelExclusion::MalformedAttributes(e.to_string()))?;

        let (sku, remainder) = split_sku(description);
        let is_engrave = item.custom_type_id == OrderCustomType::Engrave;

        let payload = LabelPayload {
            production_url: item
                .image_url
                .clone()
                .or_else(|| attributes.production_url.clone()),
            options: select_options(&attributes.options, SELECTABLE_OPTION_TYPES),
            text_options: select_options(&attributes.options, TEXT_OPTION_TYPES),
            order_id: item.order_id,
            customer_id: item.customer_id,
            barcode: item.barcode.clone(),
            billing_info: item.billing_info.clone(),
            shipping_info: item.shipping_info.clone(),
            item_description: remainder,
            shipping_number: item.shipping_number.clone(),
            sheet_id: item.batch_id,
            order_date: item
                .order_date
                .map(|date| date.format("%m/%d/%y").to_string()),
            shipping_country_code: item.shipping_country_code.clone(),
            sku,
        };

        Ok(LabelUnit {
            template_id: if is_engrave {
                self.engrave_template_id.clone()
            } else {
                self.image_template_id.clone()
            },
            printer: if is_engrave {
                self.engrave_printer.clone()
            } else {
                self.image_printer.clone()
            },
            order_custom_id: item.id,
            order_custom_guid: item.guid,
            payload,
        })
    }
}

/// First space-separated word is the SKU, the rest is the printed description
fn split_sku(description: &str) -> (Option<String>, String) {
    let mut words = description.split(' ');
    let sku = words.next().map(str::to_string);
    let remainder = words.collect::<Vec<_>>().join(" ");
    (sku, remainder)
}

/// Options whose trimmed, lowercased type is in `types` and whose value is not blank
fn select_options(options: &[LabelOption], types: &[&str]) -> Vec<LabelOption> {
    options
        .iter()
        .filter(|option| {
            let option_type = option.option_type.trim().to_lowercase();
            types.contains(&option_type.as_str()) && !option.value.trim().is_empty()
        })
        .map(|option| LabelOption {
            name: option.name.clone(),
            value: option.value.clone(),
            option_type: option.option_type.clone(),
            encoded_value: Some(form_urlencoded::byte_serialize(option.value.as_bytes()).collect()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::OrderItemBuilder;
    use chrono::NaiveDate;

    fn builder() -> LabelBuilder {
        LabelBuilder::new(
            &ApiTemplateConfig {
                label_template_id: "engrave-tpl".to_string(),
                image_label_template_id: "image-tpl".to_string(),
                ..Default::default()
            },
            &PrinterConfig {
                image_label_printer: "ImageLabels".to_string(),
                engravable_label_printer: "EngraveLabels".to_string(),
                ..Default::default()
            },
        )
    }

    const ATTRIBUTES: &str = r#"{
        "productionUrl": "https://prod/1.png",
        "options": [
            {"name": "Color", "value": "Red", "type": " Dropdown "},
            {"name": "Finish", "value": "Matte", "type": "swatch"},
            {"name": "Size", "value": "   ", "type": "dropdown"},
            {"name": "Message", "value": "Happy Birthday & more", "type": "Text Input"},
            {"name": "Upload", "value": "file.png", "type": "file"}
        ]
    }"#;

    #[test]
    fn test_label_payload_from_item() {
        let item = OrderItemBuilder::new(42)
            .description("SKU-123 Custom Mug 11oz")
            .attributes(ATTRIBUTES)
            .barcode("BC-42")
            .order_date(
                NaiveDate::from_ymd_opt(2024, 3, 7)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap(),
            )
            .build();

        let unit = builder().build(&item).unwrap();
        let payload = &unit.payload;

        assert_eq!(unit.template_id, "image-tpl");
        assert_eq!(unit.printer, "ImageLabels");
        assert_eq!(payload.sku.as_deref(), Some("SKU-123"));
        assert_eq!(payload.item_description, "Custom Mug 11oz");
        assert_eq!(payload.order_date.as_deref(), Some("03/07/24"));
        assert_eq!(payload.production_url.as_deref(), Some("https://prod/1.png"));
        assert_eq!(payload.barcode.as_deref(), Some("BC-42"));

        let option_names: Vec<&str> = payload.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(option_names, vec!["Color", "Finish"]);

        assert_eq!(payload.text_options.len(), 1);
        assert_eq!(
            payload.text_options[0].encoded_value.as_deref(),
            Some("Happy+Birthday+%26+more")
        );
    }

    #[test]
    fn test_item_image_url_wins_over_attribute_url() {
        let item = OrderItemBuilder::new(1)
            .description("SKU")
            .attributes(ATTRIBUTES)
            .image_url("https://item/1.png")
            .build();

        let unit = builder().build(&item).unwrap();
        assert_eq!(unit.payload.production_url.as_deref(), Some("https://item/1.png"));
        assert_eq!(unit.payload.item_description, "");
    }

    #[test]
    fn test_engrave_items_use_engrave_template_and_printer() {
        let item = OrderItemBuilder::new(1)
            .custom_type(OrderCustomType::Engrave)
            .description("SKU ring")
            .attributes("{}")
            .build();

        let unit = builder().build(&item).unwrap();
        assert_eq!(unit.template_id, "engrave-tpl");
        assert_eq!(unit.printer, "EngraveLabels");
        assert!(unit.payload.options.is_empty());
    }

    #[test]
    fn test_exclusions() {
        let no_attributes = OrderItemBuilder::new(1).description("SKU").build();
        assert_eq!(
            builder().build(&no_attributes),
            Err(LabelExclusion::MissingAttributes)
        );

        let no_description = OrderItemBuilder::new(2).attributes("{}").build();
        assert_eq!(
            builder().build(&no_description),
            Err(LabelExclusion::MissingDescription)
        );

        let malformed = OrderItemBuilder::new(3)
            .description("SKU")
            .attributes("{not json")
            .build();
        assert!(matches!(
            builder().build(&malformed),
            Err(LabelExclusion::MalformedAttributes(_))
        ));
    }

    #[test]
    fn test_build_all_skips_ineligible_items() {
        let items = vec![
            OrderItemBuilder::new(1).description("SKU a").attributes("{}").build(),
            OrderItemBuilder::new(2).attributes("{oops").build(),
            OrderItemBuilder::new(3).description("SKU b").attributes("{bad").build(),
            OrderItemBuilder::new(4).description("SKU c").attributes("{}").build(),
        ];

        let ids: Vec<i64> = builder()
            .build_all(&items)
            .iter()
            .flat_map(|unit| unit.member_ids())
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
