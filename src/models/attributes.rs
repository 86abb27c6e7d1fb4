//! # Order Attributes
//!
//! Structured attribute set stored as JSON text on an order item.

use super::render::LabelOption;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderAttributes {
    #[serde(rename = "productionUrl", default)]
    pub production_url: Option<String>,

    #[serde(default)]
    pub options: Vec<LabelOption>,
}

impl OrderAttributes {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attributes() {
        let attributes = OrderAttributes::parse(
            r#"{"productionUrl": "https://cdn/prod.png",
                "options": [{"name": "Color", "value": "Red", "type": "dropdown"}]}"#,
        )
        .unwrap();

        assert_eq!(
            attributes.production_url.as_deref(),
            Some("https://cdn/prod.png")
        );
        assert_eq!(attributes.options.len(), 1);
        assert_eq!(attributes.options[0].option_type, "dropdown");
    }

    #[test]
    fn test_malformed_attributes_fail() {
        assert!(OrderAttributes::parse("{not json").is_err());
        assert!(OrderAttributes::parse(r#"{"options": "nope"}"#).is_err());
    }
}
