//! # Batch Grouper
//!
//! Groups pending image items into sheets by [`BatchKey`]. Pure: no I/O, no errors.
//!
//! Groups come out in the order their first member appeared in the input, and members keep
//! their input order inside a group. With `only_full_batches` set, a group survives only when
//! its size equals the configured batch size exactly; partial sheets wait for a later run.

use crate::config::{ApiTemplateConfig, PipelineConfig, PrinterConfig};
use crate::models::{BatchKey, OrderItem, RenderUnit, SheetItemPayload, SheetPayload, SheetUnit};
use std::collections::HashMap;

/// Items sharing one batch key
#[derive(Debug, Clone, PartialEq)]
pub struct BatchGroup {
    pub key: BatchKey,
    pub items: Vec<OrderItem>,
}

impl BatchGroup {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn member_ids(&self) -> Vec<i64> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// Sheet document for this group
    pub fn to_sheet_unit(&self, template_id: &str, printers: &PrinterConfig) -> SheetUnit {
        let items = self
            .items
            .iter()
            .map(|item| SheetItemPayload {
                item_number: item.sheet_item_number(),
                document_id: item.barcode.clone(),
                item_description: item.item_description.clone(),
                image: item.image_url.clone(),
                remake: item.remake,
            })
            .collect();

        SheetUnit {
            template_id: template_id.to_string(),
            printer: printers.sheet_printer(self.key.printer_no).to_string(),
            member_ids: self.member_ids(),
            payload: SheetPayload {
                sheet_no: self.key.batch_id.unwrap_or(0),
                batch_guid: self.key.batch_guid,
                items,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchGrouper {
    batch_size: usize,
}

impl BatchGrouper {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_full(&self, group: &BatchGroup) -> bool {
        group.len() == self.batch_size
    }

    pub fn group(&self, items: Vec<OrderItem>, only_full_batches: bool) -> Vec<BatchGroup> {
        let mut positions: HashMap<BatchKey, usize> = HashMap::new();
        let mut groups: Vec<BatchGroup> = Vec::new();

        for item in items {
            let key = item.batch_key();
            match positions.get(&key) {
                Some(&index) => groups[index].items.push(item),
                None => {
                    positions.insert(key, groups.len());
                    groups.push(BatchGroup {
                        key,
                        items: vec![item],
                    });
                }
            }
        }

        if only_full_batches {
            groups.retain(|group| self.is_full(group));
        }

        groups
    }

    /// One sheet render unit per retained group
    pub fn group_into_units(
        &self,
        items: Vec<OrderItem>,
        only_full_batches: bool,
        templates: &ApiTemplateConfig,
        printers: &PrinterConfig,
    ) -> Vec<RenderUnit> {
        self.group(items, only_full_batches)
            .iter()
            .map(|group| RenderUnit::Sheet(group.to_sheet_unit(&templates.sheet_template_id, printers)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::OrderItemBuilder;
    use uuid::Uuid;

    fn batch(count: usize, id_offset: i64, batch_id: i64, guid: Uuid, printer_no: i32) -> Vec<OrderItem> {
        (0..count as i64)
            .map(|i| {
                OrderItemBuilder::new(id_offset + i)
                    .batch(Some(batch_id), guid, printer_no)
                    .build()
            })
            .collect()
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert!(BatchGrouper::new(15).group(Vec::new(), true).is_empty());
        assert!(BatchGrouper::new(15).group(Vec::new(), false).is_empty());
    }

    #[test]
    fn test_full_batch_filter() {
        let grouper = BatchGrouper::new(15);
        let mut items = batch(14, 1, 10, Uuid::new_v4(), 1);
        items.extend(batch(15, 100, 11, Uuid::new_v4(), 2));

        let full_only = grouper.group(items.clone(), true);
        assert_eq!(full_only.len(), 1);
        assert_eq!(full_only[0].key.batch_id, Some(11));

        let everything = grouper.group(items, false);
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn test_oversized_group_is_not_full() {
        let grouper = BatchGrouper::new(15);
        let groups = grouper.group(batch(16, 1, 10, Uuid::new_v4(), 1), true);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_groups_keep_first_seen_order_and_member_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let items = vec![
            OrderItemBuilder::new(5).batch(Some(2), b, 1).build(),
            OrderItemBuilder::new(3).batch(Some(1), a, 1).build(),
            OrderItemBuilder::new(9).batch(Some(2), b, 1).build(),
            OrderItemBuilder::new(1).batch(Some(1), a, 1).build(),
        ];

        let groups = BatchGrouper::new(2).group(items, false);
        assert_eq!(groups[0].member_ids(), vec![5, 9]);
        assert_eq!(groups[1].member_ids(), vec![3, 1]);
    }

    #[test]
    fn test_printer_number_splits_groups() {
        let guid = Uuid::new_v4();
        let items = vec![
            OrderItemBuilder::new(1).batch(Some(1), guid, 1).build(),
            OrderItemBuilder::new(2).batch(Some(1), guid, 2).build(),
        ];
        assert_eq!(BatchGrouper::new(1).group(items, true).len(), 2);
    }

    #[test]
    fn test_sheet_unit_shape() {
        let guid = Uuid::new_v4();
        let item = OrderItemBuilder::new(7)
            .batch(None, guid, 3)
            .image_url("https://img/7.png")
            .barcode("BC-7")
            .description("Mug 11oz")
            .remake(true)
            .build();
        let item_guid = item.guid;

        let printers = PrinterConfig {
            printer1: "P1".to_string(),
            printer2: "P2".to_string(),
            ..Default::default()
        };
        let group = BatchGroup {
            key: item.batch_key(),
            items: vec![item],
        };

        let unit = group.to_sheet_unit("sheet-tpl", &printers);
        assert_eq!(unit.printer, "P2");
        assert_eq!(unit.payload.sheet_no, 0);
        assert_eq!(unit.payload.batch_guid, guid);
        assert_eq!(unit.member_ids, vec![7]);
        assert_eq!(unit.payload.items[0].item_number, format!("[] {item_guid}"));
        assert_eq!(unit.payload.items[0].document_id.as_deref(), Some("BC-7"));
        assert!(unit.payload.items[0].remake);
    }
}
