#![allow(dead_code)]

use print_fulfillment_core::models::OrderItem;
use print_fulfillment_core::test_helpers::OrderItemBuilder;
use proptest::prelude::*;
use uuid::Uuid;

/// Batch key parts drawn from a small pool so that keys collide often
pub fn batch_key_parts_strategy() -> impl Strategy<Value = (Option<i64>, Uuid, i32)> {
    (
        prop::option::of(1i64..4),
        (1u128..4).prop_map(Uuid::from_u128),
        1i32..3,
    )
}

/// Items with unique ids `1..=n` in random key order
pub fn order_items_strategy(max_items: usize) -> impl Strategy<Value = Vec<OrderItem>> {
    prop::collection::vec(batch_key_parts_strategy(), 0..=max_items).prop_map(|keys| {
        keys.into_iter()
            .enumerate()
            .map(|(index, (batch_id, batch_guid, printer_no))| {
                OrderItemBuilder::new(index as i64 + 1)
                    .batch(batch_id, batch_guid, printer_no)
                    .build()
            })
            .collect()
    })
}
