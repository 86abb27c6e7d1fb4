mod common;

use common::strategies::*;
use print_fulfillment_core::orchestration::BatchGrouper;
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    /// Property: every item lands in exactly one group, and only with items of its key
    #[test]
    fn grouping_partitions_items_by_key(items in order_items_strategy(40), batch_size in 1usize..6) {
        let groups = BatchGrouper::new(batch_size).group(items.clone(), false);

        let grouped: Vec<i64> = groups.iter().flat_map(|group| group.member_ids()).collect();
        let unique: HashSet<i64> = grouped.iter().copied().collect();
        prop_assert_eq!(grouped.len(), items.len());
        prop_assert_eq!(unique.len(), items.len());

        for group in &groups {
            prop_assert!(!group.is_empty());
            prop_assert!(group.items.iter().all(|item| item.batch_key() == group.key));
        }

        let keys: HashSet<_> = groups.iter().map(|group| group.key).collect();
        prop_assert_eq!(keys.len(), groups.len());
    }

    /// Property: groups follow first appearance and members keep input order
    #[test]
    fn grouping_preserves_input_order(items in order_items_strategy(40)) {
        let groups = BatchGrouper::new(15).group(items.clone(), false);

        let mut first_seen = Vec::new();
        for item in &items {
            if !first_seen.contains(&item.batch_key()) {
                first_seen.push(item.batch_key());
            }
        }
        let group_keys: Vec<_> = groups.iter().map(|group| group.key).collect();
        prop_assert_eq!(group_keys, first_seen);

        for group in &groups {
            let ids = group.member_ids();
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            // Ids are assigned in input order, so input order means ascending ids
            prop_assert_eq!(ids, sorted);
        }
    }

    /// Property: the full-batch policy keeps exactly the groups of batch_size items
    #[test]
    fn only_full_batches_keeps_exact_sizes(items in order_items_strategy(40), batch_size in 1usize..6) {
        let grouper = BatchGrouper::new(batch_size);
        let all = grouper.group(items.clone(), false);
        let full = grouper.group(items, true);

        prop_assert!(full.iter().all(|group| group.len() == batch_size));
        let expected: Vec<_> = all.into_iter().filter(|group| group.len() == batch_size).collect();
        prop_assert_eq!(full, expected);
    }
}
