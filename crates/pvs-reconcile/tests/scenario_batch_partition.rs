//! Scenario: batch assembly is an order-preserving, size-bounded partition.

use std::num::NonZeroUsize;

use proptest::prelude::*;
use pvs_reconcile::{assemble, Batch, Field, Record};

fn candidates(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record::new(1_718_000_000 + i as i64 * 300).with(Field::Energy, 10.0 * i as f64))
        .collect()
}

#[test]
fn thirty_five_candidates_with_limit_thirty() {
    let batches = assemble(candidates(35), NonZeroUsize::new(30).unwrap());
    let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
    assert_eq!(sizes, vec![30, 5]);
    assert_eq!(batches[0].first_timestamp(), Some(1_718_000_000));
    assert_eq!(batches[1].last_timestamp(), Some(1_718_000_000 + 34 * 300));
}

proptest! {
    #[test]
    fn partition_is_bounded_and_order_preserving(n in 0usize..250, size in 1usize..120) {
        let input = candidates(n);
        let batches = assemble(input.clone(), NonZeroUsize::new(size).unwrap());

        prop_assert_eq!(batches.len(), n.div_ceil(size));
        for (i, b) in batches.iter().enumerate() {
            prop_assert_eq!(b.index(), i);
            prop_assert!(b.len() <= size);
            // Only the last batch may be short.
            if i + 1 < batches.len() {
                prop_assert_eq!(b.len(), size);
            }
        }

        let flat: Vec<Record> = batches.into_iter().flat_map(Batch::into_records).collect();
        prop_assert_eq!(flat, input);
    }
}
