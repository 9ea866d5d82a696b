use std::num::NonZeroUsize;

use crate::{Instant, Record};

/// A size-bounded, ordered group of candidate records. The unit of upload.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    index: usize,
    records: Vec<Record>,
}

impl Batch {
    /// Position of this batch in the run (0-based).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<Instant> {
        self.records.first().map(Record::timestamp)
    }

    pub fn last_timestamp(&self) -> Option<Instant> {
        self.records.last().map(Record::timestamp)
    }

    /// Attribute an acknowledged count to this batch's records in order.
    ///
    /// Returns `(published, unacknowledged)`. A count larger than the batch is
    /// clamped.
    pub fn split_acknowledged(&self, acknowledged: usize) -> (&[Record], &[Record]) {
        self.records.split_at(acknowledged.min(self.records.len()))
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Pack `accepted` into consecutive batches of `max_batch_size`, the last one
/// possibly shorter.
///
/// Records are moved, never cloned: once a record is in a batch nothing else
/// in the run can hand it to the uploader again.
pub fn assemble(accepted: Vec<Record>, max_batch_size: NonZeroUsize) -> Vec<Batch> {
    let size = max_batch_size.get();
    let mut batches = Vec::with_capacity(accepted.len().div_ceil(size));
    let mut rest = accepted.into_iter().peekable();
    while rest.peek().is_some() {
        let records: Vec<Record> = rest.by_ref().take(size).collect();
        batches.push(Batch {
            index: batches.len(),
            records,
        });
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(1_000 + i as i64 * 300).with(Field::Energy, i as f64))
            .collect()
    }

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn thirty_five_into_thirty_gives_thirty_and_five() {
        let batches = assemble(records(35), nz(30));
        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![30, 5]);
        assert_eq!(batches[1].index(), 1);
    }

    #[test]
    fn concatenation_preserves_input_order() {
        let input = records(17);
        for size in [1, 2, 5, 16, 17, 18, 100] {
            let batches = assemble(input.clone(), nz(size));
            assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));
            let flat: Vec<Record> = batches.into_iter().flat_map(Batch::into_records).collect();
            assert_eq!(flat, input, "size={size}");
        }
    }

    #[test]
    fn empty_input_gives_no_batches() {
        assert!(assemble(Vec::new(), nz(30)).is_empty());
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let sizes: Vec<usize> = assemble(records(60), nz(30)).iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![30, 30]);
    }

    #[test]
    fn acknowledged_count_is_attributed_in_order_and_clamped() {
        let batch = assemble(records(4), nz(4)).remove(0);
        let (ok, rest) = batch.split_acknowledged(3);
        assert_eq!(ok.len(), 3);
        assert_eq!(rest[0].timestamp(), batch.last_timestamp().unwrap());

        let (ok, rest) = batch.split_acknowledged(9);
        assert_eq!((ok.len(), rest.len()), (4, 0));
    }
}
