use crate::{Epsilon, FuzzyTimestamp};

/// Local and remote timestamp collections for one day, ready to diff.
///
/// Both sides are sorted by raw instant on construction (stable, so local
/// duplicates keep their relative order). Membership is answered by a
/// pairwise scan of the sorted remote side bounded to
/// `[ts - epsilon, ts + epsilon]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationSet {
    local: Vec<FuzzyTimestamp>,
    remote: Vec<FuzzyTimestamp>,
}

impl ReconciliationSet {
    pub fn new(mut local: Vec<FuzzyTimestamp>, mut remote: Vec<FuzzyTimestamp>) -> Self {
        local.sort();
        remote.sort();
        Self { local, remote }
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    pub fn remote_len(&self) -> usize {
        self.remote.len()
    }

    /// `true` if some remote timestamp is equivalent to `ts`.
    pub fn is_published(&self, ts: FuzzyTimestamp, epsilon: Epsilon) -> bool {
        let lo = self.first_candidate(0, ts, epsilon);
        self.matches_from(lo, ts, epsilon)
    }

    /// Every local timestamp with no equivalent remote timestamp, ascending.
    ///
    /// Duplicates on the local side are kept: each is a distinct archive row.
    /// They share one instant, so they are either all covered or all missing.
    pub fn missing(&self, epsilon: Epsilon) -> Vec<FuzzyTimestamp> {
        let mut missing = Vec::new();
        let mut lo = 0;
        for &ts in &self.local {
            // Local is ascending, so the lower bound only ever moves forward.
            lo = self.first_candidate(lo, ts, epsilon);
            if !self.matches_from(lo, ts, epsilon) {
                missing.push(ts);
            }
        }
        missing
    }

    /// Index of the first remote entry not below `ts - epsilon`, starting the
    /// search at `from`.
    fn first_candidate(&self, from: usize, ts: FuzzyTimestamp, epsilon: Epsilon) -> usize {
        let floor = ts.instant().saturating_sub(epsilon.secs());
        let mut i = from;
        while i < self.remote.len() && self.remote[i].instant() < floor {
            i += 1;
        }
        i
    }

    fn matches_from(&self, lo: usize, ts: FuzzyTimestamp, epsilon: Epsilon) -> bool {
        let ceiling = ts.instant().saturating_add(epsilon.secs());
        for &r in &self.remote[lo..] {
            if r.instant() > ceiling {
                break;
            }
            if ts.equivalent(r, epsilon) {
                return true;
            }
        }
        false
    }
}

/// Convenience wrapper: local timestamps absent from `remote` under `epsilon`.
pub fn missing_timestamps(
    local: &[FuzzyTimestamp],
    remote: &[FuzzyTimestamp],
    epsilon: Epsilon,
) -> Vec<FuzzyTimestamp> {
    ReconciliationSet::new(local.to_vec(), remote.to_vec()).missing(epsilon)
}
