//! pvs-testkit
//!
//! Deterministic in-memory collaborators for driving a full reconciliation
//! run without SQLite or the network.
//!
//! - [`MemArchive`]: local records, with an optional read failure.
//! - [`FakePvOutput`]: remote history *and* uploader. Acknowledged uploads are
//!   appended to its history, so a second run sees them.
//! - [`ScriptedPrompt`]: replays operator answers; quits when it runs out.

mod archive;
mod prompt;
mod remote;

pub use archive::MemArchive;
pub use prompt::ScriptedPrompt;
pub use remote::{FakePvOutput, UploadOutcome};

use chrono::NaiveDate;
use pvs_reconcile::{Field, Instant, ReconcileDay, Record};

/// 2024-06-01T00:00:00Z
pub const DAY_START: Instant = 1_717_200_000;

/// Archive interval used by the helpers.
pub const INTERVAL_SECS: i64 = 300;

/// 2024-06-01 in UTC.
pub fn test_day() -> ReconcileDay {
    ReconcileDay {
        date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default(),
        start: DAY_START,
        end: DAY_START + pvs_reconcile::SECS_PER_DAY,
    }
}

/// A record with energy and grid power set.
pub fn sample_record(ts: Instant) -> Record {
    Record::new(ts)
        .with(Field::Energy, ((ts - DAY_START) / INTERVAL_SECS) as f64 * 10.0)
        .with(Field::GridPower, 500.0)
}

/// `n` records on the interval grid, starting `first` intervals into the day.
pub fn records_on_grid(first: i64, n: usize) -> Vec<Record> {
    (0..n as i64)
        .map(|i| sample_record(DAY_START + (first + i) * INTERVAL_SECS))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_helpers() {
        let recs = records_on_grid(1, 3);
        let ts: Vec<Instant> = recs.iter().map(Record::timestamp).collect();
        assert_eq!(ts, vec![DAY_START + 300, DAY_START + 600, DAY_START + 900]);
        assert!(recs.iter().all(|r| r.has(Field::Energy)));
        assert!(test_day().contains(DAY_START));
    }
}
