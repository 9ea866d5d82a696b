use chrono::NaiveDate;
use serde::Serialize;

use crate::{Batch, FilterVerdict, Instant, InteractionMode, Record};

/// A record that did not make it to the remote, with the reason shown to the
/// operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordNotice {
    pub timestamp: Instant,
    pub reason: String,
}

/// End-of-run accounting for one reconciliation date.
///
/// Built up by the run driver and handed out by value when the run finishes;
/// from then on only the accessors are available.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    date: NaiveDate,
    mode: InteractionMode,
    local_found: usize,
    remote_found: usize,
    missing: usize,
    filtered_too_old: usize,
    filtered_no_data: usize,
    skipped: usize,
    accepted: usize,
    batches: usize,
    published: usize,
    failed: usize,
    quit: bool,
    skipped_records: Vec<RecordNotice>,
    failed_records: Vec<RecordNotice>,
}

impl ReconciliationReport {
    pub(crate) fn new(date: NaiveDate, mode: InteractionMode) -> Self {
        Self {
            date,
            mode,
            local_found: 0,
            remote_found: 0,
            missing: 0,
            filtered_too_old: 0,
            filtered_no_data: 0,
            skipped: 0,
            accepted: 0,
            batches: 0,
            published: 0,
            failed: 0,
            quit: false,
            skipped_records: Vec::new(),
            failed_records: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accumulation (driver only)
    // -----------------------------------------------------------------------

    pub(crate) fn record_found(&mut self, local: usize, remote: usize) {
        self.local_found = local;
        self.remote_found = remote;
    }

    pub(crate) fn record_missing(&mut self, n: usize) {
        self.missing = n;
    }

    pub(crate) fn record_filtered(&mut self, verdict: FilterVerdict) {
        match verdict {
            FilterVerdict::TooOld => self.filtered_too_old += 1,
            FilterVerdict::NoData => self.filtered_no_data += 1,
            FilterVerdict::Accept => {}
        }
    }

    pub(crate) fn record_skipped(&mut self, record: &Record) {
        self.skipped += 1;
        self.skipped_records.push(RecordNotice {
            timestamp: record.timestamp(),
            reason: "declined by operator".to_string(),
        });
    }

    pub(crate) fn record_accepted(&mut self, n: usize) {
        self.accepted = n;
    }

    pub(crate) fn mark_quit(&mut self) {
        self.quit = true;
    }

    /// Dry run: count the batch as if the remote took every record.
    pub(crate) fn record_simulated(&mut self, batch: &Batch) {
        self.batches += 1;
        self.published += batch.len();
    }

    pub(crate) fn record_acknowledged(&mut self, batch: &Batch, acknowledged: usize) {
        self.batches += 1;
        let (published, rest) = batch.split_acknowledged(acknowledged);
        self.published += published.len();
        self.push_failed(rest, "not acknowledged by remote");
    }

    pub(crate) fn record_failed_batch(&mut self, batch: &Batch, reason: &str) {
        self.batches += 1;
        self.push_failed(batch.records(), reason);
    }

    fn push_failed(&mut self, records: &[Record], reason: &str) {
        self.failed += records.len();
        self.failed_records
            .extend(records.iter().map(|r| RecordNotice {
                timestamp: r.timestamp(),
                reason: reason.to_string(),
            }));
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_dry_run(&self) -> bool {
        self.mode == InteractionMode::DryRun
    }

    pub fn local_found(&self) -> usize {
        self.local_found
    }

    pub fn remote_found(&self) -> usize {
        self.remote_found
    }

    pub fn missing(&self) -> usize {
        self.missing
    }

    pub fn filtered_too_old(&self) -> usize {
        self.filtered_too_old
    }

    pub fn filtered_no_data(&self) -> usize {
        self.filtered_no_data
    }

    pub fn filtered(&self) -> usize {
        self.filtered_too_old + self.filtered_no_data
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn published(&self) -> usize {
        self.published
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn quit(&self) -> bool {
        self.quit
    }

    pub fn skipped_records(&self) -> &[RecordNotice] {
        &self.skipped_records
    }

    pub fn failed_records(&self) -> &[RecordNotice] {
        &self.failed_records
    }

    /// One-line summary for the operator and the log.
    pub fn summary(&self) -> String {
        let verb = if self.is_dry_run() {
            "would publish"
        } else {
            "published"
        };
        let mut s = format!(
            "{}: {} {}/{} missing status(es) (filtered {}, skipped {}, failed {})",
            self.date,
            verb,
            self.published,
            self.missing,
            self.filtered(),
            self.skipped,
            self.failed
        );
        if self.quit {
            s.push_str(", stopped by operator");
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assemble, Field};
    use std::num::NonZeroUsize;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn one_batch(n: usize) -> Batch {
        let recs = (0..n)
            .map(|i| Record::new(i as i64).with(Field::Energy, 1.0))
            .collect();
        assemble(recs, NonZeroUsize::new(n.max(1)).unwrap()).remove(0)
    }

    #[test]
    fn partial_acknowledgement_counts_remainder_as_failed() {
        let mut r = ReconciliationReport::new(date(), InteractionMode::Automatic);
        r.record_missing(5);
        r.record_acknowledged(&one_batch(5), 3);
        assert_eq!(r.published(), 3);
        assert_eq!(r.failed(), 2);
        assert_eq!(r.failed_records()[0].timestamp, 3);
        assert_eq!(
            r.summary(),
            "2024-06-01: published 3/5 missing status(es) (filtered 0, skipped 0, failed 2)"
        );
    }

    #[test]
    fn failed_batch_lists_every_record() {
        let mut r = ReconciliationReport::new(date(), InteractionMode::Automatic);
        r.record_failed_batch(&one_batch(4), "HTTP 500");
        assert_eq!(r.failed(), 4);
        assert!(r.failed_records().iter().all(|n| n.reason == "HTTP 500"));
        assert_eq!(r.batches(), 1);
    }

    #[test]
    fn dry_run_summary_uses_conditional_wording() {
        let mut r = ReconciliationReport::new(date(), InteractionMode::DryRun);
        r.record_missing(2);
        r.record_simulated(&one_batch(2));
        r.mark_quit();
        assert!(r.summary().contains("would publish 2/2"));
        assert!(r.summary().ends_with("stopped by operator"));
    }

    #[test]
    fn filter_tallies_split_by_reason() {
        let mut r = ReconciliationReport::new(date(), InteractionMode::Automatic);
        r.record_filtered(FilterVerdict::TooOld);
        r.record_filtered(FilterVerdict::NoData);
        r.record_filtered(FilterVerdict::NoData);
        assert_eq!((r.filtered_too_old(), r.filtered_no_data()), (1, 2));
        assert_eq!(r.filtered(), 3);
    }

    #[test]
    fn serializes_to_json() {
        let r = ReconciliationReport::new(date(), InteractionMode::Interactive);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["date"], "2024-06-01");
        assert_eq!(v["mode"], "interactive");
    }
}
