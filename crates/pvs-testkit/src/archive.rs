use std::sync::Mutex;

use anyhow::{bail, Result};
use pvs_reconcile::{Instant, LocalArchive, ReconcileDay, Record};

/// In-memory local archive. Like a table without a unique timestamp column,
/// it may hold several records at one instant.
#[derive(Default)]
pub struct MemArchive {
    records: Vec<Record>,
    fail: Option<String>,
    fetched: Mutex<Vec<Instant>>,
}

impl MemArchive {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: {
                let mut v: Vec<Record> = records.into_iter().collect();
                v.sort_by_key(Record::timestamp);
                v
            },
            ..Self::default()
        }
    }

    /// Every read fails with `msg`.
    pub fn unreadable(msg: &str) -> Self {
        Self {
            fail: Some(msg.to_string()),
            ..Self::default()
        }
    }

    /// Instants fetched so far, one entry per call, in call order.
    pub fn fetched(&self) -> Vec<Instant> {
        self.fetched.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LocalArchive for MemArchive {
    async fn list_timestamps(&self, day: &ReconcileDay) -> Result<Vec<Instant>> {
        if let Some(msg) = &self.fail {
            bail!("{msg}");
        }
        Ok(self
            .records
            .iter()
            .map(Record::timestamp)
            .filter(|ts| day.contains(*ts))
            .collect())
    }

    async fn fetch_records(&self, _day: &ReconcileDay, ts: Instant) -> Result<Vec<Record>> {
        if let Some(msg) = &self.fail {
            bail!("{msg}");
        }
        if let Ok(mut log) = self.fetched.lock() {
            log.push(ts);
        }
        let found: Vec<Record> = self
            .records
            .iter()
            .filter(|r| r.timestamp() == ts)
            .cloned()
            .collect();
        if found.is_empty() {
            bail!("no archive record at {ts}");
        }
        Ok(found)
    }
}
