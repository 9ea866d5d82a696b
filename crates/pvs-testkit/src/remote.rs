use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use anyhow::{bail, Result};
use pvs_reconcile::{
    Batch, Instant, ReconcileDay, Record, RemoteStatuses, StationLimits, StatusUploader,
    UploadError,
};

/// Scripted reply to one `upload_batch` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Remote takes every record.
    AckAll,
    /// Remote takes only the first `n` records.
    Ack(usize),
    Fail(String),
    Unauthorized(String),
}

/// In-memory PVOutput: status history, tier limits and a batch endpoint.
///
/// Once the script of outcomes runs out every further batch is `AckAll`.
pub struct FakePvOutput {
    limits: StationLimits,
    limits_error: Option<String>,
    history_error: Option<String>,
    statuses: Mutex<Vec<Instant>>,
    outcomes: Mutex<VecDeque<UploadOutcome>>,
    uploads: Mutex<Vec<Vec<Record>>>,
}

impl FakePvOutput {
    pub fn new(limits: StationLimits) -> Self {
        Self {
            limits,
            limits_error: None,
            history_error: None,
            statuses: Mutex::new(Vec::new()),
            outcomes: Mutex::new(VecDeque::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Standard (non-donor) account: 30 per batch, 14 days.
    pub fn standard() -> Self {
        let max_batch_size = NonZeroUsize::new(30).unwrap_or(NonZeroUsize::MIN);
        Self::new(StationLimits {
            max_batch_size,
            max_age_days: 14,
        })
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = Instant>) -> Self {
        if let Ok(mut s) = self.statuses.lock() {
            s.extend(statuses);
        }
        self
    }

    pub fn with_outcomes(self, outcomes: impl IntoIterator<Item = UploadOutcome>) -> Self {
        if let Ok(mut o) = self.outcomes.lock() {
            o.extend(outcomes);
        }
        self
    }

    pub fn with_limits_error(mut self, msg: &str) -> Self {
        self.limits_error = Some(msg.to_string());
        self
    }

    pub fn with_history_error(mut self, msg: &str) -> Self {
        self.history_error = Some(msg.to_string());
        self
    }

    /// Every `upload_batch` call, in order, acknowledged or not.
    pub fn uploads(&self) -> Vec<Vec<Record>> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Timestamps of every record in every upload call.
    pub fn uploaded_timestamps(&self) -> Vec<Instant> {
        self.uploads()
            .iter()
            .flatten()
            .map(Record::timestamp)
            .collect()
    }

    /// Current remote history, sorted.
    pub fn statuses(&self) -> Vec<Instant> {
        let mut s = self.statuses.lock().map(|s| s.clone()).unwrap_or_default();
        s.sort_unstable();
        s
    }
}

#[async_trait::async_trait]
impl RemoteStatuses for FakePvOutput {
    async fn list_timestamps(&self, day: &ReconcileDay) -> Result<Vec<Instant>> {
        if let Some(msg) = &self.history_error {
            bail!("{msg}");
        }
        Ok(self
            .statuses()
            .into_iter()
            .filter(|ts| day.contains(*ts))
            .collect())
    }
}

#[async_trait::async_trait]
impl StatusUploader for FakePvOutput {
    async fn limits(&self) -> Result<StationLimits> {
        if let Some(msg) = &self.limits_error {
            bail!("{msg}");
        }
        Ok(self.limits)
    }

    async fn upload_batch(&self, batch: &Batch) -> Result<usize, UploadError> {
        if let Ok(mut u) = self.uploads.lock() {
            u.push(batch.records().to_vec());
        }
        let outcome = self
            .outcomes
            .lock()
            .ok()
            .and_then(|mut o| o.pop_front())
            .unwrap_or(UploadOutcome::AckAll);

        let taken = match outcome {
            UploadOutcome::AckAll => batch.len(),
            UploadOutcome::Ack(n) => n.min(batch.len()),
            UploadOutcome::Fail(msg) => return Err(UploadError::Failed(msg)),
            UploadOutcome::Unauthorized(msg) => return Err(UploadError::Unauthorized(msg)),
        };
        if let Ok(mut s) = self.statuses.lock() {
            s.extend(batch.records()[..taken].iter().map(Record::timestamp));
        }
        Ok(taken)
    }
}
