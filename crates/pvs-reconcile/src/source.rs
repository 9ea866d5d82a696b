//! Collaborator boundary.
//!
//! The engine only sees these traits. Concrete implementations live in
//! `pvs-archive` (SQLite archive) and `pvs-pvoutput` (PVOutput HTTP API);
//! in-memory fakes live in `pvs-testkit`.
//!
//! All calls are awaited one at a time by the driver; implementations own
//! their own timeouts and retries.

use anyhow::Result;

use crate::{Batch, Instant, ReconcileDay, Record, StationLimits, UploadError};

/// The local record store.
#[async_trait::async_trait]
pub trait LocalArchive: Send + Sync {
    /// Interval timestamps archived within `day`.
    async fn list_timestamps(&self, day: &ReconcileDay) -> Result<Vec<Instant>>;

    /// Every archived record at `ts`. Archives without a unique timestamp
    /// column may hold several; each is a distinct status. Never empty.
    async fn fetch_records(&self, day: &ReconcileDay, ts: Instant) -> Result<Vec<Record>>;
}

/// Statuses already published on the remote.
#[async_trait::async_trait]
pub trait RemoteStatuses: Send + Sync {
    async fn list_timestamps(&self, day: &ReconcileDay) -> Result<Vec<Instant>>;
}

/// Publishes batches and reports the station's account limits.
#[async_trait::async_trait]
pub trait StatusUploader: Send + Sync {
    /// Queried once per run. Limits vary by account tier.
    async fn limits(&self) -> Result<StationLimits>;

    /// Publish one batch. `Ok(n)` is the number of records the remote
    /// acknowledged, which may be less than `batch.len()`.
    async fn upload_batch(&self, batch: &Batch) -> Result<usize, UploadError>;
}
