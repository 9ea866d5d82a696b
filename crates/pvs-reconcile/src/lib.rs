//! pvs-reconcile
//!
//! Reconciliation and batched-upload engine.
//!
//! - Fuzzy timestamp matching (epsilon-tolerant, non-transitive)
//! - Missing-status detection between local archive and remote store
//! - Age + data-presence filtering
//! - Operator gate (automatic / interactive / dry run)
//! - Size-bounded batching with partial-success accounting
//!
//! Deterministic logic plus collaborator traits. No IO of its own.

mod batch;
mod engine;
mod error;
mod filter;
mod interaction;
mod report;
mod run;
mod source;
mod types;

pub use batch::{assemble, Batch};
pub use engine::{missing_timestamps, ReconciliationSet};
pub use error::{RunError, UploadError};
pub use filter::{accepts, FilterVerdict, RecordFilter};
pub use interaction::{AlwaysAccept, Decision, Gate, InteractionMode, InteractionPolicy, Prompt};
pub use report::{ReconciliationReport, RecordNotice};
pub use run::{Reconciler, RunParams};
pub use source::{LocalArchive, RemoteStatuses, StatusUploader};
pub use types::*;
