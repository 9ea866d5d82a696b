use std::fmt;

/// Why a reconciliation run stopped.
///
/// Every variant is fatal for the run. Per-batch upload failures are NOT run
/// errors; they are counted in the report and the run carries on.
#[derive(Debug)]
pub enum RunError {
    /// Bad parameters (negative epsilon, zero batch size, unknown field, ...).
    /// Raised before any archive or network activity.
    Config(String),
    /// Station limits could not be determined.
    Limits(anyhow::Error),
    /// The local archive could not be read. No partial reconciliation.
    LocalRead(anyhow::Error),
    /// Already-published statuses could not be listed. Continuing would risk
    /// publishing duplicates.
    RemoteRead(anyhow::Error),
    /// The remote refused our credentials mid-upload. Batches sent before
    /// this point stay published.
    Unauthorized { message: String, published: usize },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Config(msg) => write!(f, "configuration error: {msg}"),
            RunError::Limits(e) => write!(f, "could not determine station limits: {e:#}"),
            RunError::LocalRead(e) => write!(f, "local archive read failed: {e:#}"),
            RunError::RemoteRead(e) => {
                write!(f, "listing published statuses failed: {e:#}")
            }
            RunError::Unauthorized { message, published } => write!(
                f,
                "remote rejected credentials: {message} ({published} status(es) already published)"
            ),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Limits(e) | RunError::LocalRead(e) | RunError::RemoteRead(e) => Some(&**e),
            RunError::Config(_) | RunError::Unauthorized { .. } => None,
        }
    }
}

/// Outcome of a failed batch upload, as classified by the upload collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadError {
    /// This batch failed (after the collaborator's own retries). The run
    /// continues with the next batch.
    Failed(String),
    /// Credentials rejected. Aborts the run.
    Unauthorized(String),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Failed(msg) => write!(f, "batch upload failed: {msg}"),
            UploadError::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
        }
    }
}

impl std::error::Error for UploadError {}
