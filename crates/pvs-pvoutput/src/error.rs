//! PVOutput error type.

use std::fmt;

/// Errors a PVOutput request may end in.
#[derive(Debug)]
pub enum PvOutputError {
    /// Network failure or timeout. Retried.
    Transport(String),
    /// HTTP 401: bad API key or system id. Never retried.
    Unauthorized(String),
    /// Any other non-success HTTP status. 5xx are retried, 4xx are not.
    Api { status: u16, message: String },
    /// A response body could not be decoded.
    Decode(String),
    /// The client could not be constructed.
    Config(String),
}

impl PvOutputError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PvOutputError::Transport(_) => true,
            PvOutputError::Api { status, .. } => *status >= 500,
            PvOutputError::Unauthorized(_)
            | PvOutputError::Decode(_)
            | PvOutputError::Config(_) => false,
        }
    }

    /// PVOutput answers a history query for an empty day with
    /// `Bad request 400: No status found`.
    pub(crate) fn is_no_status_found(&self) -> bool {
        matches!(
            self,
            PvOutputError::Api { status: 400, message } if message.contains("No status found")
        )
    }
}

impl fmt::Display for PvOutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PvOutputError::Transport(msg) => write!(f, "transport error: {msg}"),
            PvOutputError::Unauthorized(msg) => write!(f, "pvoutput rejected credentials: {msg}"),
            PvOutputError::Api { status, message } => {
                write!(f, "pvoutput api error status={status}: {message}")
            }
            PvOutputError::Decode(msg) => write!(f, "decode error: {msg}"),
            PvOutputError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for PvOutputError {}
