//! pvs-pvoutput
//!
//! PVOutput.org API client.
//!
//! Implements the remote side of reconciliation: reading a day's status
//! history, uploading batches of statuses, and reporting the account's tier
//! limits. Every request is a form POST to a `/service/r2/*.jsp` script
//! carrying the station's API key and system id as headers.

mod client;
mod error;
pub mod wire;

pub use client::{ClientConfig, PvOutputClient, DEFAULT_BASE_URL};
pub use error::PvOutputError;
