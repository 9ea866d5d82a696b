use std::time::Duration;

use anyhow::Result;
use chrono_tz::Tz;
use pvs_reconcile::{
    Batch, Instant, ReconcileDay, RemoteStatuses, StationLimits, StatusUploader, UploadError,
};
use tracing::{debug, warn};

use crate::{wire, PvOutputError};

pub const DEFAULT_BASE_URL: &str = "https://pvoutput.org";

const GETSTATUS: &str = "/service/r2/getstatus.jsp";
const ADDBATCHSTATUS: &str = "/service/r2/addbatchstatus.jsp";
const GETSYSTEM: &str = "/service/r2/getsystem.jsp";

const HEADER_API_KEY: &str = "X-Pvoutput-Apikey";
const HEADER_SYSTEM_ID: &str = "X-Pvoutput-SystemId";

/// Everything needed to talk to PVOutput for one station.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub system_id: String,
    /// Zone PVOutput dates and times are expressed in.
    pub timezone: Tz,
    pub max_tries: u32,
    pub retry_wait: Duration,
    pub timeout: Duration,
    pub status_limit: u32,
    /// Operator caps on the tier limits.
    pub max_batch_size: Option<usize>,
    pub max_age_days: Option<u32>,
}

impl ClientConfig {
    pub fn new(api_key: String, system_id: String, timezone: Tz) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            system_id,
            timezone,
            max_tries: 3,
            retry_wait: Duration::from_secs(2),
            timeout: Duration::from_secs(5),
            status_limit: 288,
            max_batch_size: None,
            max_age_days: None,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .field("system_id", &self.system_id)
            .field("timezone", &self.timezone)
            .field("max_tries", &self.max_tries)
            .field("retry_wait", &self.retry_wait)
            .field("timeout", &self.timeout)
            .field("status_limit", &self.status_limit)
            .finish()
    }
}

/// PVOutput-backed remote: reads status history, uploads batches, reports
/// tier limits.
///
/// The API key is passed in by the caller; it is only ever sent as a header
/// and never logged.
#[derive(Debug, Clone)]
pub struct PvOutputClient {
    cfg: ClientConfig,
    http: reqwest::Client,
}

impl PvOutputClient {
    pub fn new(cfg: ClientConfig) -> Result<Self, PvOutputError> {
        if cfg.max_tries == 0 {
            return Err(PvOutputError::Config("max_tries must be >= 1".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| PvOutputError::Config(format!("http client: {e}")))?;
        Ok(Self { cfg, http })
    }

    fn url(&self, script: &str) -> String {
        format!("{}{}", self.cfg.base_url.trim_end_matches('/'), script)
    }

    /// POST a form to a service script, retrying transport errors and 5xx.
    async fn post(&self, script: &str, form: &[(&str, String)]) -> Result<String, PvOutputError> {
        let mut attempt = 1;
        loop {
            match self.post_once(script, form).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.cfg.max_tries => {
                    warn!(
                        script,
                        attempt,
                        max_tries = self.cfg.max_tries,
                        error = %e,
                        "pvoutput request failed; retrying"
                    );
                    tokio::time::sleep(self.cfg.retry_wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once(
        &self,
        script: &str,
        form: &[(&str, String)],
    ) -> Result<String, PvOutputError> {
        let resp = self
            .http
            .post(self.url(script))
            .header(HEADER_API_KEY, &self.cfg.api_key)
            .header(HEADER_SYSTEM_ID, &self.cfg.system_id)
            .form(form)
            .send()
            .await
            .map_err(|e| PvOutputError::Transport(transport_message(&e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PvOutputError::Transport(transport_message(&e)))?;

        if status.is_success() {
            return Ok(body);
        }
        let message = body.trim().to_string();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PvOutputError::Unauthorized(message));
        }
        Err(PvOutputError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Statuses PVOutput holds for `day`.
    pub async fn status_history(
        &self,
        day: &ReconcileDay,
    ) -> Result<Vec<Instant>, PvOutputError> {
        let form = [
            ("h", "1".to_string()),
            ("asc", "1".to_string()),
            ("limit", self.cfg.status_limit.to_string()),
            ("d", day.date.format(wire::DATE_FMT).to_string()),
        ];
        match self.post(GETSTATUS, &form).await {
            Ok(body) => wire::parse_history(&body, &self.cfg.timezone),
            Err(e) if e.is_no_status_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Whether the account is a donor, which raises its limits.
    pub async fn is_donor(&self) -> Result<bool, PvOutputError> {
        let body = self.post(GETSYSTEM, &[("donations", "1".to_string())]).await?;
        wire::parse_donor(&body)
    }

    /// Upload one batch; returns how many statuses PVOutput added.
    pub async fn add_batch(&self, batch: &Batch) -> Result<usize, PvOutputError> {
        let data = wire::encode_batch(batch, &self.cfg.timezone)?;
        let body = self.post(ADDBATCHSTATUS, &[("data", data)]).await?;
        wire::parse_batch_reply(&body)
    }
}

fn transport_message(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timeout: {e}")
    } else {
        e.to_string()
    }
}

#[async_trait::async_trait]
impl RemoteStatuses for PvOutputClient {
    async fn list_timestamps(&self, day: &ReconcileDay) -> Result<Vec<Instant>> {
        let got = self.status_history(day).await?;
        debug!(date = %day.date, count = got.len(), "pvoutput statuses");
        Ok(got)
    }
}

#[async_trait::async_trait]
impl StatusUploader for PvOutputClient {
    async fn limits(&self) -> Result<StationLimits> {
        let donor = self.is_donor().await?;
        let limits =
            wire::tier_limits(donor).capped(self.cfg.max_batch_size, self.cfg.max_age_days);
        debug!(donor, "pvoutput account tier");
        Ok(limits)
    }

    async fn upload_batch(&self, batch: &Batch) -> Result<usize, UploadError> {
        match self.add_batch(batch).await {
            Ok(n) => Ok(n),
            Err(PvOutputError::Unauthorized(msg)) => Err(UploadError::Unauthorized(msg)),
            Err(e) => Err(UploadError::Failed(e.to_string())),
        }
    }
}
