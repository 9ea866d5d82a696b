//! Typed view of the merged configuration document.
//!
//! Every section and key has a default, so an empty document is a valid
//! configuration. Unknown keys are rejected so typos fail loudly instead of
//! silently falling back to a default.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use pvs_reconcile::{Epsilon, Field};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvsConfig {
    pub station: StationSettings,
    pub pvoutput: PvOutputSettings,
    pub archive: ArchiveSettings,
    pub reconcile: ReconcileSettings,
    pub limits: LimitCaps,
}

impl PvsConfig {
    pub fn from_json(v: &Value) -> Result<Self> {
        let cfg: PvsConfig =
            serde_json::from_value(v.clone()).context("config does not match schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Cross-field checks that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.station.tz()?;
        self.reconcile.epsilon()?;
        self.reconcile.required_fields()?;
        self.archive.field_columns()?;
        if self.pvoutput.max_tries == 0 {
            bail!("pvoutput.max_tries must be >= 1");
        }
        if self.pvoutput.timeout_secs == 0 {
            bail!("pvoutput.timeout_secs must be >= 1");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// station
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationSettings {
    /// IANA zone the station reports in. PVOutput dates and times are local.
    pub timezone: String,
    pub keys_env: KeysEnv,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            keys_env: KeysEnv::default(),
        }
    }
}

impl StationSettings {
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .trim()
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow!("station.timezone '{}' is not an IANA zone: {e}", self.timezone))
    }
}

/// Names (not values) of the env vars holding station credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeysEnv {
    pub api_key: String,
    pub system_id: String,
}

impl Default for KeysEnv {
    fn default() -> Self {
        Self {
            api_key: "PVOUTPUT_API_KEY".to_string(),
            system_id: "PVOUTPUT_SYSTEM_ID".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// pvoutput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvOutputSettings {
    pub base_url: String,
    pub max_tries: u32,
    pub retry_wait_secs: u64,
    pub timeout_secs: u64,
    /// Max statuses requested from the history endpoint for one day.
    pub status_limit: u32,
}

impl Default for PvOutputSettings {
    fn default() -> Self {
        Self {
            base_url: "https://pvoutput.org".to_string(),
            max_tries: 3,
            retry_wait_secs: 2,
            timeout_secs: 5,
            status_limit: 288,
        }
    }
}

impl PvOutputSettings {
    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry_wait_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// archive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveSettings {
    /// sqlx SQLite URL, e.g. `sqlite:///var/lib/weewx/weewx.sdb?mode=ro`.
    pub url: Option<String>,
    pub table: String,
    pub timestamp_column: String,
    /// Report energy as the day's running total (what PVOutput expects)
    /// rather than the per-interval value stored in the archive.
    pub cumulative_energy: bool,
    /// Record field key -> archive column.
    pub field_map: BTreeMap<String, String>,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        let field_map = [
            ("energy", "energy"),
            ("grid_power", "gridPower"),
            ("inverter_temp", "inverterTemp"),
            ("grid_voltage", "gridVoltage"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            url: None,
            table: "archive".to_string(),
            timestamp_column: "dateTime".to_string(),
            cumulative_energy: true,
            field_map,
        }
    }
}

impl ArchiveSettings {
    /// Field map with keys parsed into [`Field`]s, in manifest order.
    pub fn field_columns(&self) -> Result<Vec<(Field, String)>> {
        let mut out = Vec::with_capacity(self.field_map.len());
        for (key, column) in &self.field_map {
            let field = Field::parse(key).map_err(|e| anyhow!("archive.field_map: {e}"))?;
            out.push((field, column.clone()));
        }
        out.sort_by_key(|(f, _)| *f);
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileSettings {
    pub epsilon_secs: i64,
    pub required_fields: Vec<String>,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            epsilon_secs: Epsilon::DEFAULT_SECS,
            required_fields: vec!["energy".to_string()],
        }
    }
}

impl ReconcileSettings {
    pub fn epsilon(&self) -> Result<Epsilon> {
        Epsilon::new(self.epsilon_secs).map_err(|e| anyhow!("reconcile.epsilon_secs: {e}"))
    }

    pub fn required_fields(&self) -> Result<Vec<Field>> {
        if self.required_fields.is_empty() {
            bail!("reconcile.required_fields must name at least one field");
        }
        self.required_fields
            .iter()
            .map(|k| Field::parse(k).map_err(|e| anyhow!("reconcile.required_fields: {e}")))
            .collect()
    }
}

/// Operator caps applied on top of the limits the remote reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitCaps {
    pub max_batch_size: Option<usize>,
    pub max_age_days: Option<u32>,
}
