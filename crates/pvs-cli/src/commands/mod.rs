//! Command implementations for the `pvsync` binary.
//!
//! Shared helpers live here; each subcommand with real work gets a module.

pub mod prompt;
pub mod sync;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use pvs_config::{CredentialOverrides, LoadedConfig, PvsConfig, ResolvedCredentials};
use pvs_pvoutput::{ClientConfig, PvOutputClient};
use pvs_reconcile::StatusUploader;

/// Load layered config. No paths means built-in defaults only.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        return pvs_config::load_layered_yaml_from_strings(&[]);
    }
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    pvs_config::load_layered_yaml(&path_refs)
}

/// `--date` value, or today in the station's zone.
pub fn parse_date(raw: Option<&str>, tz: &Tz) -> Result<NaiveDate> {
    match raw {
        None => Ok(Utc::now().with_timezone(tz).date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| anyhow!("invalid --date '{s}': expected YYYY-MM-DD ({e})")),
    }
}

/// PVOutput client for the station, with operator caps from config.
pub fn build_client(config: &PvsConfig, creds: ResolvedCredentials) -> Result<PvOutputClient> {
    let mut cfg = ClientConfig::new(creds.api_key, creds.system_id, config.station.tz()?);
    cfg.base_url = config.pvoutput.base_url.clone();
    cfg.max_tries = config.pvoutput.max_tries;
    cfg.retry_wait = config.pvoutput.retry_wait();
    cfg.timeout = config.pvoutput.timeout();
    cfg.status_limit = config.pvoutput.status_limit;
    cfg.max_batch_size = config.limits.max_batch_size;
    cfg.max_age_days = config.limits.max_age_days;
    PvOutputClient::new(cfg).context("failed to build pvoutput client")
}

pub async fn run_limits(
    config_paths: Vec<String>,
    api_key: Option<String>,
    system_id: Option<String>,
) -> Result<()> {
    let loaded = load_config(&config_paths)?;
    let creds =
        pvs_config::resolve_credentials(&loaded.config, CredentialOverrides { api_key, system_id })?;
    let client = build_client(&loaded.config, creds)?;

    let limits = client
        .limits()
        .await
        .context("could not determine station limits")?;
    println!("max_batch_size={}", limits.max_batch_size);
    println!("max_age_days={}", limits.max_age_days);
    Ok(())
}
