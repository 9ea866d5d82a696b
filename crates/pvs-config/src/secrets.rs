//! Station credential resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** under `station.keys_env`.
//! - At startup, callers invoke [`resolve_credentials`] once; the result is
//!   passed into the PVOutput client constructor.
//! - CLI flags, when given, take precedence over the environment.
//! - `Debug` redacts the API key. Error messages name the env var, never the
//!   value.

use anyhow::{bail, Result};

use crate::PvsConfig;

/// Station credentials, ready for the PVOutput client.
#[derive(Clone)]
pub struct ResolvedCredentials {
    pub api_key: String,
    pub system_id: String,
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("api_key", &"<REDACTED>")
            .field("system_id", &self.system_id)
            .finish()
    }
}

/// Values supplied on the command line.
#[derive(Clone, Default)]
pub struct CredentialOverrides {
    pub api_key: Option<String>,
    pub system_id: Option<String>,
}

/// Resolve a named environment variable.
/// Returns `None` if the variable is unset or its value is blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve the API key and system id: CLI override first, then the env var
/// named in config.
///
/// # Errors
/// `CREDENTIALS_MISSING` naming the env var (and flag) for the first missing
/// value. A system id that is not a positive integer is rejected.
pub fn resolve_credentials(
    config: &PvsConfig,
    overrides: CredentialOverrides,
) -> Result<ResolvedCredentials> {
    let names = &config.station.keys_env;

    let Some(api_key) = non_blank(overrides.api_key).or_else(|| resolve_env(&names.api_key))
    else {
        bail!(
            "CREDENTIALS_MISSING: set env var '{}' or pass --api-key",
            names.api_key
        );
    };

    let Some(system_id) =
        non_blank(overrides.system_id).or_else(|| resolve_env(&names.system_id))
    else {
        bail!(
            "CREDENTIALS_MISSING: set env var '{}' or pass --system-id",
            names.system_id
        );
    };

    if !matches!(system_id.parse::<u64>(), Ok(n) if n > 0) {
        bail!("CREDENTIALS_INVALID: system id must be a positive integer");
    }

    Ok(ResolvedCredentials { api_key, system_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let c = ResolvedCredentials {
            api_key: "0123456789abcdef".to_string(),
            system_id: "12345".to_string(),
        };
        let s = format!("{c:?}");
        assert!(s.contains("<REDACTED>"));
        assert!(!s.contains("0123456789abcdef"));
        assert!(s.contains("12345"));
    }

    #[test]
    fn overrides_win_without_touching_env() {
        let mut cfg = PvsConfig::default();
        cfg.station.keys_env.api_key = "PVS_TEST_UNSET_KEY_A1".to_string();
        cfg.station.keys_env.system_id = "PVS_TEST_UNSET_SID_A1".to_string();
        let c = resolve_credentials(
            &cfg,
            CredentialOverrides {
                api_key: Some(" key ".to_string()),
                system_id: Some("42".to_string()),
            },
        )
        .unwrap();
        assert_eq!(c.api_key, "key");
        assert_eq!(c.system_id, "42");
    }

    #[test]
    fn blank_override_falls_through_to_missing() {
        let mut cfg = PvsConfig::default();
        cfg.station.keys_env.api_key = "PVS_TEST_UNSET_KEY_A2".to_string();
        let err = resolve_credentials(
            &cfg,
            CredentialOverrides {
                api_key: Some("   ".to_string()),
                system_id: Some("1".to_string()),
            },
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("PVS_TEST_UNSET_KEY_A2"), "{err}");
        assert!(err.contains("--api-key"), "{err}");
    }

    #[test]
    fn non_numeric_system_id_is_rejected() {
        let err = resolve_credentials(
            &PvsConfig::default(),
            CredentialOverrides {
                api_key: Some("k".to_string()),
                system_id: Some("abc".to_string()),
            },
        )
        .unwrap_err()
        .to_string();
        assert!(err.starts_with("CREDENTIALS_INVALID"), "{err}");
    }
}
