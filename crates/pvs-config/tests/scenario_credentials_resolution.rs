//! Credential resolution.
//!
//! # Test design
//! Failure tests use globally-unique sentinel env var names that are never
//! set in any CI or dev environment, so no test mutates the process env.

use pvs_config::{load_layered_yaml_from_strings, resolve_credentials, CredentialOverrides};

fn config(yaml: &str) -> pvs_config::PvsConfig {
    load_layered_yaml_from_strings(&[yaml])
        .expect("test yaml must parse cleanly")
        .config
}

const SENTINEL_YAML: &str = r#"
station:
  keys_env:
    api_key: "PVS_SENTINEL_APIKEY_MISSING_C1"
    system_id: "PVS_SENTINEL_SYSID_MISSING_C1"
"#;

#[test]
fn missing_api_key_names_the_env_var() {
    let cfg = config(SENTINEL_YAML);
    let msg = resolve_credentials(&cfg, CredentialOverrides::default())
        .unwrap_err()
        .to_string();
    assert!(msg.contains("CREDENTIALS_MISSING"), "{msg}");
    assert!(msg.contains("PVS_SENTINEL_APIKEY_MISSING_C1"), "{msg}");
}

#[test]
fn missing_system_id_names_the_env_var() {
    let cfg = config(SENTINEL_YAML);
    let msg = resolve_credentials(
        &cfg,
        CredentialOverrides {
            api_key: Some("flag-key".to_string()),
            system_id: None,
        },
    )
    .unwrap_err()
    .to_string();
    assert!(msg.contains("CREDENTIALS_MISSING"), "{msg}");
    assert!(msg.contains("PVS_SENTINEL_SYSID_MISSING_C1"), "{msg}");
    assert!(!msg.contains("flag-key"), "error must not echo the key: {msg}");
}

#[test]
fn flags_alone_are_enough() {
    let cfg = config(SENTINEL_YAML);
    let creds = resolve_credentials(
        &cfg,
        CredentialOverrides {
            api_key: Some("flag-key".to_string()),
            system_id: Some("9876".to_string()),
        },
    )
    .unwrap();
    assert_eq!(creds.system_id, "9876");
    assert!(!format!("{creds:?}").contains("flag-key"));
}
