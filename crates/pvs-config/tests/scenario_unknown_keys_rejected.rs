//! Typos fail loudly.
//!
//! Every section denies unknown keys, so a misspelled setting is a load error
//! rather than a silent fallback to the default.

use pvs_config::load_layered_yaml_from_strings;

#[test]
fn unknown_top_level_section_fails() {
    let yaml = r#"
reconcil:
  epsilon_secs: 60
"#;
    assert!(load_layered_yaml_from_strings(&[yaml]).is_err());
}

#[test]
fn misspelled_nested_key_fails() {
    let yaml = r#"
pvoutput:
  max_retries: 5
"#;
    assert!(load_layered_yaml_from_strings(&[yaml]).is_err());
}

#[test]
fn unknown_field_in_required_fields_fails() {
    let yaml = r#"
reconcile:
  required_fields: ["energy", "irradiance"]
"#;
    let err = format!("{:#}", load_layered_yaml_from_strings(&[yaml]).unwrap_err());
    assert!(err.contains("irradiance"), "{err}");
}

#[test]
fn unknown_field_in_field_map_fails() {
    let yaml = r#"
archive:
  field_map:
    windSpeed: "windSpeed"
"#;
    assert!(load_layered_yaml_from_strings(&[yaml]).is_err());
}

#[test]
fn empty_required_fields_fails() {
    let yaml = r#"
reconcile:
  required_fields: []
"#;
    assert!(load_layered_yaml_from_strings(&[yaml]).is_err());
}

#[test]
fn empty_document_is_all_defaults() {
    let loaded = load_layered_yaml_from_strings(&[""]).unwrap();
    assert_eq!(loaded.config, pvs_config::PvsConfig::default());
}
