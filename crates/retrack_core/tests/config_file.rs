use retrack_core::{ConfigError, LabelKind, TrackerConfig};
use std::fs;

#[test]
fn partial_config_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("retrack.json");
    fs::write(
        &path,
        r#"{ "default_interval_days": 14, "catalog": { "verbs": ["Replace", "Descale"] } }"#,
    )
    .unwrap();

    let config = TrackerConfig::load(&path).unwrap();
    assert_eq!(config.default_interval_days, 14);
    assert_eq!(config.storage_key, "replacementItems");
    assert_eq!(config.catalog.verbs, vec!["Replace", "Descale"]);
    assert!(config
        .catalog
        .resolve(LabelKind::Category, "kitchen")
        .is_some());
}

#[test]
fn invalid_config_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        TrackerConfig::load(&missing),
        Err(ConfigError::Io { .. })
    ));

    let garbled = dir.path().join("garbled.json");
    fs::write(&garbled, "default_interval_days = 14").unwrap();
    assert!(matches!(
        TrackerConfig::load(&garbled),
        Err(ConfigError::Parse { .. })
    ));

    let blank_key = dir.path().join("blank_key.json");
    fs::write(&blank_key, r#"{ "storage_key": "  " }"#).unwrap();
    assert!(matches!(
        TrackerConfig::load(&blank_key),
        Err(ConfigError::BlankStorageKey)
    ));
}
