use dupe_eraser::config::{ConfigError, Settings, SettingsOverrides, ENV_PREFIX};
use dupe_eraser::scanner::{Algorithm, PerceptualAlgorithm, StrongAlgorithm};
use dupe_eraser::Policy;
use figment::providers::Serialized;
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_defaults_extract_cleanly() {
    let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
        .extract()
        .unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_env_layer_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "progress_threshold_mb = 50\n").unwrap();

    // only this test touches this key
    let var = format!("{ENV_PREFIX}PROGRESS_THRESHOLD_MB");
    std::env::set_var(&var, "25");
    let settings = Settings::load(Some(&config_path), &SettingsOverrides::default());
    std::env::remove_var(&var);

    assert_eq!(settings.unwrap().progress_threshold_mb, 25);
}

#[test]
fn test_full_toml_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
algorithm = "blake3"
recursive = true
shallow_check = true
perceptual = true
perceptual_algorithm = "dhash"
perceptual_threshold = 10
quarantine_dir = "held"
policy = "delete"
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(&config_path), &SettingsOverrides::default()).unwrap();
    let config = settings.validate(temp_dir.path()).unwrap();

    assert_eq!(config.algorithm, Algorithm::Strong(StrongAlgorithm::Blake3));
    assert!(config.recursive);
    assert!(config.shallow_check);
    let fallback = config.perceptual.unwrap();
    assert_eq!(fallback.algorithm, PerceptualAlgorithm::Dhash);
    assert_eq!(fallback.threshold, 10);
    assert_eq!(config.quarantine_dir, config.root.join("held"));
    assert_eq!(config.policy, Policy::Delete);
}

#[test]
fn test_command_line_wins_over_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "policy = \"delete\"\nshallow_check = true\n").unwrap();

    let overrides = SettingsOverrides {
        policy: Some(Policy::Quarantine),
        quarantine_dir: Some(PathBuf::from("/tmp/elsewhere")),
        ..SettingsOverrides::default()
    };
    let settings = Settings::load(Some(&config_path), &overrides).unwrap();

    assert_eq!(settings.policy, Policy::Quarantine);
    assert!(settings.shallow_check);
    assert_eq!(settings.quarantine_dir, Some(PathBuf::from("/tmp/elsewhere")));
}

#[test]
fn test_unknown_policy_in_file_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "policy = \"shred\"\n").unwrap();

    let err = Settings::load(Some(&config_path), &SettingsOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_unsupported_algorithm_message_lists_names() {
    let temp_dir = tempdir().unwrap();
    let settings = Settings {
        algorithm: "whirlpool".into(),
        ..Settings::default()
    };
    let message = settings.validate(temp_dir.path()).unwrap_err().to_string();
    assert!(message.contains("whirlpool"));
    assert!(message.contains("xxh3_128"));
}

#[test]
fn test_root_must_exist() {
    let temp_dir = tempdir().unwrap();
    let err = Settings::default()
        .validate(&temp_dir.path().join("gone"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRoot { .. }));
    assert!(err.to_string().contains("gone"));
}
