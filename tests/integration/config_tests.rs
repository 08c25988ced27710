use dupescan::config::{ConfigError, Settings};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
        .extract()
        .unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
follow_symlinks = true
skip_hidden = true
ignore_patterns = ["target/", "*.tmp"]
buffer_size = 131072
retain_singletons = false
"#;
    fs::write(&config_path, toml_content).unwrap();

    let settings: Settings = Settings::file_figment(Some(&config_path)).extract().unwrap();

    assert!(settings.follow_symlinks);
    assert!(settings.skip_hidden);
    assert_eq!(settings.ignore_patterns, vec!["target/", "*.tmp"]);
    assert_eq!(settings.buffer_size, 131_072);
    assert!(!settings.retain_singletons);

    let engine = settings.engine_config();
    assert_eq!(engine.buffer_size, 131_072);
    assert!(engine.walker_config.skip_hidden);
}

#[test]
fn test_env_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "buffer_size = 8192\n").unwrap();

    // A prefix no other test uses keeps this independent of the real environment
    std::env::set_var("DUPESCAN_ENVTEST_BUFFER_SIZE", "16384");
    let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("DUPESCAN_ENVTEST_"))
        .extract()
        .unwrap();
    std::env::remove_var("DUPESCAN_ENVTEST_BUFFER_SIZE");

    assert_eq!(settings.buffer_size, 16_384);
}

#[test]
fn test_config_invalid_toml_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "invalid = toml").unwrap();

    let result = Settings::load(Some(&config_path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_unknown_keys_are_ignored() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "theme = \"dark\"\nskip_hidden = true\n").unwrap();

    let settings: Settings = Settings::file_figment(Some(&config_path)).extract().unwrap();
    assert!(settings.skip_hidden);
}
