//! Configuration loading and root folder resolution
//!
//! Tests that touch `BANTAY_*` environment variables are `#[serial]` so they
//! do not race each other.

use bantay_common::config::{
    database_path, default_root_folder, media_root, resolve_root_folder, TomlConfig,
    CONFIG_FILE_ENV, DEFAULT_EMERGENCY_LABELS, ROOT_FOLDER_ENV,
};
use bantay_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &toml);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_environment_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, &toml);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };
    assert_eq!(resolve_root_folder(None, &toml), PathBuf::from("/from/toml"));
    assert_eq!(
        resolve_root_folder(None, &TomlConfig::default()),
        default_root_folder()
    );
}

#[test]
fn test_paths_inside_root_folder() {
    let root = Path::new("/srv/bantay");
    assert_eq!(database_path(root), PathBuf::from("/srv/bantay/bantay.db"));
    assert_eq!(media_root(root), PathBuf::from("/srv/bantay/media"));
}

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let config = TomlConfig::load(Some(&missing)).unwrap();
    assert!(config.root_folder.is_none());
    assert!(config.sms.gateway_url.is_none());
}

#[test]
#[serial]
fn test_config_file_from_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        bind_address = "0.0.0.0:8080"

        [sms]
        gateway_url = "https://sms.example.ph/send"
        sender_name = "BANTAY"

        [classifier]
        emergency_labels = ["Fire", "Flood"]
        "#,
    )
    .unwrap();

    env::set_var(CONFIG_FILE_ENV, &path);
    let config = TomlConfig::load(None);
    env::remove_var(CONFIG_FILE_ENV);

    let config = config.unwrap();
    assert_eq!(config.bind_address.as_deref(), Some("0.0.0.0:8080"));
    assert_eq!(config.sms.sender_name.as_deref(), Some("BANTAY"));
    assert_eq!(
        config.classifier.effective_emergency_labels(),
        vec!["fire".to_string(), "flood".to_string()]
    );
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "bind_address = [not valid").unwrap();

    let result = TomlConfig::load(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_default_emergency_labels() {
    let labels = TomlConfig::default().classifier.effective_emergency_labels();
    assert_eq!(labels.len(), DEFAULT_EMERGENCY_LABELS.len());
    assert!(labels.contains(&"fire".to_string()));
}
