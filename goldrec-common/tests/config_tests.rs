//! Unit tests for configuration loading and graceful degradation
//!
//! Tests cover:
//! - Missing TOML files never cause failure
//! - Malformed TOML falls back to defaults
//! - Priority order for root folder and config path resolution
//!
//! Tests that manipulate GOLDREC_* environment variables are marked #[serial]
//! so they never run in parallel.

use goldrec_common::config::{
    load_toml_config, load_toml_config_or_default, resolve_config_path, CompiledDefaults,
    RootFolderInitializer, RootFolderResolver, TomlConfig, CONFIG_ENV_VAR, ROOT_FOLDER_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.bind_address, "127.0.0.1");
    assert_eq!(defaults.port, 5790);
    assert_eq!(defaults.log_level, "info");
    assert!(defaults.event_capacity > 0);
}

#[test]
fn test_missing_toml_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    let config = load_toml_config_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_malformed_toml_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "port = \"not a number\"\n[[users]\n").unwrap();

    assert!(load_toml_config(&path).is_err());
    let config = load_toml_config_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_full_toml_parses() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("goldrec-qe.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/goldrec"
bind_address = "0.0.0.0"
port = 6000
in_memory = true
event_capacity = 64

[logging]
level = "debug"

[[users]]
id = "qa-lead"
role = "admin"

[[users]]
id = "inspector-1"
role = "reviewer"
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/goldrec")));
    assert_eq!(config.bind_address.as_deref(), Some("0.0.0.0"));
    assert_eq!(config.port, Some(6000));
    assert_eq!(config.in_memory, Some(true));
    assert_eq!(config.event_capacity, Some(64));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.users.len(), 2);
    assert_eq!(config.users[0].id, "qa-lead");
    assert_eq!(config.users[0].role, "admin");
}

#[test]
#[serial]
fn test_root_folder_priority_cli_over_env_over_toml() {
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };
    let resolver = RootFolderResolver::new("goldrec-qe");

    env::set_var(ROOT_FOLDER_ENV_VAR, "/from/env");
    assert_eq!(
        resolver.resolve(Some(&PathBuf::from("/from/cli")), &toml),
        PathBuf::from("/from/cli")
    );
    assert_eq!(resolver.resolve(None, &toml), PathBuf::from("/from/env"));

    env::remove_var(ROOT_FOLDER_ENV_VAR);
    assert_eq!(resolver.resolve(None, &toml), PathBuf::from("/from/toml"));

    let fallback = resolver.resolve(None, &TomlConfig::default());
    assert_eq!(fallback, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_config_path_priority() {
    env::set_var(CONFIG_ENV_VAR, "/etc/goldrec/custom.toml");
    assert_eq!(
        resolve_config_path(Some(&PathBuf::from("/cli.toml")), "goldrec-qe"),
        Some(PathBuf::from("/cli.toml"))
    );
    assert_eq!(
        resolve_config_path(None, "goldrec-qe"),
        Some(PathBuf::from("/etc/goldrec/custom.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
    if let Some(path) = resolve_config_path(None, "goldrec-qe") {
        assert!(path.ends_with("goldrec/goldrec-qe.toml"));
    }
}

#[test]
fn test_initializer_creates_folder() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("data");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();
    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("goldrec.db"));

    // Second call is a no-op
    initializer.ensure_directory_exists().unwrap();
}
