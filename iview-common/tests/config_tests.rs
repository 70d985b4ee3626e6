//! Config file discovery
//!
//! These tests touch the `IVIEW_CONFIG` process environment variable and run
//! serially.

use iview_common::config::{
    load_file_config, resolve_config_path, FileConfig, ServiceConfig, CONFIG_ENV_VAR,
};
use serial_test::serial;
use std::io::Write;

#[test]
#[serial]
fn test_explicit_path_must_exist() {
    std::env::remove_var(CONFIG_ENV_VAR);
    let missing = std::path::Path::new("/definitely/not/here/iview.toml");
    assert!(resolve_config_path(Some(missing)).is_err());
}

#[test]
#[serial]
fn test_explicit_path_wins_over_env() {
    let dir = tempfile::tempdir().unwrap();
    let cli = dir.path().join("cli.toml");
    let env = dir.path().join("env.toml");
    std::fs::write(&cli, "").unwrap();
    std::fs::write(&env, "").unwrap();

    std::env::set_var(CONFIG_ENV_VAR, &env);
    let resolved = resolve_config_path(Some(&cli)).unwrap();
    std::env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(cli));
}

#[test]
#[serial]
fn test_env_path_used_when_no_flag() {
    let dir = tempfile::tempdir().unwrap();
    let env = dir.path().join("env.toml");
    std::fs::write(&env, "").unwrap();

    std::env::set_var(CONFIG_ENV_VAR, &env);
    let resolved = resolve_config_path(None).unwrap();
    std::env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(env));
}

#[test]
#[serial]
fn test_file_values_feed_resolution() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "bind = \"0.0.0.0:9000\"").unwrap();
    writeln!(file, "public_url = \"https://jobs.acme.test\"").unwrap();
    writeln!(file, "rate_limit_per_minute = 5").unwrap();

    let parsed = load_file_config(file.path()).unwrap();
    let config = ServiceConfig::resolve(FileConfig::default(), parsed).unwrap();

    assert_eq!(config.bind.port(), 9000);
    assert_eq!(config.public_base_url, "https://jobs.acme.test");
    assert_eq!(config.rate_limit_per_minute, 5);
}

#[test]
#[serial]
fn test_malformed_file_reports_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "bind = [").unwrap();

    let err = load_file_config(file.path()).unwrap_err().to_string();
    assert!(err.contains(&file.path().display().to_string()), "error was {}", err);
}
