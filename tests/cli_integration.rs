//! CLI integration tests.
//!
//! These tests verify the CLI argument parsing and configuration loading.

use std::ffi::OsString;
use std::io::Write;
use tempfile::NamedTempFile;

use troupe_scribe::cli::{parse_args_from, Args};
use troupe_scribe::config::{Config, ConfigError};

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("troupe-scribe")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

// ============================================================================
// CLI Argument Tests
// ============================================================================

#[test]
fn test_cli_defaults() {
    let result = parse_args_from(args(&[])).unwrap();

    assert!(result.host.is_none());
    assert!(result.port.is_none());
    assert!(!result.no_auth);
    assert!(result.config.is_none());
    assert!(result.api_key.is_none());
    assert!(result.character.is_none());
}

#[test]
fn test_cli_full_options() {
    let result = parse_args_from(args(&[
        "-H",
        "0.0.0.0",
        "-p",
        "8080",
        "-k",
        "my-api-key",
        "-l",
        "debug",
        "-C",
        "Ragge",
        "--prefix",
        "troupe",
    ]))
    .unwrap();

    assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
    assert_eq!(result.port, Some(8080));
    assert_eq!(result.api_key.as_deref(), Some("my-api-key"));
    assert_eq!(result.log_level.as_deref(), Some("debug"));
    assert_eq!(result.character.as_deref(), Some("Ragge"));
    assert_eq!(result.log_prefix.as_deref(), Some("troupe"));
}

#[test]
fn test_cli_invalid_host() {
    assert!(parse_args_from(args(&["--host", "not-an-ip"])).is_err());
}

#[test]
fn test_cli_missing_value() {
    assert!(parse_args_from(args(&["--port"])).is_err());
}

#[test]
fn test_cli_unknown_flag() {
    assert!(parse_args_from(args(&["--record-forever"])).is_err());
}

// ============================================================================
// Config Loading Tests
// ============================================================================

fn config_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_config_file_then_args() {
    let file = config_file(
        r#"{
            "credentials": {"username": "bard", "password": "hunter2", "character": "Ragge"},
            "server": {"port": 4000},
            "recording": {"log_prefix": "meeting", "sign_off": ["bow", "exit"]}
        }"#,
    );

    let mut config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.server.port, 4000);
    assert_eq!(config.recording.sign_off, vec!["bow", "exit"]);

    config.apply_args(&Args {
        port: Some(5000),
        log_prefix: Some("troupe".into()),
        ..Args::default()
    });

    assert_eq!(config.server.port, 5000);
    assert_eq!(config.recording.log_prefix, "troupe");
    assert!(config.validate().is_ok());
    assert_eq!(config.recording_settings().sign_off, vec!["bow", "exit"]);
}

#[test]
fn test_env_below_args() {
    let mut config = Config::default();
    config.apply_env_from(|name| match name {
        "SCRIBE_CHARACTER" => Some("FromEnv".to_string()),
        "SCRIBE_PORT" => Some("4100".to_string()),
        _ => None,
    });
    config.apply_args(&Args {
        character: Some("FromArgs".into()),
        ..Args::default()
    });

    assert_eq!(config.credentials.character, "FromArgs");
    assert_eq!(config.server.port, 4100);
}

#[test]
fn test_config_invalid_json() {
    let file = config_file("{ not json");
    assert!(matches!(
        Config::from_file(file.path()),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn test_config_missing_file() {
    let result = Config::from_file(std::path::Path::new("/nonexistent/troupe.json"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_server_config_carries_keys() {
    let mut config = Config::default();
    config.apply_args(&Args {
        api_key: Some("k1".into()),
        ..Args::default()
    });

    let server = config.to_server_config().unwrap();
    assert_eq!(server.bind_address(), "127.0.0.1:3000");
    assert!(server.key_store().is_valid("k1"));
}
