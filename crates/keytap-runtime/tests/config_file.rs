//! TOML configuration loading (feature `config-file`).
//!
//! Run:
//!   cargo test -p keytap-runtime --features config-file --test config_file

use std::io::Write;
use std::time::Duration;

use keytap_runtime::{ConfigError, SessionConfig};

#[test]
fn full_document() {
    let config = SessionConfig::from_toml_str(
        r#"
        poll_timeout_ms = 150
        escape_timeout_ms = 40
        thread_name = "keys"
        isolate_panics = false
        "#,
    )
    .unwrap();
    assert_eq!(config.poll_timeout, Duration::from_millis(150));
    assert_eq!(config.escape_timeout, Duration::from_millis(40));
    assert_eq!(config.thread_name, "keys");
    assert!(!config.isolate_panics);
}

#[test]
fn missing_keys_keep_defaults() {
    let config = SessionConfig::from_toml_str("escape_timeout_ms = 10").unwrap();
    assert_eq!(
        config,
        SessionConfig::default().with_escape_timeout(Duration::from_millis(10))
    );
    assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
}

#[test]
fn unknown_keys_are_rejected() {
    let err = SessionConfig::from_toml_str("poll_timeout = 3").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err}");
}

#[test]
fn invalid_values_fail_validation() {
    let err = SessionConfig::from_toml_str("poll_timeout_ms = 0").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)), "{err}");
}

#[test]
fn nul_in_thread_name_fails_validation() {
    let err = SessionConfig::from_toml_str("thread_name = \"key\\u0000tap\"").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)), "{err}");
}

#[test]
fn from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "poll_timeout_ms = 75").unwrap();
    let config = SessionConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.poll_timeout, Duration::from_millis(75));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SessionConfig::from_toml_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
    assert!(std::error::Error::source(&err).is_some());
}
