#![forbid(unsafe_code)]

//! Session configuration.
//!
//! [`SessionConfig::default`] matches the behavior of a bare
//! [`KeySession::new`](crate::KeySession::new). Values can be overridden with
//! builder methods, environment variables, or (with the `config-file`
//! feature) a TOML document:
//!
//! ```toml
//! poll_timeout_ms = 200
//! escape_timeout_ms = 25
//! thread_name = "keytap"
//! isolate_panics = true
//! ```

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::Deserialize;

/// Environment variable overriding [`SessionConfig::poll_timeout`].
pub const ENV_POLL_TIMEOUT_MS: &str = "KEYTAP_POLL_TIMEOUT_MS";
/// Environment variable overriding [`SessionConfig::escape_timeout`].
pub const ENV_ESCAPE_TIMEOUT_MS: &str = "KEYTAP_ESCAPE_TIMEOUT_MS";

/// Configuration for a [`KeySession`](crate::KeySession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Longest single wait on the raw source. Also bounds how long `stop`
    /// waits for the listener to notice the stop signal.
    pub poll_timeout: Duration,
    /// Wait used while an escape sequence is incomplete. When it elapses with
    /// no further input the partial sequence is flushed, so a lone Escape
    /// press is delivered promptly.
    pub escape_timeout: Duration,
    /// Prefix for background thread names.
    pub thread_name: String,
    /// Catch handler panics instead of letting them end the dispatcher.
    pub isolate_panics: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(200),
            escape_timeout: Duration::from_millis(25),
            thread_name: "keytap".to_owned(),
            isolate_panics: true,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_escape_timeout(mut self, timeout: Duration) -> Self {
        self.escape_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    #[must_use]
    pub fn with_isolate_panics(mut self, isolate: bool) -> Self {
        self.isolate_panics = isolate;
        self
    }

    /// Defaults with environment overrides applied.
    ///
    /// Reads:
    /// - `KEYTAP_POLL_TIMEOUT_MS`: source wait window in milliseconds
    /// - `KEYTAP_ESCAPE_TIMEOUT_MS`: incomplete-sequence wait in milliseconds
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(ms) = get_env(ENV_POLL_TIMEOUT_MS).and_then(|v| v.trim().parse::<u64>().ok()) {
            config.poll_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) =
            get_env(ENV_ESCAPE_TIMEOUT_MS).and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.escape_timeout = Duration::from_millis(ms);
        }
        config
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        if self.poll_timeout.is_zero() {
            problems.push("poll_timeout must be non-zero".to_owned());
        }
        if self.escape_timeout.is_zero() {
            problems.push("escape_timeout must be non-zero".to_owned());
        }
        if self.thread_name.trim().is_empty() {
            problems.push("thread_name must not be empty".to_owned());
        }
        if self.thread_name.contains('\0') {
            problems.push("thread_name must not contain NUL".to_owned());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems))
        }
    }

    /// Load from a TOML string. Missing keys keep their defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(s).map_err(ConfigError::Toml)?;
        let config = file.apply(Self::default());
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(feature = "config-file")]
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    poll_timeout_ms: Option<u64>,
    escape_timeout_ms: Option<u64>,
    thread_name: Option<String>,
    isolate_panics: Option<bool>,
}

#[cfg(feature = "config-file")]
impl ConfigFile {
    fn apply(self, mut config: SessionConfig) -> SessionConfig {
        if let Some(ms) = self.poll_timeout_ms {
            config.poll_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.escape_timeout_ms {
            config.escape_timeout = Duration::from_millis(ms);
        }
        if let Some(name) = self.thread_name {
            config.thread_name = name;
        }
        if let Some(isolate) = self.isolate_panics {
            config.isolate_panics = isolate;
        }
        config
    }
}

/// Errors that can occur when building a session configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Validation(errors) => write!(f, "invalid config: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
