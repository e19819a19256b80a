#![forbid(unsafe_code)]

//! keytap error model.
//!
//! Each layer keeps its own typed error; [`Error`] unifies them for
//! applications that only want one `?`-compatible type. [`Error::recovery`]
//! says what a caller can reasonably do next.

use std::fmt;

use keytap_core::TableError;
use keytap_runtime::{ConfigError, SessionError, SourceFailure};

// ── Domain-Specific Error Types ─────────────────────────────────────────

/// Terminal acquisition errors.
#[derive(Debug)]
pub enum TerminalError {
    /// Standard input is not a terminal (redirected or piped).
    NotATerminal,
    /// Opening the controlling terminal failed.
    Open(std::io::Error),
    /// Reading or changing terminal attributes failed.
    RawMode(std::io::Error),
}

// ── Unified Error ───────────────────────────────────────────────────────

/// Top-level error type for keytap apps.
#[derive(Debug)]
pub enum Error {
    /// Terminal could not be acquired.
    Terminal(TerminalError),
    /// Session threads could not be started.
    Session(SessionError),
    /// Invalid configuration.
    Config(ConfigError),
    /// Invalid custom sequence table.
    Table(TableError),
    /// The raw source failed while the session was running.
    Source(SourceFailure),
    /// Raw I/O error (convenience variant for `?` on io::Result).
    Io(std::io::Error),
}

/// Standard result type for keytap APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// What a caller can do after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Try the same operation again later.
    Retry,
    /// Fix the configuration or table and try again.
    Reconfigure,
    /// Give up on keyboard input.
    Shutdown,
}

impl Error {
    #[must_use]
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::Terminal(TerminalError::NotATerminal) => Recovery::Shutdown,
            Self::Terminal(TerminalError::Open(_)) => Recovery::Shutdown,
            Self::Terminal(TerminalError::RawMode(_)) => Recovery::Shutdown,

            Self::Session(SessionError::Spawn(_)) => Recovery::Retry,
            Self::Session(SessionError::Config(_)) => Recovery::Reconfigure,
            Self::Config(_) => Recovery::Reconfigure,
            Self::Table(_) => Recovery::Reconfigure,

            Self::Source(failure) => match failure.kind() {
                std::io::ErrorKind::Interrupted
                | std::io::ErrorKind::WouldBlock
                | std::io::ErrorKind::TimedOut => Recovery::Retry,
                _ => Recovery::Shutdown,
            },
            Self::Io(_) => Recovery::Shutdown,
        }
    }

    /// Error type label for metrics and tracing.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Terminal(_) => "terminal",
            Self::Session(_) => "session",
            Self::Config(_) => "config",
            Self::Table(_) => "table",
            Self::Source(_) => "source",
            Self::Io(_) => "io",
        }
    }

    /// Whether the error is recoverable (does not require giving up).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.recovery(), Recovery::Shutdown)
    }
}

// ── Display ─────────────────────────────────────────────────────────────

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotATerminal => write!(f, "standard input is not a terminal"),
            Self::Open(err) => write!(f, "cannot open terminal: {err}"),
            Self::RawMode(err) => write!(f, "cannot enter raw mode: {err}"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Table(err) => write!(f, "{err}"),
            Self::Source(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "I/O: {err}"),
        }
    }
}

// ── std::error::Error ───────────────────────────────────────────────────

impl std::error::Error for TerminalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(err) | Self::RawMode(err) => Some(err),
            Self::NotATerminal => None,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Terminal(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Table(err) => Some(err),
            Self::Source(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

// ── From conversions ────────────────────────────────────────────────────

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<TerminalError> for Error {
    fn from(err: TerminalError) -> Self {
        Self::Terminal(err)
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<TableError> for Error {
    fn from(err: TableError) -> Self {
        Self::Table(err)
    }
}

impl From<SourceFailure> for Error {
    fn from(err: SourceFailure) -> Self {
        Self::Source(err)
    }
}
