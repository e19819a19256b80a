#![forbid(unsafe_code)]

//! keytap public facade crate.
//!
//! Listen to the keyboard in the background and react to key presses:
//!
//! ```no_run
//! use keytap::prelude::*;
//!
//! fn main() -> keytap::Result<()> {
//!     let session = keytap::tty_session(SessionConfig::from_env())?;
//!     let _quit = session.subscribe(NamedKey::CtrlC, |_| std::process::exit(0))?;
//!     let _all = session.subscribe(Key::ANY, |event| eprintln!("pressed {event}"))?;
//!     std::thread::park();
//!     Ok(())
//! }
//! ```
//!
//! Without a terminal, drive a session from any [`RawSource`], for example
//! the in-process [`channel_source`].

// --- Core re-exports -------------------------------------------------------

pub use keytap_core::{
    ChannelFeeder, ChannelSource, ESC, Key, KeyEvent, NamedKey, ParseKeyError, Parser, RawSource,
    SequenceTable, TableError, channel_source,
};

// --- Runtime re-exports ----------------------------------------------------

pub use keytap_runtime::{
    ConfigError, Handler, HandlerId, KeyFilter, KeySession, LifecycleState, SessionConfig,
    SessionError, SessionStats, SourceFailure, Subscription,
};

// --- Terminal re-exports ---------------------------------------------------

#[cfg(all(unix, feature = "tty"))]
pub use keytap_tty::TtySource;

pub mod error;

pub use error::{Error, Recovery, Result, TerminalError};

/// Session reading standard input in raw mode.
///
/// The terminal mode is restored when the last clone of the session is
/// dropped.
#[cfg(all(unix, feature = "tty"))]
pub fn tty_session(config: SessionConfig) -> Result<KeySession> {
    use std::io::IsTerminal;

    if !std::io::stdin().is_terminal() {
        return Err(TerminalError::NotATerminal.into());
    }
    config.validate()?;
    let source = TtySource::stdin().map_err(TerminalError::RawMode)?;
    tracing::debug!(thread_name = %config.thread_name, "terminal session created");
    Ok(KeySession::with_config(source, config))
}

/// Session reading the controlling terminal (`/dev/tty`), for programs whose
/// stdin is redirected.
#[cfg(all(unix, feature = "tty"))]
pub fn controlling_tty_session(config: SessionConfig) -> Result<KeySession> {
    config.validate()?;
    let source = TtySource::open_tty().map_err(TerminalError::Open)?;
    Ok(KeySession::with_config(source, config))
}

/// Session over any raw source, validating `config` up front.
pub fn session(source: impl RawSource + 'static, config: SessionConfig) -> Result<KeySession> {
    config.validate()?;
    Ok(KeySession::with_config(source, config))
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, Key, KeyEvent, KeyFilter, KeySession, NamedKey, Result, SessionConfig,
        Subscription,
    };

    pub use crate::{core, runtime};

    #[cfg(all(unix, feature = "tty"))]
    pub use crate::tty;
}

pub use keytap_core as core;
pub use keytap_runtime as runtime;
#[cfg(all(unix, feature = "tty"))]
pub use keytap_tty as tty;
