#![forbid(unsafe_code)]

//! Key session lifecycle.
//!
//! A [`KeySession`] owns one raw input source and, while running, exactly one
//! listener thread and one dispatcher thread connected by an
//! [`EventQueue`]. Every subscriber of the session shares that pair.
//!
//! # Lifecycle
//!
//! ```text
//!            start()                     stop() / source failure
//!  Stopped ───────────▶ Running ─────────────────────────────────▶ Stopped
//!     ▲                                                              │
//!     └───────────────────────── start() ◀───────────────────────────┘
//! ```
//!
//! `start` and `stop` are idempotent. `stop` fires the stop signal, closes the
//! queue (discarding undelivered events), and joins both threads; the listener
//! notices the signal within one poll window. Called from inside a handler,
//! `stop` joins only the listener and the dispatcher exits once the handler
//! returns, without delivering anything further.
//!
//! [`KeySession::subscribe`] starts the session if it is not running.
//!
//! A raw source error ends the session on its own. The error is kept as a
//! [`SourceFailure`] until the next successful [`KeySession::start`].
//!
//! Dropping the last clone of a session stops it.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use keytap_core::{KeyEvent, RawSource, SequenceTable};

use crate::config::{ConfigError, SessionConfig};
use crate::dispatcher::Dispatcher;
use crate::filter::KeyFilter;
use crate::listener::{Listener, SharedSource};
use crate::queue::EventQueue;
use crate::registry::{Handler, HandlerRegistry};
use crate::stop_signal::{StopSignal, StopTrigger};
use crate::subscription::Subscription;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by [`KeySession::start`] and [`KeySession::subscribe`].
#[derive(Debug)]
pub enum SessionError {
    /// A background thread could not be spawned.
    Spawn(io::Error),
    /// The session configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to spawn session thread: {e}"),
            Self::Config(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Why a session stopped without being asked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    kind: io::ErrorKind,
    message: String,
}

impl SourceFailure {
    pub(crate) fn from_io(err: &io::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Kind of the underlying I/O error.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "raw input source failed: {}", self.message)
    }
}

impl std::error::Error for SourceFailure {}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Point-in-time counters for a session, accumulated across restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Non-empty batches returned by the raw source.
    pub batches_read: u64,
    /// Events produced by the parser and queued.
    pub events_decoded: u64,
    /// Events delivered to the handler list.
    pub events_dispatched: u64,
    /// Handler invocations that panicked.
    pub handler_panics: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    batches_read: AtomicU64,
    events_decoded: AtomicU64,
    events_dispatched: AtomicU64,
    handler_panics: AtomicU64,
}

impl Counters {
    pub(crate) fn record_batch(&self) {
        self.batches_read.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decoded(&self) {
        self.events_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self, panics: usize) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
        if panics > 0 {
            self.handler_panics
                .fetch_add(panics as u64, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> SessionStats {
        SessionStats {
            batches_read: self.batches_read.load(Ordering::Relaxed),
            events_decoded: self.events_decoded.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Whether a session's background threads are live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Stopped,
    Running,
}

/// The threads of one `start` .. `stop` span.
struct Running {
    trigger: StopTrigger,
    queue: Arc<EventQueue<KeyEvent>>,
    listener: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl Running {
    fn is_live(&self) -> bool {
        !self.trigger.is_stopped()
    }

    /// Signal, close, and join. Never joins the calling thread.
    fn shutdown(mut self) {
        self.trigger.stop();
        self.queue.close();
        let current = thread::current().id();
        for (role, handle) in [
            ("listener", self.listener.take()),
            ("dispatcher", self.dispatcher.take()),
        ] {
            let Some(handle) = handle else { continue };
            if handle.thread().id() == current {
                tracing::debug!(role, "stop called from session thread; not joining self");
                continue;
            }
            if handle.join().is_err() {
                tracing::error!(role, "session thread panicked");
            }
        }
    }
}

struct Inner {
    config: SessionConfig,
    table: Arc<SequenceTable>,
    source: SharedSource,
    registry: Arc<HandlerRegistry>,
    counters: Arc<Counters>,
    failure: Arc<Mutex<Option<SourceFailure>>>,
    running: Mutex<Option<Running>>,
}

impl Inner {
    fn lock_running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_failure(&self) -> MutexGuard<'_, Option<SourceFailure>> {
        self.failure.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop(&self) {
        let running = self.lock_running().take();
        if let Some(running) = running {
            tracing::debug!(thread_name = %self.config.thread_name, "stopping key session");
            running.shutdown();
            tracing::debug!(thread_name = %self.config.thread_name, "key session stopped");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Shared handle to a listener/dispatcher pair over one raw source.
///
/// Cloning is cheap; every clone controls the same session.
#[derive(Clone)]
pub struct KeySession {
    inner: Arc<Inner>,
}

impl fmt::Debug for KeySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySession")
            .field("state", &self.state())
            .field("handlers", &self.handler_count())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl KeySession {
    /// Session over `source` with default configuration and the standard
    /// sequence table. Threads are not started until [`start`](Self::start)
    /// or the first [`subscribe`](Self::subscribe).
    pub fn new(source: impl RawSource + 'static) -> Self {
        Self::with_config(source, SessionConfig::default())
    }

    pub fn with_config(source: impl RawSource + 'static, config: SessionConfig) -> Self {
        Self::with_table(source, config, SequenceTable::standard())
    }

    /// Session decoding with a custom sequence table.
    pub fn with_table(
        source: impl RawSource + 'static,
        config: SessionConfig,
        table: Arc<SequenceTable>,
    ) -> Self {
        let registry = HandlerRegistry::with_isolation(config.isolate_panics);
        Self {
            inner: Arc::new(Inner {
                config,
                table,
                source: Arc::new(Mutex::new(Box::new(source))),
                registry: Arc::new(registry),
                counters: Arc::new(Counters::default()),
                failure: Arc::new(Mutex::new(None)),
                running: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Start the listener and dispatcher threads.
    ///
    /// Does nothing if already running. After a source failure, reaps the old
    /// threads, clears the failure, and starts afresh.
    pub fn start(&self) -> Result<(), SessionError> {
        self.inner.config.validate()?;

        let stale = {
            let mut running = self.inner.lock_running();
            match running.as_ref() {
                Some(run) if run.is_live() => return Ok(()),
                _ => running.take(),
            }
        };
        if let Some(stale) = stale {
            tracing::debug!("reaping stopped session threads");
            stale.shutdown();
        }

        let mut running = self.inner.lock_running();
        if running.as_ref().is_some_and(Running::is_live) {
            return Ok(());
        }
        *self.inner.lock_failure() = None;
        *running = Some(self.spawn()?);
        tracing::debug!(
            thread_name = %self.inner.config.thread_name,
            handlers = self.inner.registry.len(),
            "key session started"
        );
        Ok(())
    }

    fn spawn(&self) -> Result<Running, SessionError> {
        let inner = &self.inner;
        let (signal, trigger) = StopSignal::new();
        let queue = Arc::new(EventQueue::new());
        let prefix = &inner.config.thread_name;
        // Background threads log to the subscriber that was current here.
        let dispatch = tracing::dispatcher::get_default(Clone::clone);

        let listener = Listener {
            source: Arc::clone(&inner.source),
            table: Arc::clone(&inner.table),
            queue: Arc::clone(&queue),
            signal,
            trigger: trigger.clone(),
            counters: Arc::clone(&inner.counters),
            failure: Arc::clone(&inner.failure),
            poll_timeout: inner.config.poll_timeout,
            escape_timeout: inner.config.escape_timeout,
        };
        let listener_dispatch = dispatch.clone();
        let listener = thread::Builder::new()
            .name(format!("{prefix}-listener"))
            .spawn(move || tracing::dispatcher::with_default(&listener_dispatch, || listener.run()))
            .map_err(SessionError::Spawn)?;

        let mut run = Running {
            trigger: trigger.clone(),
            queue: Arc::clone(&queue),
            listener: Some(listener),
            dispatcher: None,
        };

        let dispatcher = Dispatcher {
            queue,
            registry: Arc::clone(&inner.registry),
            trigger,
            counters: Arc::clone(&inner.counters),
        };
        match thread::Builder::new()
            .name(format!("{prefix}-dispatcher"))
            .spawn(move || tracing::dispatcher::with_default(&dispatch, || dispatcher.run()))
        {
            Ok(handle) => {
                run.dispatcher = Some(handle);
                Ok(run)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to spawn dispatcher");
                run.shutdown();
                Err(SessionError::Spawn(err))
            }
        }
    }

    /// Stop both threads and wait for them. Idempotent.
    pub fn stop(&self) {
        self.inner.stop();
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        let running = self.inner.lock_running();
        if running.as_ref().is_some_and(Running::is_live) {
            LifecycleState::Running
        } else {
            LifecycleState::Stopped
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// The source error that ended the last run, if any.
    #[must_use]
    pub fn failure(&self) -> Option<SourceFailure> {
        self.inner.lock_failure().clone()
    }

    /// Register `callback` for events matching `filter` and make sure the
    /// session is running.
    ///
    /// The first subscription starts the listener and dispatcher; later ones
    /// find them running. If the session cannot start, the handler is not
    /// kept. The returned token is the only way to remove this registration;
    /// dropping it leaves the handler registered.
    pub fn subscribe<F>(
        &self,
        filter: impl Into<KeyFilter>,
        callback: F,
    ) -> Result<Subscription, SessionError>
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        let filter = filter.into();
        let handler = filter.wrap(callback);
        let id = handler.id();
        self.inner.registry.add(handler);
        if let Err(err) = self.start() {
            self.inner.registry.remove_id(id);
            return Err(err);
        }
        tracing::debug!(%id, ?filter, "subscribed");
        Ok(Subscription::new(id, Arc::downgrade(&self.inner.registry)))
    }

    /// Register a prebuilt handler without starting the session. Registering
    /// the same handler twice delivers each event to it twice.
    pub fn add_handler(&self, handler: Handler) {
        self.inner.registry.add(handler);
    }

    /// Remove every registration of `handler`, returning how many there were.
    pub fn remove_handler(&self, handler: &Handler) -> usize {
        self.inner.registry.remove(handler)
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.inner.registry.len()
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.inner.counters.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> std::sync::Weak<HandlerRegistry> {
        Arc::downgrade(&self.inner.registry)
    }
}
