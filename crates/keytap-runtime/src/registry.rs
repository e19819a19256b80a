#![forbid(unsafe_code)]

//! Handler registry.
//!
//! The registry is an ordered list of [`Handler`]s shared by subscribers and
//! the dispatcher. Mutation and invocation never hold the lock at the same
//! time: [`HandlerRegistry::dispatch`] clones the list under the lock and
//! calls handlers after releasing it, so a handler may subscribe or
//! unsubscribe (itself included) without deadlocking. A change made during a
//! dispatch takes effect from the next event.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keytap_core::KeyEvent;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Return the numeric id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

type Callback = dyn Fn(&KeyEvent) + Send + Sync;

/// A registered callback.
///
/// Clones share the callback and the [`HandlerId`], and compare equal.
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    callback: Arc<Callback>,
}

impl Handler {
    /// Wrap a callback, assigning it a fresh id.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        Self {
            id: HandlerId::next(),
            callback: Arc::new(callback),
        }
    }

    #[must_use]
    pub const fn id(&self) -> HandlerId {
        self.id
    }

    /// Invoke the callback directly.
    pub fn call(&self, event: &KeyEvent) {
        (self.callback)(event);
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("id", &self.id).finish()
    }
}

/// Result of delivering one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Handlers invoked.
    pub invoked: usize,
    /// Invocations that panicked.
    pub panicked: usize,
}

/// Ordered, thread-safe list of handlers.
#[derive(Debug)]
pub struct HandlerRegistry {
    handlers: Mutex<Vec<Handler>>,
    isolate_panics: bool,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    /// Empty registry that isolates handler panics.
    #[must_use]
    pub fn new() -> Self {
        Self::with_isolation(true)
    }

    /// Empty registry. With `isolate_panics` off, a panicking handler
    /// unwinds through [`dispatch`](Self::dispatch).
    #[must_use]
    pub fn with_isolation(isolate_panics: bool) -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            isolate_panics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Handler>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a handler. The same handler may be registered more than once.
    pub fn add(&self, handler: Handler) {
        let mut handlers = self.lock();
        handlers.push(handler);
        tracing::debug!(handlers = handlers.len(), "handler added");
    }

    /// Remove every entry equal to `handler`.
    ///
    /// Returns how many entries were removed; zero is not an error.
    pub fn remove(&self, handler: &Handler) -> usize {
        self.remove_id(handler.id())
    }

    /// Remove every entry carrying `id`.
    pub fn remove_id(&self, id: HandlerId) -> usize {
        let mut handlers = self.lock();
        let before = handlers.len();
        handlers.retain(|h| h.id() != id);
        let removed = before - handlers.len();
        if removed > 0 {
            tracing::debug!(%id, removed, handlers = handlers.len(), "handler removed");
        }
        removed
    }

    /// Whether any entry carries `id`.
    #[must_use]
    pub fn contains(&self, id: HandlerId) -> bool {
        self.lock().iter().any(|h| h.id() == id)
    }

    /// Copy of the current list, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Handler> {
        self.lock().clone()
    }

    /// Invoke every registered handler with `event`, in registration order.
    pub fn dispatch(&self, event: &KeyEvent) -> Delivery {
        let handlers = self.snapshot();
        let mut delivery = Delivery::default();
        for handler in &handlers {
            delivery.invoked += 1;
            if !self.isolate_panics {
                handler.call(event);
                continue;
            }
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler.call(event))) {
                delivery.panicked += 1;
                tracing::error!(
                    handler = %handler.id(),
                    key = %event,
                    panic = panic_message(payload.as_ref()),
                    "key handler panicked"
                );
            }
        }
        delivery
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keytap_core::Key;
    use std::sync::atomic::AtomicUsize;
    use tracing_test::traced_test;

    fn counting() -> (Handler, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let handler = Handler::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (handler, count)
    }

    fn event(c: char) -> KeyEvent {
        KeyEvent::new(Key::Char(c))
    }

    #[test]
    fn ids_are_unique_and_shared_by_clones() {
        let a = Handler::new(|_| {});
        let b = Handler::new(|_| {});
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone(), a);
        assert_ne!(a, b);
    }

    #[test]
    fn dispatch_in_registration_order() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            registry.add(Handler::new(move |_| log.lock().unwrap().push(tag)));
        }
        let delivery = registry.dispatch(&event('x'));
        assert_eq!(delivery.invoked, 3);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicate_registration_runs_twice_and_removes_together() {
        let registry = HandlerRegistry::new();
        let (handler, count) = counting();
        registry.add(handler.clone());
        registry.add(handler.clone());
        registry.dispatch(&event('x'));
        assert_eq!(count.load(Ordering::SeqCst), 2);

        assert_eq!(registry.remove(&handler), 2);
        assert_eq!(registry.remove(&handler), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn handler_can_remove_itself_during_dispatch() {
        let registry = Arc::new(HandlerRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<HandlerId>>> = Arc::new(Mutex::new(None));

        let handler = {
            let registry = Arc::clone(&registry);
            let count = Arc::clone(&count);
            let slot = Arc::clone(&slot);
            Handler::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = *slot.lock().unwrap() {
                    registry.remove_id(id);
                }
            })
        };
        *slot.lock().unwrap() = Some(handler.id());
        registry.add(handler);

        registry.dispatch(&event('a'));
        registry.dispatch(&event('b'));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn handler_added_during_dispatch_sees_next_event() {
        let registry = Arc::new(HandlerRegistry::new());
        let (late, late_count) = counting();
        let adder = {
            let registry = Arc::clone(&registry);
            Handler::new(move |_| {
                if !registry.contains(late.id()) {
                    registry.add(late.clone());
                }
            })
        };
        registry.add(adder);

        registry.dispatch(&event('a'));
        assert_eq!(late_count.load(Ordering::SeqCst), 0);
        registry.dispatch(&event('b'));
        assert_eq!(late_count.load(Ordering::SeqCst), 1);
    }

    #[traced_test]
    #[test]
    fn panicking_handler_is_isolated() {
        let registry = HandlerRegistry::new();
        registry.add(Handler::new(|_| panic!("boom")));
        let (after, count) = counting();
        registry.add(after);

        let delivery = registry.dispatch(&event('x'));
        assert_eq!(delivery, Delivery { invoked: 2, panicked: 1 });
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(logs_contain("key handler panicked"));
        assert!(logs_contain("boom"));
    }

    #[test]
    fn without_isolation_panic_propagates() {
        let registry = HandlerRegistry::with_isolation(false);
        registry.add(Handler::new(|_| panic!("loud")));
        let result = catch_unwind(AssertUnwindSafe(|| registry.dispatch(&event('x'))));
        assert!(result.is_err());
    }
}
