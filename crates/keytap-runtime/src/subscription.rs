#![forbid(unsafe_code)]

//! Unsubscribe tokens.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

use crate::registry::{HandlerId, HandlerRegistry};

/// Token returned by [`KeySession::subscribe`](crate::KeySession::subscribe).
///
/// Holds a weak reference to the handler list, so a token never keeps a
/// session alive. Dropping the token does not unsubscribe.
#[derive(Debug)]
pub struct Subscription {
    id: HandlerId,
    registry: Weak<HandlerRegistry>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: HandlerId, registry: Weak<HandlerRegistry>) -> Self {
        Self {
            id,
            registry,
            active: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn handler_id(&self) -> HandlerId {
        self.id
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has not been called yet and
    /// the session still exists.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) && self.registry.strong_count() > 0
    }

    /// Remove the handler. Only the first call has an effect.
    ///
    /// Safe to call from inside the handler itself; the removal applies from
    /// the next event.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_id(self.id);
            tracing::debug!(id = %self.id, "unsubscribed");
        }
    }
}
