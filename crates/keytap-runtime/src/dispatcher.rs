#![forbid(unsafe_code)]

//! Dispatcher loop: event queue → handlers.

use std::sync::Arc;
use std::thread;

use keytap_core::KeyEvent;

use crate::queue::EventQueue;
use crate::registry::HandlerRegistry;
use crate::session::Counters;
use crate::stop_signal::StopTrigger;

pub(crate) struct Dispatcher {
    pub(crate) queue: Arc<EventQueue<KeyEvent>>,
    pub(crate) registry: Arc<HandlerRegistry>,
    pub(crate) trigger: StopTrigger,
    pub(crate) counters: Arc<Counters>,
}

impl Dispatcher {
    /// Deliver events one at a time until the queue closes.
    pub(crate) fn run(self) {
        let _span = tracing::info_span!("keytap.dispatcher").entered();
        tracing::debug!("dispatcher started");
        let _guard = UnwindGuard {
            queue: &self.queue,
            trigger: &self.trigger,
        };

        while let Some(event) = self.queue.pop() {
            let delivery = self.registry.dispatch(&event);
            self.counters.record_dispatched(delivery.panicked);
            tracing::trace!(key = %event, handlers = delivery.invoked, "dispatched");
        }

        tracing::debug!("dispatcher exiting");
    }
}

/// Ends the session if an unisolated handler panic unwinds the dispatcher,
/// so the listener does not keep filling a queue nobody drains.
struct UnwindGuard<'a> {
    queue: &'a EventQueue<KeyEvent>,
    trigger: &'a StopTrigger,
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!("dispatcher unwound from a handler panic; stopping session");
            self.trigger.stop();
            self.queue.close();
        }
    }
}
