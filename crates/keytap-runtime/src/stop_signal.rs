#![forbid(unsafe_code)]

//! Stop flag shared between a session and its background threads.
//!
//! The loops never sleep on the flag itself: the listener checks it between
//! bounded source reads and the dispatcher is woken by closing the queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Observer half: checked by background loops.
///
/// Once triggered, a signal stays triggered; a restarted session creates a
/// fresh pair.
#[derive(Debug, Clone)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    #[must_use]
    pub fn new() -> (Self, StopTrigger) {
        let stopped = Arc::new(AtomicBool::new(false));
        let signal = Self {
            stopped: Arc::clone(&stopped),
        };
        (signal, StopTrigger { stopped })
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Trigger half: held by whoever may end the loops.
#[derive(Debug, Clone)]
pub struct StopTrigger {
    stopped: Arc<AtomicBool>,
}

impl StopTrigger {
    /// Fire the signal. Firing twice is harmless.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_clear() {
        let (signal, trigger) = StopSignal::new();
        assert!(!signal.is_stopped());
        assert!(!trigger.is_stopped());
    }

    #[test]
    fn trigger_is_visible_to_every_clone() {
        let (signal, trigger) = StopSignal::new();
        let other = signal.clone();
        trigger.clone().stop();
        trigger.stop();
        assert!(signal.is_stopped());
        assert!(other.is_stopped());
        assert!(trigger.is_stopped());
    }

    #[test]
    fn trigger_from_another_thread_is_observed() {
        let (signal, trigger) = StopSignal::new();
        thread::spawn(move || trigger.stop()).join().unwrap();
        assert!(signal.is_stopped());
    }

    #[test]
    fn pairs_are_independent() {
        let (first, trigger) = StopSignal::new();
        let (second, _) = StopSignal::new();
        trigger.stop();
        assert!(first.is_stopped());
        assert!(!second.is_stopped());
    }
}
