#![forbid(unsafe_code)]

//! Blocking FIFO between the listener and the dispatcher.
//!
//! [`EventQueue`] is unbounded: a push never blocks the listener. Closing the
//! queue wakes every blocked consumer. Items still queued at close time are
//! discarded, so a stopped session never delivers events decoded before the
//! stop.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Thread-safe FIFO with blocking pop and explicit close.
#[derive(Debug)]
pub struct EventQueue<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    /// Create an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item. Returns `false` (dropping the item) if closed.
    pub fn push(&self, item: T) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.items.push_back(item);
        drop(state);
        self.ready.notify_one();
        true
    }

    /// Block until an item is available or the queue is closed.
    ///
    /// Returns `None` once closed.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Close the queue, discard its contents, and wake every waiter.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.items.clear();
        drop(state);
        self.ready.notify_all();
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
