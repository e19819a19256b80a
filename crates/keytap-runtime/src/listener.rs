#![forbid(unsafe_code)]

//! Listener loop: raw source → parser → event queue.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use keytap_core::{KeyEvent, Parser, RawSource, SequenceTable};

use crate::queue::EventQueue;
use crate::session::{Counters, SourceFailure};
use crate::stop_signal::{StopSignal, StopTrigger};

pub(crate) type SharedSource = Arc<Mutex<Box<dyn RawSource>>>;

/// Everything the listener thread owns or shares.
pub(crate) struct Listener {
    pub(crate) source: SharedSource,
    pub(crate) table: Arc<SequenceTable>,
    pub(crate) queue: Arc<EventQueue<KeyEvent>>,
    pub(crate) signal: StopSignal,
    pub(crate) trigger: StopTrigger,
    pub(crate) counters: Arc<Counters>,
    pub(crate) failure: Arc<Mutex<Option<SourceFailure>>>,
    pub(crate) poll_timeout: Duration,
    pub(crate) escape_timeout: Duration,
}

impl Listener {
    pub(crate) fn run(self) {
        let _span = tracing::info_span!("keytap.listener").entered();
        tracing::debug!("listener started");

        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        let mut parser = Parser::with_table(Arc::clone(&self.table));

        while !self.signal.is_stopped() {
            let wait = if parser.has_pending() {
                self.poll_timeout.min(self.escape_timeout)
            } else {
                self.poll_timeout
            };

            match source.read_batch(wait) {
                Ok(Some(batch)) => {
                    self.counters.record_batch();
                    tracing::trace!(chars = batch.chars().count(), "read batch");
                    for event in parser.parse(&batch) {
                        if !self.publish(event) {
                            break;
                        }
                    }
                }
                Ok(None) => {
                    if parser.has_pending() {
                        for event in parser.flush() {
                            if !self.publish(event) {
                                break;
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::error!(kind = ?err.kind(), error = %err, "raw input source failed");
                    let failure = SourceFailure::from_io(&err);
                    *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(failure);
                    self.trigger.stop();
                    self.queue.close();
                    break;
                }
            }
        }

        tracing::debug!("listener exiting");
    }

    fn publish(&self, event: KeyEvent) -> bool {
        if self.signal.is_stopped() {
            return false;
        }
        tracing::trace!(key = %event, "decoded");
        self.counters.record_decoded();
        self.queue.push(event)
    }
}
