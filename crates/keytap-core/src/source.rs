#![forbid(unsafe_code)]

//! Raw input sources.
//!
//! A [`RawSource`] hands out batches of raw characters on demand. It is the
//! only platform boundary the decoding pipeline needs: the native terminal
//! implementation lives in `keytap-tty`, and [`ChannelSource`] feeds input
//! from anywhere in the process (tests, PTY bridges, replay tools).

use std::io;
use std::sync::mpsc;
use std::time::Duration;

/// Source of raw input batches.
pub trait RawSource: Send {
    /// Wait up to `timeout` for input.
    ///
    /// Returns `Ok(Some(batch))` with the characters received since the last
    /// call, or `Ok(None)` if nothing arrived within the wait window. Must not
    /// block longer than `timeout`. An `Err` is a platform failure and ends
    /// the session that owns the source.
    fn read_batch(&mut self, timeout: Duration) -> io::Result<Option<String>>;
}

impl<S: RawSource + ?Sized> RawSource for Box<S> {
    fn read_batch(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        (**self).read_batch(timeout)
    }
}

/// Create a connected feeder/source pair.
#[must_use]
pub fn channel_source() -> (ChannelFeeder, ChannelSource) {
    let (tx, rx) = mpsc::channel();
    (ChannelFeeder { tx }, ChannelSource { rx })
}

/// In-process [`RawSource`] backed by a channel.
///
/// Each read drains every batch already queued and concatenates them, so a
/// burst of small writes is decoded as one chunk. Once every
/// [`ChannelFeeder`] is dropped and the queue is empty, reads fail with
/// [`io::ErrorKind::UnexpectedEof`].
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<String>,
}

/// Sending half of [`channel_source`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChannelFeeder {
    tx: mpsc::Sender<String>,
}

impl ChannelFeeder {
    /// Queue a batch of raw characters.
    ///
    /// Returns `false` if the source has been dropped.
    pub fn feed(&self, batch: impl Into<String>) -> bool {
        self.tx.send(batch.into()).is_ok()
    }
}

impl RawSource for ChannelSource {
    fn read_batch(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        let mut batch = match self.rx.recv_timeout(timeout) {
            Ok(batch) => batch,
            Err(mpsc::RecvTimeoutError::Timeout) => return Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input channel closed",
                ));
            }
        };
        while let Ok(more) = self.rx.try_recv() {
            batch.push_str(&more);
        }
        Ok(Some(batch))
    }
}
