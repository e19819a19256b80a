#![forbid(unsafe_code)]

use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::time::Duration;

use keytap_core::RawSource;
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use rustix::fs::{Mode, OFlags};
use rustix::termios::{OptionalActions, Termios};

use crate::decode::Utf8Decoder;

const READ_CHUNK: usize = 4096;

// ── Raw mode ─────────────────────────────────────────────────────────────

/// Saved terminal attributes, restored on drop.
#[derive(Debug)]
struct RawMode {
    saved: Termios,
}

impl RawMode {
    fn enable(fd: &OwnedFd) -> io::Result<Self> {
        let saved = rustix::termios::tcgetattr(fd)?;
        let mut raw = saved.clone();
        raw.make_raw();
        rustix::termios::tcsetattr(fd, OptionalActions::Now, &raw)?;
        tracing::debug!("terminal raw mode enabled");
        Ok(Self { saved })
    }

    fn restore(&self, fd: &OwnedFd) {
        match rustix::termios::tcsetattr(fd, OptionalActions::Now, &self.saved) {
            Ok(()) => tracing::debug!("terminal mode restored"),
            Err(err) => tracing::error!(error = %err, "failed to restore terminal mode"),
        }
    }
}

// ── Source ───────────────────────────────────────────────────────────────

/// [`RawSource`] reading a Unix terminal.
///
/// Constructors that enable raw mode restore the previous terminal
/// attributes when the source is dropped.
#[derive(Debug)]
pub struct TtySource {
    fd: OwnedFd,
    raw_mode: Option<RawMode>,
    decoder: Utf8Decoder,
    buf: Box<[u8]>,
}

impl TtySource {
    /// Read standard input in raw mode.
    ///
    /// Fails with the `tcgetattr` error (usually `ENOTTY`) when stdin is not
    /// a terminal.
    pub fn stdin() -> io::Result<Self> {
        let fd = io::stdin().as_fd().try_clone_to_owned()?;
        Self::raw(fd)
    }

    /// Open the controlling terminal (`/dev/tty`) in raw mode. Works even
    /// when stdin is redirected.
    pub fn open_tty() -> io::Result<Self> {
        let fd = rustix::fs::open(
            "/dev/tty",
            OFlags::RDONLY | OFlags::NOCTTY | OFlags::CLOEXEC,
            Mode::empty(),
        )?;
        Self::raw(fd)
    }

    /// Put `fd` into raw mode and read from it.
    pub fn raw(fd: OwnedFd) -> io::Result<Self> {
        let raw_mode = RawMode::enable(&fd)?;
        Ok(Self::with_mode(fd, Some(raw_mode)))
    }

    /// Read `fd` as-is, without touching terminal attributes (pipes,
    /// sockets, already-configured terminals).
    #[must_use]
    pub fn passthrough(fd: OwnedFd) -> Self {
        Self::with_mode(fd, None)
    }

    fn with_mode(fd: OwnedFd, raw_mode: Option<RawMode>) -> Self {
        Self {
            fd,
            raw_mode,
            decoder: Utf8Decoder::new(),
            buf: vec![0; READ_CHUNK].into_boxed_slice(),
        }
    }

    /// Whether this source changed the terminal mode.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.raw_mode.is_some()
    }

    /// Wait up to `timeout` for the descriptor to become readable.
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let mut fds = [PollFd::new(self.fd.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, poll_timeout(timeout)) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(Errno::EINTR) => Ok(false),
            Err(err) => Err(io::Error::from(err)),
        }
    }
}

impl RawSource for TtySource {
    fn read_batch(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        if !self.wait_readable(timeout)? {
            if self.decoder.has_pending() {
                return Ok(Some(self.decoder.finish()));
            }
            return Ok(None);
        }

        let count = match rustix::io::read(&self.fd, &mut self.buf[..]) {
            Ok(count) => count,
            Err(rustix::io::Errno::INTR | rustix::io::Errno::AGAIN) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if count == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "terminal input closed",
            ));
        }

        let text = self.decoder.decode(&self.buf[..count]);
        tracing::trace!(bytes = count, chars = text.chars().count(), "tty read");
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}

impl Drop for TtySource {
    fn drop(&mut self) {
        if let Some(raw_mode) = self.raw_mode.take() {
            raw_mode.restore(&self.fd);
        }
    }
}

fn poll_timeout(timeout: Duration) -> PollTimeout {
    let ms = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
    PollTimeout::from(ms)
}
