#![forbid(unsafe_code)]
#![doc = "Native Unix terminal input source for keytap."]
#![doc = ""]
#![doc = "[`TtySource`] implements [`keytap_core::RawSource`] over a terminal file"]
#![doc = "descriptor: raw mode through `rustix` termios, bounded waits through"]
#![doc = "`nix::poll`, and incremental UTF-8 decoding with [`Utf8Decoder`]."]
#![doc = ""]
#![doc = "Unix only; on other targets only the decoder is available."]

pub mod decode;

pub use decode::Utf8Decoder;

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::TtySource;
