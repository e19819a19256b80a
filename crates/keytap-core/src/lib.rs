#![forbid(unsafe_code)]

//! Core: key identifiers, the escape-sequence table, and input decoding.
//!
//! # Role in keytap
//! `keytap-core` is the decoding layer. It owns the canonical key vocabulary,
//! the raw-sequence table, and the greedy [`parser::Parser`] that turns raw
//! terminal characters into [`event::KeyEvent`]s. It has no threads and no
//! terminal I/O of its own.
//!
//! # Primary responsibilities
//! - **Key / NamedKey**: the closed identifier vocabulary plus literal fallback.
//! - **SequenceTable**: immutable raw-sequence → keys mapping with prefix index.
//! - **Parser**: stateful, chunk-restartable, greedy longest-available match.
//! - **RawSource**: the one trait a platform backend must implement.
//!
//! # How it fits in the system
//! `keytap-tty` implements [`source::RawSource`] for Unix terminals, and
//! `keytap-runtime` drives a source and a parser on background threads,
//! delivering events to subscribers.

pub mod event;
pub mod key;
pub mod parser;
pub mod sequence_table;
pub mod source;

pub use event::KeyEvent;
pub use key::{Key, NamedKey, ParseKeyError};
pub use parser::{Parse, Parser};
pub use sequence_table::{ESC, SequenceTable, TableError};
pub use source::{ChannelFeeder, ChannelSource, RawSource, channel_source};
