#![forbid(unsafe_code)]

//! Runtime: background listening and handler dispatch.
//!
//! # Role in keytap
//! `keytap-runtime` turns a [`RawSource`](keytap_core::RawSource) into a
//! stream of callbacks. A [`KeySession`] runs two threads:
//!
//! - **Listener**: reads raw batches, decodes them with a
//!   [`Parser`](keytap_core::Parser), and pushes events onto an
//!   [`EventQueue`].
//! - **Dispatcher**: pops one event at a time and hands it to every
//!   registered [`Handler`] in registration order. Event *n* is fully
//!   delivered before event *n + 1* starts.
//!
//! Handlers are added through [`KeySession::subscribe`] with a
//! [`KeyFilter`], and removed through the returned [`Subscription`]. The
//! first subscription starts the session.
//!
//! # Example
//!
//! ```
//! use keytap_core::{NamedKey, channel_source};
//! use keytap_runtime::{KeySession, SessionError};
//!
//! # fn main() -> Result<(), SessionError> {
//! let (feeder, source) = channel_source();
//! let session = KeySession::new(source);
//! let sub = session.subscribe(NamedKey::Enter, |event| println!("{event}"))?;
//! feeder.feed("\r");
//! sub.unsubscribe();
//! session.stop();
//! # Ok(())
//! # }
//! ```

pub mod config;
mod dispatcher;
pub mod filter;
mod listener;
pub mod queue;
pub mod registry;
pub mod session;
pub mod stop_signal;
pub mod subscription;

pub use config::{ConfigError, SessionConfig};
pub use filter::KeyFilter;
pub use queue::EventQueue;
pub use registry::{Delivery, Handler, HandlerId, HandlerRegistry};
pub use session::{KeySession, LifecycleState, SessionError, SessionStats, SourceFailure};
pub use stop_signal::{StopSignal, StopTrigger};
pub use subscription::Subscription;
