#![forbid(unsafe_code)]

//! Key events produced by the decoder.

use std::fmt;

use crate::key::{Key, NamedKey};

/// One decoded key press.
///
/// Created once per decoded key and handed to subscribers by reference; it is
/// never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    key: Key,
}

impl KeyEvent {
    /// Wrap a key identifier.
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self { key }
    }

    /// The decoded key identifier.
    #[must_use]
    pub const fn key(&self) -> Key {
        self.key
    }

    /// Check if this event carries a specific literal character.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        self.key == Key::Char(c)
    }

    /// Check if this event carries a specific named key.
    #[must_use]
    pub fn is(&self, named: NamedKey) -> bool {
        self.key == Key::Named(named)
    }
}

impl From<Key> for KeyEvent {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}

impl From<NamedKey> for KeyEvent {
    fn from(named: NamedKey) -> Self {
        Self::new(Key::Named(named))
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}
