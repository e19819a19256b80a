#![forbid(unsafe_code)]

//! Per-subscription key filters.

use keytap_core::{Key, KeyEvent};

use crate::registry::Handler;

/// Which events a subscription wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyFilter {
    /// Only events carrying this key.
    Exact(Key),
    /// Every event.
    #[default]
    Any,
}

impl KeyFilter {
    /// Filter for `key`. The wildcard key yields [`KeyFilter::Any`].
    #[must_use]
    pub fn new(key: impl Into<Key>) -> Self {
        let key = key.into();
        if key.is_any() {
            Self::Any
        } else {
            Self::Exact(key)
        }
    }

    #[must_use]
    pub fn matches(&self, key: Key) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(wanted) => *wanted == key,
        }
    }

    /// Build a handler that runs `callback` only for matching events.
    pub fn wrap<F>(self, callback: F) -> Handler
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        match self {
            Self::Any => Handler::new(callback),
            Self::Exact(_) => Handler::new(move |event: &KeyEvent| {
                if self.matches(event.key()) {
                    callback(event);
                }
            }),
        }
    }
}

impl From<Key> for KeyFilter {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}

impl From<keytap_core::NamedKey> for KeyFilter {
    fn from(named: keytap_core::NamedKey) -> Self {
        Self::new(named)
    }
}

impl From<char> for KeyFilter {
    fn from(ch: char) -> Self {
        Self::Exact(Key::Char(ch))
    }
}
