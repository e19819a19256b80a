#![forbid(unsafe_code)]

//! Canonical key identifiers.
//!
//! A [`Key`] is either one of the named keys in the closed [`NamedKey`]
//! vocabulary or a literal character that the decoder could not map to a
//! name. Keys are plain values: they compare, hash, and copy by value.
//!
//! Every named key has a stable string form (`"enter"`, `"ctrl+a"`,
//! `"shift+pageup"`, `"<bracketed-paste>"`, ...). Synthetic markers are
//! wrapped in angle brackets so they can never collide with a literal
//! character or a physical key name.

use std::fmt;
use std::str::FromStr;

macro_rules! named_keys {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal, )*) => {
        /// Closed vocabulary of named keys and synthetic markers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NamedKey {
            $( $(#[$meta])* $variant, )*
        }

        impl NamedKey {
            /// Every named key, in declaration order.
            pub const ALL: &'static [NamedKey] = &[ $( NamedKey::$variant, )* ];

            /// Canonical string form of this key.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( NamedKey::$variant => $name, )*
                }
            }

            /// Look a named key up by its canonical string form.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(NamedKey::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

named_keys! {
    /// Escape (also Ctrl+[).
    Escape => "escape",
    ShiftEscape => "shift+escape",
    Return => "return",
    Enter => "enter",

    /// Ctrl+@ (also Ctrl+Space).
    CtrlAt => "ctrl+@",
    CtrlA => "ctrl+a",
    CtrlB => "ctrl+b",
    CtrlC => "ctrl+c",
    CtrlD => "ctrl+d",
    CtrlE => "ctrl+e",
    CtrlF => "ctrl+f",
    CtrlG => "ctrl+g",
    /// Ctrl+H (also Backspace).
    CtrlH => "ctrl+h",
    /// Ctrl+I (also Tab).
    CtrlI => "ctrl+i",
    /// Ctrl+J (also newline).
    CtrlJ => "ctrl+j",
    CtrlK => "ctrl+k",
    CtrlL => "ctrl+l",
    /// Ctrl+M (carriage return; the decoder reports `enter` instead).
    CtrlM => "ctrl+m",
    CtrlN => "ctrl+n",
    CtrlO => "ctrl+o",
    CtrlP => "ctrl+p",
    CtrlQ => "ctrl+q",
    CtrlR => "ctrl+r",
    CtrlS => "ctrl+s",
    CtrlT => "ctrl+t",
    CtrlU => "ctrl+u",
    CtrlV => "ctrl+v",
    CtrlW => "ctrl+w",
    CtrlX => "ctrl+x",
    CtrlY => "ctrl+y",
    CtrlZ => "ctrl+z",

    Ctrl1 => "ctrl+1",
    Ctrl2 => "ctrl+2",
    Ctrl3 => "ctrl+3",
    Ctrl4 => "ctrl+4",
    Ctrl5 => "ctrl+5",
    Ctrl6 => "ctrl+6",
    Ctrl7 => "ctrl+7",
    Ctrl8 => "ctrl+8",
    Ctrl9 => "ctrl+9",
    Ctrl0 => "ctrl+0",

    CtrlShift1 => "ctrl+shift+1",
    CtrlShift2 => "ctrl+shift+2",
    CtrlShift3 => "ctrl+shift+3",
    CtrlShift4 => "ctrl+shift+4",
    CtrlShift5 => "ctrl+shift+5",
    CtrlShift6 => "ctrl+shift+6",
    CtrlShift7 => "ctrl+shift+7",
    CtrlShift8 => "ctrl+shift+8",
    CtrlShift9 => "ctrl+shift+9",
    CtrlShift0 => "ctrl+shift+0",

    CtrlBackslash => "ctrl+\\",
    CtrlSquareClose => "ctrl+]",
    CtrlCircumflex => "ctrl+^",
    CtrlUnderscore => "ctrl+_",

    Left => "left",
    Right => "right",
    Up => "up",
    Down => "down",
    Home => "home",
    End => "end",
    Insert => "insert",
    Delete => "delete",
    PageUp => "pageup",
    PageDown => "pagedown",

    CtrlLeft => "ctrl+left",
    CtrlRight => "ctrl+right",
    CtrlUp => "ctrl+up",
    CtrlDown => "ctrl+down",
    CtrlHome => "ctrl+home",
    CtrlEnd => "ctrl+end",
    CtrlInsert => "ctrl+insert",
    CtrlDelete => "ctrl+delete",
    CtrlPageUp => "ctrl+pageup",
    CtrlPageDown => "ctrl+pagedown",

    ShiftLeft => "shift+left",
    ShiftRight => "shift+right",
    ShiftUp => "shift+up",
    ShiftDown => "shift+down",
    ShiftHome => "shift+home",
    ShiftEnd => "shift+end",
    ShiftInsert => "shift+insert",
    ShiftDelete => "shift+delete",
    ShiftPageUp => "shift+pageup",
    ShiftPageDown => "shift+pagedown",

    CtrlShiftLeft => "ctrl+shift+left",
    CtrlShiftRight => "ctrl+shift+right",
    CtrlShiftUp => "ctrl+shift+up",
    CtrlShiftDown => "ctrl+shift+down",
    CtrlShiftHome => "ctrl+shift+home",
    CtrlShiftEnd => "ctrl+shift+end",
    CtrlShiftInsert => "ctrl+shift+insert",
    CtrlShiftDelete => "ctrl+shift+delete",
    CtrlShiftPageUp => "ctrl+shift+pageup",
    CtrlShiftPageDown => "ctrl+shift+pagedown",

    /// Shift+Tab.
    BackTab => "shift+tab",

    F1 => "f1",
    F2 => "f2",
    F3 => "f3",
    F4 => "f4",
    F5 => "f5",
    F6 => "f6",
    F7 => "f7",
    F8 => "f8",
    F9 => "f9",
    F10 => "f10",
    F11 => "f11",
    F12 => "f12",
    F13 => "f13",
    F14 => "f14",
    F15 => "f15",
    F16 => "f16",
    F17 => "f17",
    F18 => "f18",
    F19 => "f19",
    F20 => "f20",
    F21 => "f21",
    F22 => "f22",
    F23 => "f23",
    F24 => "f24",

    CtrlF1 => "ctrl+f1",
    CtrlF2 => "ctrl+f2",
    CtrlF3 => "ctrl+f3",
    CtrlF4 => "ctrl+f4",
    CtrlF5 => "ctrl+f5",
    CtrlF6 => "ctrl+f6",
    CtrlF7 => "ctrl+f7",
    CtrlF8 => "ctrl+f8",
    CtrlF9 => "ctrl+f9",
    CtrlF10 => "ctrl+f10",
    CtrlF11 => "ctrl+f11",
    CtrlF12 => "ctrl+f12",
    CtrlF13 => "ctrl+f13",
    CtrlF14 => "ctrl+f14",
    CtrlF15 => "ctrl+f15",
    CtrlF16 => "ctrl+f16",
    CtrlF17 => "ctrl+f17",
    CtrlF18 => "ctrl+f18",
    CtrlF19 => "ctrl+f19",
    CtrlF20 => "ctrl+f20",
    CtrlF21 => "ctrl+f21",
    CtrlF22 => "ctrl+f22",
    CtrlF23 => "ctrl+f23",
    CtrlF24 => "ctrl+f24",

    /// Wildcard: a filter on this key matches every event.
    Any => "<any>",
    ScrollUp => "<scroll-up>",
    ScrollDown => "<scroll-down>",
    CprResponse => "<cursor-position-response>",
    Vt100MouseEvent => "<vt100-mouse-event>",
    WindowsMouseEvent => "<windows-mouse-event>",
    /// Start of a bracketed paste. The pasted text follows as ordinary keys.
    BracketedPaste => "<bracketed-paste>",
    /// Decoded but meaningless input (e.g. numpad 5 on some terminals).
    Ignore => "<ignore>",
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// A key from the named vocabulary.
    Named(NamedKey),
    /// A character with no table entry, passed through verbatim.
    Char(char),
}

impl Key {
    /// Wildcard identifier.
    pub const ANY: Key = Key::Named(NamedKey::Any);
    /// Escape key.
    pub const ESCAPE: Key = Key::Named(NamedKey::Escape);
    /// Enter key.
    pub const ENTER: Key = Key::Named(NamedKey::Enter);
    /// Tab is reported as Ctrl+I.
    pub const TAB: Key = Key::Named(NamedKey::CtrlI);
    /// Backspace is reported as Ctrl+H.
    pub const BACKSPACE: Key = Key::Named(NamedKey::CtrlH);
    /// Ctrl+Space is reported as Ctrl+@.
    pub const CTRL_SPACE: Key = Key::Named(NamedKey::CtrlAt);

    /// Whether this is the wildcard identifier.
    #[must_use]
    pub const fn is_any(self) -> bool {
        matches!(self, Key::Named(NamedKey::Any))
    }

    /// The named key, if any.
    #[must_use]
    pub const fn named(self) -> Option<NamedKey> {
        match self {
            Key::Named(named) => Some(named),
            Key::Char(_) => None,
        }
    }

    /// The literal character, if this key is a pass-through character.
    #[must_use]
    pub const fn as_char(self) -> Option<char> {
        match self {
            Key::Char(ch) => Some(ch),
            Key::Named(_) => None,
        }
    }
}

impl From<NamedKey> for Key {
    fn from(named: NamedKey) -> Self {
        Key::Named(named)
    }
}

impl From<char> for Key {
    fn from(ch: char) -> Self {
        Key::Char(ch)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Named(named) => f.write_str(named.as_str()),
            Key::Char(ch) => write!(f, "{ch}"),
        }
    }
}

impl PartialEq<NamedKey> for Key {
    fn eq(&self, other: &NamedKey) -> bool {
        *self == Key::Named(*other)
    }
}

impl PartialEq<char> for Key {
    fn eq(&self, other: &char) -> bool {
        *self == Key::Char(*other)
    }
}

/// Error returned when a string is neither a key name nor a single character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError {
    input: String,
}

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key identifier: {:?}", self.input)
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for Key {
    type Err = ParseKeyError;

    /// Canonical names win over single characters, so `"a"` parses as the
    /// literal `a` while `"f1"` parses as the function key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(named) = NamedKey::from_name(s) {
            return Ok(Key::Named(named));
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Key::Char(ch)),
            _ => Err(ParseKeyError {
                input: s.to_owned(),
            }),
        }
    }
}
