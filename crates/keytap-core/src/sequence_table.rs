#![forbid(unsafe_code)]

//! Static mapping from raw input sequences to key identifiers.
//!
//! The table maps a literal character sequence (length >= 1) to an ordered,
//! non-empty list of keys. Most entries map to one key; a few meta
//! combinations map to two (`escape` followed by the modified key), emitted
//! in table order.
//!
//! # Prefix collisions
//!
//! Entries may be proper prefixes of other entries. The bare escape character
//! is the important case: it is both the Escape key and the first character
//! of almost every other entry. The table precomputes the set of proper
//! prefixes so the parser can tell "keep reading" apart from "dead end"
//! without scanning every entry.
//!
//! The standard table covers xterm, vt100, rxvt, the Linux console, tmux, and
//! mintty encodings.

use std::fmt;
use std::sync::{Arc, OnceLock};

use ahash::{AHashMap, AHashSet};

use crate::key::{Key, NamedKey as K};

/// The escape marker that introduces multi-character sequences.
pub const ESC: char = '\x1b';

/// Error returned when building a custom table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// An entry had an empty raw sequence.
    EmptySequence,
    /// An entry mapped to no keys.
    EmptyKeys {
        /// The offending raw sequence.
        sequence: String,
    },
    /// The same raw sequence appeared twice.
    Duplicate {
        /// The repeated raw sequence.
        sequence: String,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySequence => write!(f, "sequence table entry has an empty sequence"),
            Self::EmptyKeys { sequence } => {
                write!(f, "sequence {sequence:?} maps to no keys")
            }
            Self::Duplicate { sequence } => write!(f, "sequence {sequence:?} appears twice"),
        }
    }
}

impl std::error::Error for TableError {}

/// Immutable raw-sequence → keys mapping.
#[derive(Debug, Clone, Default)]
pub struct SequenceTable {
    entries: AHashMap<Box<str>, Box<[Key]>>,
    prefixes: AHashSet<Box<str>>,
    max_sequence_len: usize,
}

impl SequenceTable {
    /// The shared standard table. Built on first use, read-only afterwards.
    pub fn standard() -> Arc<SequenceTable> {
        static STANDARD: OnceLock<Arc<SequenceTable>> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                let mut table = SequenceTable::default();
                for &(sequence, keys) in STANDARD_ENTRIES {
                    table.insert(sequence, keys.iter().copied().map(Key::Named).collect());
                }
                tracing::debug!(
                    entries = table.len(),
                    max_sequence_len = table.max_sequence_len,
                    "built standard sequence table"
                );
                Arc::new(table)
            })
            .clone()
    }

    /// Build a custom table, validating every entry.
    pub fn from_entries<I, S, Ks>(entries: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Ks)>,
        S: Into<String>,
        Ks: IntoIterator<Item = Key>,
    {
        let mut table = SequenceTable::default();
        for (sequence, keys) in entries {
            let sequence = sequence.into();
            let keys: Box<[Key]> = keys.into_iter().collect();
            if sequence.is_empty() {
                return Err(TableError::EmptySequence);
            }
            if keys.is_empty() {
                return Err(TableError::EmptyKeys { sequence });
            }
            if table.entries.contains_key(sequence.as_str()) {
                return Err(TableError::Duplicate { sequence });
            }
            table.insert(&sequence, keys);
        }
        Ok(table)
    }

    fn insert(&mut self, sequence: &str, keys: Box<[Key]>) {
        for (idx, _) in sequence.char_indices().skip(1) {
            self.prefixes.insert(sequence[..idx].into());
        }
        self.max_sequence_len = self.max_sequence_len.max(sequence.chars().count());
        self.entries.insert(sequence.into(), keys);
    }

    /// Keys mapped to `sequence`, in emission order.
    #[must_use]
    pub fn lookup(&self, sequence: &str) -> Option<&[Key]> {
        self.entries.get(sequence).map(AsRef::as_ref)
    }

    /// Keys mapped to a single character.
    #[must_use]
    pub fn lookup_char(&self, ch: char) -> Option<&[Key]> {
        let mut buf = [0u8; 4];
        self.lookup(ch.encode_utf8(&mut buf))
    }

    /// Whether some strictly longer entry starts with `sequence`.
    #[must_use]
    pub fn is_proper_prefix(&self, sequence: &str) -> bool {
        self.prefixes.contains(sequence)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length in characters of the longest entry.
    #[must_use]
    pub fn max_sequence_len(&self) -> usize {
        self.max_sequence_len
    }

    /// Iterate over all entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Key])> {
        self.entries.iter().map(|(seq, keys)| (seq.as_ref(), keys.as_ref()))
    }
}

/// Raw entries of the standard table.
///
/// `\x1b[1;2R`, `\x1b[1;5R` and `\x1b[1;6R` are deliberately absent: they are
/// indistinguishable from cursor position reports.
pub static STANDARD_ENTRIES: &[(&str, &[K])] = &[
    // C0 control characters.
    ("\r", &[K::Enter]),
    ("\x00", &[K::CtrlAt]),
    ("\x01", &[K::CtrlA]),
    ("\x02", &[K::CtrlB]),
    ("\x03", &[K::CtrlC]),
    ("\x04", &[K::CtrlD]),
    ("\x05", &[K::CtrlE]),
    ("\x06", &[K::CtrlF]),
    ("\x07", &[K::CtrlG]),
    ("\x08", &[K::CtrlH]),
    ("\t", &[K::CtrlI]),
    ("\x0a", &[K::CtrlJ]),
    ("\x0b", &[K::CtrlK]),
    ("\x0c", &[K::CtrlL]),
    ("\x0e", &[K::CtrlN]),
    ("\x0f", &[K::CtrlO]),
    ("\x10", &[K::CtrlP]),
    ("\x11", &[K::CtrlQ]),
    ("\x12", &[K::CtrlR]),
    ("\x13", &[K::CtrlS]),
    ("\x14", &[K::CtrlT]),
    ("\x15", &[K::CtrlU]),
    ("\x16", &[K::CtrlV]),
    ("\x17", &[K::CtrlW]),
    ("\x18", &[K::CtrlX]),
    ("\x19", &[K::CtrlY]),
    ("\x1a", &[K::CtrlZ]),
    ("\x1b", &[K::Escape]),
    ("\x1b\x1b", &[K::Escape]),
    ("\u{9b}", &[K::ShiftEscape]),
    ("\x1c", &[K::CtrlBackslash]),
    ("\x1d", &[K::CtrlSquareClose]),
    ("\x1e", &[K::CtrlCircumflex]),
    ("\x1f", &[K::CtrlUnderscore]),
    ("\x7f", &[K::CtrlH]),

    // Editing keypad.
    ("\x1b[1~", &[K::Home]),
    ("\x1b[2~", &[K::Insert]),
    ("\x1b[3~", &[K::Delete]),
    ("\x1b[4~", &[K::End]),
    ("\x1b[5~", &[K::PageUp]),
    ("\x1b[6~", &[K::PageDown]),
    ("\x1b[7~", &[K::Home]),
    ("\x1b[8~", &[K::End]),
    ("\x1b[Z", &[K::BackTab]),
    ("\x1b\t", &[K::BackTab]),
    ("\x1b[~", &[K::BackTab]),

    // Function keys.
    ("\x1bOP", &[K::F1]),
    ("\x1bOQ", &[K::F2]),
    ("\x1bOR", &[K::F3]),
    ("\x1bOS", &[K::F4]),
    ("\x1b[[A", &[K::F1]),
    ("\x1b[[B", &[K::F2]),
    ("\x1b[[C", &[K::F3]),
    ("\x1b[[D", &[K::F4]),
    ("\x1b[[E", &[K::F5]),
    ("\x1b[11~", &[K::F1]),
    ("\x1b[12~", &[K::F2]),
    ("\x1b[13~", &[K::F3]),
    ("\x1b[14~", &[K::F4]),
    ("\x1b[15~", &[K::F5]),
    ("\x1b[17~", &[K::F6]),
    ("\x1b[18~", &[K::F7]),
    ("\x1b[19~", &[K::F8]),
    ("\x1b[20~", &[K::F9]),
    ("\x1b[21~", &[K::F10]),
    ("\x1b[23~", &[K::F11]),
    ("\x1b[24~", &[K::F12]),
    ("\x1b[25~", &[K::F13]),
    ("\x1b[26~", &[K::F14]),
    ("\x1b[28~", &[K::F15]),
    ("\x1b[29~", &[K::F16]),
    ("\x1b[31~", &[K::F17]),
    ("\x1b[32~", &[K::F18]),
    ("\x1b[33~", &[K::F19]),
    ("\x1b[34~", &[K::F20]),
    ("\x1b[1;2P", &[K::F13]),
    ("\x1b[1;2Q", &[K::F14]),
    ("\x1b[1;2S", &[K::F16]),
    ("\x1b[15;2~", &[K::F17]),
    ("\x1b[17;2~", &[K::F18]),
    ("\x1b[18;2~", &[K::F19]),
    ("\x1b[19;2~", &[K::F20]),
    ("\x1b[20;2~", &[K::F21]),
    ("\x1b[21;2~", &[K::F22]),
    ("\x1b[23;2~", &[K::F23]),
    ("\x1b[24;2~", &[K::F24]),

    // Ctrl + function keys.
    ("\x1b[1;5P", &[K::CtrlF1]),
    ("\x1b[1;5Q", &[K::CtrlF2]),
    ("\x1b[1;5S", &[K::CtrlF4]),
    ("\x1b[15;5~", &[K::CtrlF5]),
    ("\x1b[17;5~", &[K::CtrlF6]),
    ("\x1b[18;5~", &[K::CtrlF7]),
    ("\x1b[19;5~", &[K::CtrlF8]),
    ("\x1b[20;5~", &[K::CtrlF9]),
    ("\x1b[21;5~", &[K::CtrlF10]),
    ("\x1b[23;5~", &[K::CtrlF11]),
    ("\x1b[24;5~", &[K::CtrlF12]),
    ("\x1b[1;6P", &[K::CtrlF13]),
    ("\x1b[1;6Q", &[K::CtrlF14]),
    ("\x1b[1;6S", &[K::CtrlF16]),
    ("\x1b[15;6~", &[K::CtrlF17]),
    ("\x1b[17;6~", &[K::CtrlF18]),
    ("\x1b[18;6~", &[K::CtrlF19]),
    ("\x1b[19;6~", &[K::CtrlF20]),
    ("\x1b[20;6~", &[K::CtrlF21]),
    ("\x1b[21;6~", &[K::CtrlF22]),
    ("\x1b[23;6~", &[K::CtrlF23]),
    ("\x1b[24;6~", &[K::CtrlF24]),

    // Scroll and paste markers.
    ("\x1b[62~", &[K::ScrollUp]),
    ("\x1b[63~", &[K::ScrollDown]),
    ("\x1b[200~", &[K::BracketedPaste]),

    // Numpad 5 (no meaning).
    ("\x1b[E", &[K::Ignore]),
    ("\x1b[G", &[K::Ignore]),

    // Modified editing keypad. Meta variants decode to escape + key.
    ("\x1b[3;2~", &[K::ShiftDelete]),
    ("\x1b[5;2~", &[K::ShiftPageUp]),
    ("\x1b[6;2~", &[K::ShiftPageDown]),
    ("\x1b[2;3~", &[K::Escape, K::Insert]),
    ("\x1b[3;3~", &[K::Escape, K::Delete]),
    ("\x1b[5;3~", &[K::Escape, K::PageUp]),
    ("\x1b[6;3~", &[K::Escape, K::PageDown]),
    ("\x1b[2;4~", &[K::Escape, K::ShiftInsert]),
    ("\x1b[3;4~", &[K::Escape, K::ShiftDelete]),
    ("\x1b[5;4~", &[K::Escape, K::ShiftPageUp]),
    ("\x1b[6;4~", &[K::Escape, K::ShiftPageDown]),
    ("\x1b[3;5~", &[K::CtrlDelete]),
    ("\x1b[5;5~", &[K::CtrlPageUp]),
    ("\x1b[6;5~", &[K::CtrlPageDown]),
    ("\x1b[3;6~", &[K::CtrlShiftDelete]),
    ("\x1b[5;6~", &[K::CtrlShiftPageUp]),
    ("\x1b[6;6~", &[K::CtrlShiftPageDown]),
    ("\x1b[2;7~", &[K::Escape, K::CtrlInsert]),
    ("\x1b[5;7~", &[K::Escape, K::CtrlPageDown]),
    ("\x1b[6;7~", &[K::Escape, K::CtrlPageDown]),
    ("\x1b[2;8~", &[K::Escape, K::CtrlShiftInsert]),
    ("\x1b[5;8~", &[K::Escape, K::CtrlShiftPageDown]),
    ("\x1b[6;8~", &[K::Escape, K::CtrlShiftPageDown]),

    // Arrows, normal cursor mode.
    ("\x1b[A", &[K::Up]),
    ("\x1b[B", &[K::Down]),
    ("\x1b[C", &[K::Right]),
    ("\x1b[D", &[K::Left]),
    ("\x1b[H", &[K::Home]),
    ("\x1b[F", &[K::End]),

    // Arrows, application cursor mode.
    ("\x1bOA", &[K::Up]),
    ("\x1bOB", &[K::Down]),
    ("\x1bOC", &[K::Right]),
    ("\x1bOD", &[K::Left]),
    ("\x1bOF", &[K::End]),
    ("\x1bOH", &[K::Home]),

    // Modified arrows (xterm).
    ("\x1b[1;2A", &[K::ShiftUp]),
    ("\x1b[1;2B", &[K::ShiftDown]),
    ("\x1b[1;2C", &[K::ShiftRight]),
    ("\x1b[1;2D", &[K::ShiftLeft]),
    ("\x1b[1;2F", &[K::ShiftEnd]),
    ("\x1b[1;2H", &[K::ShiftHome]),
    ("\x1b[1;3A", &[K::Escape, K::Up]),
    ("\x1b[1;3B", &[K::Escape, K::Down]),
    ("\x1b[1;3C", &[K::Escape, K::Right]),
    ("\x1b[1;3D", &[K::Escape, K::Left]),
    ("\x1b[1;3F", &[K::Escape, K::End]),
    ("\x1b[1;3H", &[K::Escape, K::Home]),
    ("\x1b[1;4A", &[K::Escape, K::ShiftDown]),
    ("\x1b[1;4B", &[K::Escape, K::ShiftUp]),
    ("\x1b[1;4C", &[K::Escape, K::ShiftRight]),
    ("\x1b[1;4D", &[K::Escape, K::ShiftLeft]),
    ("\x1b[1;4F", &[K::Escape, K::ShiftEnd]),
    ("\x1b[1;4H", &[K::Escape, K::ShiftHome]),
    ("\x1b[1;5A", &[K::CtrlUp]),
    ("\x1b[1;5B", &[K::CtrlDown]),
    ("\x1b[1;5C", &[K::CtrlRight]),
    ("\x1b[1;5D", &[K::CtrlLeft]),
    ("\x1b[1;5F", &[K::CtrlEnd]),
    ("\x1b[1;5H", &[K::CtrlHome]),

    // Ctrl + arrows (tmux, rxvt).
    ("\x1b[5A", &[K::CtrlUp]),
    ("\x1b[5B", &[K::CtrlDown]),
    ("\x1b[5C", &[K::CtrlRight]),
    ("\x1b[5D", &[K::CtrlLeft]),
    ("\x1bOc", &[K::CtrlRight]),
    ("\x1bOd", &[K::CtrlLeft]),

    // Ctrl + shift + arrows, and the meta variants.
    ("\x1b[1;6A", &[K::CtrlShiftDown]),
    ("\x1b[1;6B", &[K::CtrlShiftUp]),
    ("\x1b[1;6C", &[K::CtrlShiftRight]),
    ("\x1b[1;6D", &[K::CtrlShiftLeft]),
    ("\x1b[1;6F", &[K::CtrlShiftEnd]),
    ("\x1b[1;6H", &[K::CtrlShiftHome]),
    ("\x1b[1;7A", &[K::Escape, K::CtrlDown]),
    ("\x1b[1;7B", &[K::Escape, K::CtrlUp]),
    ("\x1b[1;7C", &[K::Escape, K::CtrlRight]),
    ("\x1b[1;7D", &[K::Escape, K::CtrlLeft]),
    ("\x1b[1;7F", &[K::Escape, K::CtrlEnd]),
    ("\x1b[1;7H", &[K::Escape, K::CtrlHome]),
    ("\x1b[1;8A", &[K::Escape, K::CtrlShiftDown]),
    ("\x1b[1;8B", &[K::Escape, K::CtrlShiftUp]),
    ("\x1b[1;8C", &[K::Escape, K::CtrlShiftRight]),
    ("\x1b[1;8D", &[K::Escape, K::CtrlShiftLeft]),
    ("\x1b[1;8F", &[K::Escape, K::CtrlShiftEnd]),
    ("\x1b[1;8H", &[K::Escape, K::CtrlShiftHome]),
    ("\x1b[1;9A", &[K::Escape, K::Up]),
    ("\x1b[1;9B", &[K::Escape, K::Down]),
    ("\x1b[1;9C", &[K::Escape, K::Right]),
    ("\x1b[1;9D", &[K::Escape, K::Left]),

    // Ctrl / shift / meta + digit (mintty).
    ("\x1b[1;5p", &[K::Ctrl0]),
    ("\x1b[1;5q", &[K::Ctrl1]),
    ("\x1b[1;5r", &[K::Ctrl2]),
    ("\x1b[1;5s", &[K::Ctrl3]),
    ("\x1b[1;5t", &[K::Ctrl4]),
    ("\x1b[1;5u", &[K::Ctrl5]),
    ("\x1b[1;5v", &[K::Ctrl6]),
    ("\x1b[1;5w", &[K::Ctrl7]),
    ("\x1b[1;5x", &[K::Ctrl8]),
    ("\x1b[1;5y", &[K::Ctrl9]),
    ("\x1b[1;6p", &[K::CtrlShift0]),
    ("\x1b[1;6q", &[K::CtrlShift1]),
    ("\x1b[1;6r", &[K::CtrlShift2]),
    ("\x1b[1;6s", &[K::CtrlShift3]),
    ("\x1b[1;6t", &[K::CtrlShift4]),
    ("\x1b[1;6u", &[K::CtrlShift5]),
    ("\x1b[1;6v", &[K::CtrlShift6]),
    ("\x1b[1;6w", &[K::CtrlShift7]),
    ("\x1b[1;6x", &[K::CtrlShift8]),
    ("\x1b[1;6y", &[K::CtrlShift9]),
    ("\x1b[1;7p", &[K::Escape, K::Ctrl0]),
    ("\x1b[1;7q", &[K::Escape, K::Ctrl1]),
    ("\x1b[1;7r", &[K::Escape, K::Ctrl2]),
    ("\x1b[1;7s", &[K::Escape, K::Ctrl3]),
    ("\x1b[1;7t", &[K::Escape, K::Ctrl4]),
    ("\x1b[1;7u", &[K::Escape, K::Ctrl5]),
    ("\x1b[1;7v", &[K::Escape, K::Ctrl6]),
    ("\x1b[1;7w", &[K::Escape, K::Ctrl7]),
    ("\x1b[1;7x", &[K::Escape, K::Ctrl8]),
    ("\x1b[1;7y", &[K::Escape, K::Ctrl9]),
    ("\x1b[1;8p", &[K::Escape, K::CtrlShift0]),
    ("\x1b[1;8q", &[K::Escape, K::CtrlShift1]),
    ("\x1b[1;8r", &[K::Escape, K::CtrlShift2]),
    ("\x1b[1;8s", &[K::Escape, K::CtrlShift3]),
    ("\x1b[1;8t", &[K::Escape, K::CtrlShift4]),
    ("\x1b[1;8u", &[K::Escape, K::CtrlShift5]),
    ("\x1b[1;8v", &[K::Escape, K::CtrlShift6]),
    ("\x1b[1;8w", &[K::Escape, K::CtrlShift7]),
    ("\x1b[1;8x", &[K::Escape, K::CtrlShift8]),
    ("\x1b[1;8y", &[K::Escape, K::CtrlShift9]),
];
