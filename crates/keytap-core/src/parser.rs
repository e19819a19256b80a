#![forbid(unsafe_code)]

//! Greedy escape-sequence decoder.
//!
//! [`Parser`] turns chunks of raw input characters into [`KeyEvent`]s using a
//! [`SequenceTable`].
//!
//! # Algorithm
//!
//! Characters are scanned left to right. An escape marker that is a proper
//! prefix of some table entry opens a *candidate*. Each following character
//! extends the candidate and the grown candidate is looked up:
//!
//! - **hit**: emit the mapped keys in table order and close the candidate.
//!   The first hit wins; the parser never backtracks to a shorter match.
//! - **live prefix**: keep reading.
//! - **dead end** (neither an entry nor a prefix of one): fall back.
//!
//! Any other character is looked up on its own and, if absent from the table,
//! is emitted verbatim as [`Key::Char`].
//!
//! # Chunk boundaries
//!
//! The parser is stateful. When a chunk ends while a candidate is still a
//! live prefix, the candidate is carried into the next [`Parser::parse`] call.
//! The caller decides when waiting is over and calls [`Parser::flush`], which
//! resolves the candidate with the fallback below. The parser never reads
//! past the input it was given.
//!
//! # Fallback
//!
//! A dead or flushed candidate emits the escape marker's own mapping (the
//! Escape key in the standard table, a literal `\x1b` otherwise). The rest of
//! the candidate is then replayed through normal scanning, so every consumed
//! character still produces its own event and a replayed escape marker opens
//! a fresh candidate. `"\x1bb"` therefore decodes to `escape`, `b`.

use std::collections::VecDeque;
use std::str::Chars;
use std::sync::Arc;

use crate::event::KeyEvent;
use crate::key::Key;
use crate::sequence_table::{ESC, SequenceTable};

const ESC_STR: &str = "\x1b";

/// Stateful decoder from raw characters to key events.
#[derive(Debug, Clone)]
pub struct Parser {
    table: Arc<SequenceTable>,
    /// In-progress escape sequence; empty when none is open.
    candidate: String,
    /// Characters consumed once and waiting to be scanned again.
    replay: VecDeque<char>,
    /// Decoded keys not yet handed out.
    ready: VecDeque<Key>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser over the standard table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_table(SequenceTable::standard())
    }

    /// Create a parser over a custom table.
    #[must_use]
    pub fn with_table(table: Arc<SequenceTable>) -> Self {
        Self {
            table,
            candidate: String::new(),
            replay: VecDeque::new(),
            ready: VecDeque::new(),
        }
    }

    /// The table this parser decodes with.
    #[must_use]
    pub fn table(&self) -> &Arc<SequenceTable> {
        &self.table
    }

    /// Decode `chunk` lazily.
    ///
    /// The returned iterator yields events in arrival order. Characters it has
    /// not reached when dropped are kept and decoded by the next call.
    pub fn parse<'p, 'c>(&'p mut self, chunk: &'c str) -> Parse<'p, 'c> {
        Parse {
            parser: self,
            input: chunk.chars(),
        }
    }

    /// Decode `chunk` as complete input: parse it, then flush.
    pub fn decode(&mut self, chunk: &str) -> Vec<KeyEvent> {
        let mut events: Vec<KeyEvent> = self.parse(chunk).collect();
        events.extend(self.flush());
        events
    }

    /// Resolve any carried candidate and return the resulting events.
    ///
    /// Call when no more input is expected soon (idle timeout, end of input).
    pub fn flush(&mut self) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        loop {
            events.extend(self.ready.drain(..).map(KeyEvent::new));
            if let Some(ch) = self.replay.pop_front() {
                self.feed(ch);
            } else if !self.candidate.is_empty() {
                self.abandon_candidate();
            } else {
                return events;
            }
        }
    }

    /// Whether input is buffered that has not produced events yet.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.candidate.is_empty() || !self.replay.is_empty() || !self.ready.is_empty()
    }

    /// Discard all buffered input.
    pub fn reset(&mut self) {
        self.candidate.clear();
        self.replay.clear();
        self.ready.clear();
    }

    fn feed(&mut self, ch: char) {
        if !self.candidate.is_empty() {
            self.candidate.push(ch);
            if let Some(keys) = self.table.lookup(&self.candidate) {
                self.ready.extend(keys.iter().copied());
                self.candidate.clear();
            } else if !self.table.is_proper_prefix(&self.candidate) {
                self.abandon_candidate();
            }
            return;
        }

        if ch == ESC && self.table.is_proper_prefix(ESC_STR) {
            self.candidate.push(ch);
            return;
        }

        match self.table.lookup_char(ch) {
            Some(keys) => self.ready.extend(keys.iter().copied()),
            None => self.ready.push_back(Key::Char(ch)),
        }
    }

    fn abandon_candidate(&mut self) {
        let candidate = std::mem::take(&mut self.candidate);
        tracing::debug!(candidate = ?candidate, "escape sequence fell back");

        match self.table.lookup_char(ESC) {
            Some(keys) => self.ready.extend(keys.iter().copied()),
            None => self.ready.push_back(Key::Char(ESC)),
        }
        let mut rest = candidate.chars();
        rest.next();
        for ch in rest.rev() {
            self.replay.push_front(ch);
        }
    }
}

/// Lazy iterator returned by [`Parser::parse`].
#[derive(Debug)]
pub struct Parse<'p, 'c> {
    parser: &'p mut Parser,
    input: Chars<'c>,
}

impl Iterator for Parse<'_, '_> {
    type Item = KeyEvent;

    fn next(&mut self) -> Option<KeyEvent> {
        loop {
            if let Some(key) = self.parser.ready.pop_front() {
                return Some(KeyEvent::new(key));
            }
            let ch = match self.parser.replay.pop_front() {
                Some(ch) => ch,
                None => self.input.next()?,
            };
            self.parser.feed(ch);
        }
    }
}

impl Drop for Parse<'_, '_> {
    fn drop(&mut self) {
        self.parser.replay.extend(self.input.by_ref());
    }
}
