//! NUL-terminated UTF-8 text over [`Buffer<u8>`].
//!
//! A non-empty `Text` stores its bytes followed by a single `0`, so
//! [`as_bytes_with_nul`](Text::as_bytes_with_nul) can hand the storage to C
//! without copying. An empty `Text` holds no allocation at all. Byte offsets
//! passed to editing operations must fall on character boundaries.

#![allow(unsafe_code)]

use std::fmt;

use keel_core::contract::{check_range, violation};
use keel_core::ContractViolation;

use crate::buffer::Buffer;

/// Growable UTF-8 text with a trailing NUL in storage.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Text {
    // Empty, or valid UTF-8 followed by exactly one trailing 0.
    bytes: Buffer<u8>,
}

impl Text {
    /// Empty text. Does not allocate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Length in bytes, excluding the terminator.
    pub fn len(&self) -> usize {
        self.bytes.len().saturating_sub(1)
    }

    /// Whether the text has no characters.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Allocated bytes, including room for the terminator.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Ensure room for `additional` more bytes of text.
    #[track_caller]
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.len().saturating_add(additional).saturating_add(1);
        self.bytes.reserve(needed);
    }

    /// Append `s`.
    #[track_caller]
    pub fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.unterminate();
        self.bytes.append(s.as_bytes(), 1);
        self.terminate();
    }

    /// Append one character.
    #[track_caller]
    pub fn push(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.push_str(c.encode_utf8(&mut utf8));
    }

    /// Insert `s` at byte offset `at`.
    ///
    /// # Panics
    ///
    /// Reports `CursorOutOfRange` if `at > len`, or `NotCharBoundary` if `at`
    /// splits a character.
    #[track_caller]
    pub fn insert_str(&mut self, at: usize, s: &str) {
        self.check_boundary(at);
        if s.is_empty() {
            return;
        }
        if self.is_empty() {
            self.push_str(s);
            return;
        }
        let pos = self.bytes.position_at(at);
        self.bytes.insert_from(pos, s.as_bytes(), 1);
    }

    /// Append `count` copies of the current text to itself.
    #[track_caller]
    pub fn append_self(&mut self, count: usize) {
        if self.is_empty() || count == 0 {
            return;
        }
        self.unterminate();
        self.bytes.append_self(count);
        self.terminate();
    }

    /// Remove the bytes in `[from, to)`.
    ///
    /// # Panics
    ///
    /// Reports `InvalidRange` for a reversed or out-of-range span and
    /// `NotCharBoundary` if either end splits a character.
    #[track_caller]
    pub fn erase_range(&mut self, from: usize, to: usize) {
        check_range(from, to, self.len());
        self.check_boundary(from);
        self.check_boundary(to);
        if from == to {
            return;
        }
        if from == 0 && to == self.len() {
            self.clear();
            return;
        }
        let start = self.bytes.position_at(from);
        let end = self.bytes.position_at(to);
        self.bytes.erase_range(start, end);
    }

    /// Remove every character. Capacity is kept.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// The text as a string slice.
    pub fn as_str(&self) -> &str {
        let bytes = &self.bytes.as_slice()[..self.len()];
        // SAFETY: only whole `str`s are written and edits are restricted to
        // character boundaries, so the bytes before the NUL are valid UTF-8.
        unsafe { std::str::from_utf8_unchecked(bytes) }
    }

    /// The UTF-8 bytes, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    /// The UTF-8 bytes followed by one `0`.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        if self.bytes.is_empty() {
            return &[0];
        }
        self.bytes.as_slice()
    }

    fn unterminate(&mut self) {
        if !self.bytes.is_empty() {
            self.bytes.pop_back();
        }
    }

    fn terminate(&mut self) {
        if !self.bytes.is_empty() {
            self.bytes.push_back(0);
        }
    }

    #[track_caller]
    fn check_boundary(&self, at: usize) {
        let len = self.len();
        if at > len {
            violation(ContractViolation::CursorOutOfRange {
                position: at as isize,
                len,
            });
        }
        if !self.as_str().is_char_boundary(at) {
            violation(ContractViolation::NotCharBoundary { index: at });
        }
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        let mut text = Self::new();
        text.reserve(s.len());
        text.push_str(s);
        text
    }
}

impl fmt::Write for Text {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
