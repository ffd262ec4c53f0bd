//! Byte cursor for scanning a line or an inline run.
//!
//! Index based and `Copy`, so a recogniser can clone the cursor, probe ahead
//! and commit by assigning it back.

use memchr::memchr;

/// A position within a byte slice.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Cursor at `pos`, clamped to the end of `input`.
    #[inline]
    pub fn new_at(input: &'a [u8], pos: usize) -> Self {
        Self {
            input,
            pos: pos.min(input.len()),
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn bump(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    /// Move to an absolute position.
    #[inline]
    pub fn set_offset(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    pub fn at(&self, b: u8) -> bool {
        self.peek() == Some(b)
    }

    #[inline]
    pub fn at_any(&self, set: &[u8]) -> bool {
        self.peek().is_some_and(|b| set.contains(&b))
    }

    /// Consume `b` if it is next.
    #[inline]
    pub fn eat(&mut self, b: u8) -> bool {
        if self.at(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip bytes matching `pred`, returning how many were skipped.
    #[inline]
    pub fn skip_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.pos += 1;
        }
        self.pos - start
    }

    /// Skip spaces and tabs.
    #[inline]
    pub fn skip_spaces(&mut self) -> usize {
        self.skip_while(|b| b == b' ' || b == b'\t')
    }

    /// Skip spaces, tabs and at most one line ending.
    pub fn skip_spaces_and_newline(&mut self) -> bool {
        self.skip_spaces();
        let had_newline = self.eat(b'\r') | self.eat(b'\n');
        self.skip_spaces();
        had_newline
    }

    #[inline]
    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Offset of the next `b` at or after the cursor.
    #[inline]
    pub fn find(&self, b: u8) -> Option<usize> {
        memchr(b, self.remaining_slice()).map(|i| self.pos + i)
    }
}
