//! Growable byte arena and zero-copy token spans.
//!
//! The arena is the exclusively-owned backing store for the current line's
//! unresolved bytes. Completed tokens are never copied out: the lexer hands
//! the listener a lightweight [`TokenSpan`] and the listener resolves it into
//! a `&str` lazily through a [`Resolver`].
//!
//! Two cursors matter: `token_start` (first byte of the token currently being
//! accumulated) and `write_pos` (next write position). The invariant
//! `0 <= token_start <= write_pos <= capacity` holds at all times. Growth
//! doubles the backing buffer in place; because all cursors are indices, not
//! pointers, relocation preserves the live window without any rebasing.
//!
//! Spans carry the arena generation at which they were issued. `chop`,
//! `rewind` and growth bump the generation, so a span held past the listener
//! callback that delivered it resolves to [`SpanError::Stale`] instead of
//! aliasing recycled bytes.

use alloc::vec::Vec;

use crate::error::{BufferOverflow, SpanError};

/// Offsets are 32-bit so a span stays two words; this also caps growth.
const MAX_CAPACITY: usize = u32::MAX as usize;

/// A zero-copy reference to a just-completed token's byte range.
///
/// Valid only until the arena is mutated again: consume it inside the
/// listener callback that delivered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    start: u32,
    end: u32,
    generation: u32,
}

impl TokenSpan {
    /// Length of the token in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Returns `true` for a zero-length token (only field values produce
    /// these).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug)]
pub(crate) struct Arena {
    buf: Vec<u8>,
    token_start: usize,
    write_pos: usize,
    generation: u32,
}

impl Arena {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        // A zero-capacity arena could never double its way to usable space.
        let capacity = capacity.max(16).min(MAX_CAPACITY);
        Self {
            buf: alloc::vec![0; capacity],
            token_start: 0,
            write_pos: 0,
            generation: 0,
        }
    }

    /// Appends one byte, growing if the write cursor is at the high-water
    /// mark.
    pub(crate) fn push(&mut self, b: u8) -> Result<(), BufferOverflow> {
        if self.write_pos == self.buf.len() {
            self.grow(1)?;
        }
        self.buf[self.write_pos] = b;
        self.write_pos += 1;
        Ok(())
    }

    /// Appends the UTF-8 bytes of one whole scalar.
    pub(crate) fn push_scalar(&mut self, bytes: &[u8]) -> Result<(), BufferOverflow> {
        if self.write_pos + bytes.len() > self.buf.len() {
            self.grow(bytes.len())?;
        }
        self.buf[self.write_pos..self.write_pos + bytes.len()].copy_from_slice(bytes);
        self.write_pos += bytes.len();
        Ok(())
    }

    fn grow(&mut self, needed: usize) -> Result<(), BufferOverflow> {
        let mut capacity = self.buf.len();
        while capacity - self.write_pos < needed {
            capacity = capacity
                .checked_mul(2)
                .filter(|c| *c <= MAX_CAPACITY)
                .ok_or(BufferOverflow { max: MAX_CAPACITY })?;
        }
        self.buf.resize(capacity, 0);
        self.generation = self.generation.wrapping_add(1);
        Ok(())
    }

    /// Collapses the token start to the write cursor: the just-delivered
    /// token's bytes stay in place but can no longer be addressed.
    pub(crate) fn chop(&mut self) {
        self.token_start = self.write_pos;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Reclaims the whole line: both cursors return to the buffer base
    /// without touching the allocation. This is what keeps memory bounded
    /// across a long-lived connection.
    pub(crate) fn rewind(&mut self) {
        self.token_start = 0;
        self.write_pos = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn token_is_empty(&self) -> bool {
        self.token_start == self.write_pos
    }

    /// Span over `[token_start, write_pos)` at the current generation.
    pub(crate) fn token_span(&self) -> TokenSpan {
        #[allow(clippy::cast_possible_truncation)] // capacity is capped at u32::MAX
        TokenSpan {
            start: self.token_start as u32,
            end: self.write_pos as u32,
            generation: self.generation,
        }
    }

    /// Character count of the in-progress token, for user-facing column
    /// numbers in error reports.
    pub(crate) fn token_chars(&self) -> usize {
        let mut bytes = &self.buf[self.token_start..self.write_pos];
        let mut count = 0;
        while !bytes.is_empty() {
            let (_, len) = bstr::decode_utf8(bytes);
            if len == 0 {
                break;
            }
            bytes = &bytes[len..];
            count += 1;
        }
        count
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }
}

/// Resolves [`TokenSpan`]s into string views of the arena.
///
/// Handed to the listener alongside each event; borrows the arena for the
/// duration of the callback, so resolved `&str`s cannot outlive it.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    arena: &'a Arena,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(arena: &'a Arena) -> Self {
        Self { arena }
    }

    /// Resolves `span` into the token text it addresses.
    ///
    /// # Errors
    ///
    /// [`SpanError::Stale`] if the arena has been mutated since the span was
    /// issued, [`SpanError::OutOfBounds`] if the span does not lie within the
    /// written region.
    pub fn get(&self, span: TokenSpan) -> Result<&'a str, SpanError> {
        if span.generation != self.arena.generation {
            return Err(SpanError::Stale);
        }
        let (start, end) = (span.start as usize, span.end as usize);
        if start > end || end > self.arena.write_pos {
            return Err(SpanError::OutOfBounds {
                start: span.start,
                end: span.end,
            });
        }
        let bytes = &self.arena.buf[start..end];
        // The arena only ever receives whole scalars, so the window is valid
        // UTF-8 by construction.
        debug_assert!(core::str::from_utf8(bytes).is_ok());
        Ok(unsafe { core::str::from_utf8_unchecked(bytes) })
    }
}
