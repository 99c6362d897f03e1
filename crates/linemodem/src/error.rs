//! Error types for the lexer, the arena, and token-span resolution.
//!
//! Recoverable per-line protocol errors ([`ErrorCode`]) are delivered to the
//! listener via `on_error` and never surface as `Result`s: the lexer discards
//! the rest of the offending line and resumes at the next terminator. Only
//! [`BufferOverflow`] is a genuine `Err` — it means a single token outgrew the
//! addressable arena, which is a protocol violation or a resource-exhaustion
//! attack, and the owning session must treat it as connection-ending.

use thiserror::Error;

/// Why the state machine abandoned the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorCode {
    /// A non-field clause completed with zero length (empty measurement,
    /// tag name/value or timestamp). Field values are exempt: `key=` is a
    /// legal empty value.
    #[error("empty token in a clause that requires content")]
    Empty,
    /// A delimiter arrived in a clause that does not accept it, e.g. `=`
    /// while reading a measurement or `,` while reading a timestamp.
    #[error("unexpected delimiter for the current clause")]
    Expected,
    /// A multi-byte UTF-8 sequence could not be decoded within the bounded
    /// repair budget.
    #[error("malformed UTF-8 sequence")]
    Encoding,
}

/// Fatal: doubling the arena would exceed its addressable capacity.
///
/// Token spans address the arena with 32-bit offsets, so the backing buffer
/// cannot grow past [`u32::MAX`] bytes. A single token that large is not a
/// transient condition; the lexer instance must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("line buffer cannot grow past {max} bytes")]
pub struct BufferOverflow {
    /// The capacity ceiling that doubling would have crossed.
    pub max: usize,
}

/// A [`TokenSpan`](crate::TokenSpan) could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpanError {
    /// The arena has been mutated since the span was issued. Spans are
    /// single-use: resolve them inside the listener callback that delivered
    /// them.
    #[error("token span is stale: the arena has been mutated since it was issued")]
    Stale,
    /// The span does not lie within the arena's written region.
    #[error("token span {start}..{end} is out of bounds")]
    OutOfBounds {
        /// Start offset carried by the span.
        start: u32,
        /// End offset carried by the span.
        end: u32,
    },
}
