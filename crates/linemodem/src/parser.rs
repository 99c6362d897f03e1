//! The parser driver: couples the lexer to a listener.
//!
//! [`LineParser::parse`] feeds a byte range into the state machine, looping
//! while the machine can make further progress inside the same range, and
//! translates terminal outcomes into listener callbacks — so one call can
//! deliver many lines' worth of events if the chunk contains them. Events
//! reach the listener in the exact order the corresponding clauses completed
//! in the input; there is no reordering or batching across lines.

use crate::{
    arena::{Resolver, TokenSpan},
    error::{BufferOverflow, ErrorCode},
    lexer::{Clause, Lexer, LineBoundaryObserver, Outcome},
    options::LexerOptions,
};

/// Durability hint forwarded verbatim to the listener by
/// [`LineParser::commit_all`]; it has no parsing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Commit without waiting for storage to sync.
    NoSync,
    /// Commit and sync before returning.
    Sync,
    /// Commit and sync in the background.
    Async,
}

/// Consumer of structural events and token handles.
///
/// Token spans are single-use: resolve them inside the callback that
/// delivered them. Type coercion of field values (integer, float, string,
/// boolean) is the listener's responsibility; the lexer only guarantees
/// delimiter structure.
pub trait Listener {
    /// One completed name/value token; `clause` is the clause it completed
    /// in.
    fn on_event(&mut self, token: TokenSpan, clause: Clause, resolver: Resolver<'_>);

    /// A line completed, after its final `on_event`.
    fn on_line_end(&mut self, resolver: Resolver<'_>);

    /// The current line was abandoned; its remaining bytes are discarded and
    /// parsing resumes after the next terminator. `position` is a
    /// token-relative character offset.
    fn on_error(&mut self, position: usize, clause: Clause, code: ErrorCode);

    /// Batching hint passed through from the driver.
    fn commit_all(&mut self, mode: CommitMode) {
        let _ = mode;
    }
}

/// Drives a [`Lexer`] over chunked input and dispatches to a [`Listener`].
///
/// One instance per logical stream (one connection); independent streams run
/// in parallel by owning independent instances.
#[derive(Debug)]
pub struct LineParser<L, O = ()> {
    lexer: Lexer<O>,
    listener: L,
}

impl<L: Listener> LineParser<L> {
    /// Creates a driver with the do-nothing line-boundary observer.
    pub fn new(options: LexerOptions, listener: L) -> Self {
        Self {
            lexer: Lexer::new(options),
            listener,
        }
    }
}

impl<L: Listener, O: LineBoundaryObserver> LineParser<L, O> {
    /// Creates a driver whose lexer reports line-boundary hooks to
    /// `observer`.
    pub fn with_observer(options: LexerOptions, listener: L, observer: O) -> Self {
        Self {
            lexer: Lexer::with_observer(options, observer),
            listener,
        }
    }

    /// Feeds one chunk, dispatching every event, line end and line error it
    /// completes, and returns how many bytes of `bytes` were consumed.
    ///
    /// The count falls short of `bytes.len()` only when the lexer's
    /// [`LineBoundaryObserver`] suspended the byte loop; re-feed the tail
    /// once it resumes. Otherwise the whole chunk is consumed, even when a
    /// multi-byte character is split at its end (the prefix is parked).
    ///
    /// # Errors
    ///
    /// [`BufferOverflow`] is terminal: the session must be discarded.
    pub fn parse(&mut self, mut bytes: &[u8]) -> Result<usize, BufferOverflow> {
        let mut fed = 0;
        while !bytes.is_empty() {
            let outcome = self.lexer.parse(bytes)?;
            fed += self.lexer.consumed();
            bytes = &bytes[self.lexer.consumed()..];
            if outcome == Outcome::Continue {
                break;
            }
            self.dispatch(outcome);
        }
        Ok(fed)
    }

    /// Signals end of input, delivering any final pending event.
    pub fn parse_last(&mut self) {
        let outcome = self.lexer.parse_last();
        self.dispatch(outcome);
    }

    /// Forwards a commit hint to the listener.
    pub fn commit_all(&mut self, mode: CommitMode) {
        self.listener.commit_all(mode);
    }

    /// Resets the session for a fresh stream, retaining allocations.
    pub fn clear(&mut self) {
        self.lexer.clear();
    }

    /// Shared access to the listener.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Exclusive access to the listener.
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Consumes the driver, returning the listener.
    pub fn into_listener(self) -> L {
        self.listener
    }

    fn dispatch(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Continue => {}
            Outcome::Event => {
                if let Some(token) = self.lexer.token() {
                    self.listener
                        .on_event(token, self.lexer.clause(), self.lexer.resolver());
                }
            }
            Outcome::LineEnd => {
                if let Some(token) = self.lexer.token() {
                    self.listener
                        .on_event(token, self.lexer.clause(), self.lexer.resolver());
                }
                self.listener.on_line_end(self.lexer.resolver());
            }
            Outcome::Error => {
                if let Some(err) = self.lexer.error() {
                    self.listener
                        .on_error(err.position, self.lexer.clause(), err.code);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn lexer(&self) -> &Lexer<O> {
        &self.lexer
    }
}
