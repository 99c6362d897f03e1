//! The byte-granular lexer state machine.
//!
//! [`Lexer::parse`] classifies one byte at a time against the active clause
//! and the quote/escape flags, accumulating token bytes into the arena and
//! yielding to the caller whenever a token completes, a line ends, or the
//! current line has to be abandoned. Everything needed to resume mid-token —
//! the active clause, a pending "next clause" scheduled by a delimiter, the
//! quote/escape flags, the last delivered outcome and any parked UTF-8
//! prefix — lives in the lexer, so input may be cut anywhere, including
//! inside an escape sequence or a multi-byte character.
//!
//! A delimiter-triggered transition is split into two half-steps: the call
//! that sees the delimiter fires the event for the clause that just ended
//! and merely *schedules* the next clause; the continuation is applied at
//! the start of the following call, after the caller has consumed the token.
//! Collapsing this into one step would start the new clause's accumulation
//! one byte early or late.

use crate::{
    arena::{Arena, Resolver, TokenSpan},
    error::{BufferOverflow, ErrorCode},
    options::LexerOptions,
    utf8::{Repaired, Utf8Repair},
};

/// The clause of the line the lexer is currently accumulating.
///
/// Advances monotonically within a line and resets to [`Measurement`] at
/// line end.
///
/// [`Measurement`]: Clause::Measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    /// The leading measurement (table) name.
    Measurement,
    /// A tag name, between `,` and `=`.
    TagName,
    /// A tag value, between `=` and `,` or space.
    TagValue,
    /// A field name, between `,`/space and `=`.
    FieldName,
    /// A field value; the only clause for which an empty token is legal.
    FieldValue,
    /// The trailing timestamp.
    Timestamp,
}

/// What a call to [`Lexer::parse`] or [`Lexer::parse_last`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The input range is exhausted (or a split multi-byte character needs
    /// more bytes); supply the next chunk.
    Continue,
    /// A token completed; consume it via [`Lexer::token`] before the next
    /// call.
    Event,
    /// A line ended. The final token of the line (if any) accompanies it.
    LineEnd,
    /// The current line cannot continue; see [`Lexer::error`]. Remaining
    /// bytes of the line are discarded and parsing resumes at the next
    /// terminator, or immediately when the terminator itself triggered the
    /// error.
    Error,
}

/// Details of the structural or encoding error that abandoned a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorState {
    /// What went wrong.
    pub code: ErrorCode,
    /// Token-relative character offset, suitable for user-facing column
    /// numbers.
    pub position: usize,
}

/// Hooks at line boundaries, for embedders that meter or interleave work.
///
/// The lexer is generic over its observer with `()` as the do-nothing
/// default.
pub trait LineBoundaryObserver {
    /// Called when skip-line recovery reaches a terminator and normal
    /// parsing resumes.
    fn skip_line_complete(&mut self) {}

    /// Checked before each byte; returning `true` suspends the byte loop
    /// and yields [`Outcome::Continue`] to the caller.
    fn partial_complete(&mut self) -> bool {
        false
    }
}

impl LineBoundaryObserver for () {}

/// Either a settled clause or a transition fired but not yet applied.
///
/// `Pending` exists between the call that fired a delimiter event and the
/// next call into the lexer; it is consumed exactly once.
#[derive(Debug, Clone, Copy)]
enum ClauseState {
    Active(Clause),
    Pending { fired: Clause, next: Clause },
}

impl ClauseState {
    fn current(self) -> Clause {
        match self {
            ClauseState::Active(clause) | ClauseState::Pending { fired: clause, .. } => clause,
        }
    }
}

/// Internal error channel: structural faults become skip-line recovery,
/// growth faults abort the instance.
enum Fault {
    Structural(ErrorCode),
    Grow(BufferOverflow),
}

impl From<BufferOverflow> for Fault {
    fn from(e: BufferOverflow) -> Self {
        Fault::Grow(e)
    }
}

/// Streaming lexer for the line protocol.
///
/// One instance owns one logical byte stream; see [`LineParser`] for the
/// driver that couples it to a listener.
///
/// [`LineParser`]: crate::LineParser
#[derive(Debug)]
pub struct Lexer<O = ()> {
    arena: Arena,
    repair: Utf8Repair,
    clause: ClauseState,
    escape: bool,
    // Saw a `\` inside a quoted string; only meaningful to a following `"`.
    escape_quote: bool,
    quoted: bool,
    skip_line: bool,
    // The failing byte was the terminator itself; recovery needs no skip
    // scan because the line is already over.
    eol_error: bool,
    last_byte: u8,
    last_outcome: Outcome,
    error: Option<ErrorState>,
    pos: usize,
    observer: O,
}

impl Lexer<()> {
    /// Creates a lexer with the do-nothing line-boundary observer.
    #[must_use]
    pub fn new(options: LexerOptions) -> Self {
        Self::with_observer(options, ())
    }
}

impl<O: LineBoundaryObserver> Lexer<O> {
    /// Creates a lexer with a custom line-boundary observer.
    pub fn with_observer(options: LexerOptions, observer: O) -> Self {
        Self {
            arena: Arena::with_capacity(options.buffer_size),
            repair: Utf8Repair::default(),
            clause: ClauseState::Active(Clause::Measurement),
            escape: false,
            escape_quote: false,
            quoted: false,
            skip_line: false,
            eol_error: false,
            last_byte: 0,
            last_outcome: Outcome::Continue,
            error: None,
            pos: 0,
            observer,
        }
    }

    /// Feeds a chunk of the byte stream.
    ///
    /// Returns as soon as a token completes, a line ends or the current line
    /// fails, so one chunk usually takes several calls; [`consumed`] reports
    /// how far into `input` this call got and is authoritative. On
    /// [`Outcome::Continue`] the whole slice has been consumed (appended or
    /// parked) unless the observer suspended the byte loop; never re-feed
    /// consumed bytes.
    ///
    /// # Errors
    ///
    /// [`BufferOverflow`] if a single token outgrew the addressable arena.
    /// The instance is unusable afterwards and must be discarded.
    ///
    /// [`consumed`]: Lexer::consumed
    pub fn parse(&mut self, input: &[u8]) -> Result<Outcome, BufferOverflow> {
        self.process_continuation();
        self.parse_partial(input)
    }

    /// Signals end of input: terminates the final line as if a terminator
    /// were appended, delivering any pending token. In skip mode it reports
    /// the line end without a trailing event.
    pub fn parse_last(&mut self) -> Outcome {
        self.process_continuation();
        if self.skip_line {
            self.last_outcome = Outcome::LineEnd;
            return Outcome::LineEnd;
        }
        match self.end_of_line() {
            Ok(outcome) => {
                self.last_outcome = outcome;
                outcome
            }
            Err(code) => self.fail(code),
        }
    }

    /// Resets the session for a fresh stream. The arena allocation is
    /// retained.
    pub fn clear(&mut self) {
        self.reset_line();
        self.pos = 0;
    }

    /// The clause the last outcome was delivered in.
    pub fn clause(&self) -> Clause {
        self.clause.current()
    }

    /// Error details after [`Outcome::Error`].
    pub fn error(&self) -> Option<ErrorState> {
        self.error
    }

    /// Bytes of the last `parse` call's input slice that were consumed.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Span of the just-completed token, or `None` when a line end is being
    /// reported for a discarded (skipped) line.
    pub fn token(&self) -> Option<TokenSpan> {
        if self.skip_line {
            None
        } else {
            Some(self.arena.token_span())
        }
    }

    /// A resolver over the current arena contents.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.arena)
    }

    /// Applies the half of the previous outcome that had to wait until the
    /// caller consumed the token: chop after an event, full line reset after
    /// a line end, then settle any scheduled clause transition.
    fn process_continuation(&mut self) {
        match self.last_outcome {
            Outcome::Event => {
                self.arena.chop();
                if let ClauseState::Pending { next, .. } = self.clause {
                    self.clause = ClauseState::Active(next);
                }
            }
            Outcome::LineEnd => self.reset_line(),
            Outcome::Error => {
                if self.eol_error {
                    self.reset_line();
                }
            }
            Outcome::Continue => {}
        }
        self.last_outcome = Outcome::Continue;
    }

    fn reset_line(&mut self) {
        self.arena.rewind();
        self.repair.clear();
        self.clause = ClauseState::Active(Clause::Measurement);
        self.escape = false;
        self.escape_quote = false;
        self.quoted = false;
        self.skip_line = false;
        self.eol_error = false;
        self.last_byte = 0;
        self.error = None;
        self.last_outcome = Outcome::Continue;
    }

    fn parse_partial(&mut self, input: &[u8]) -> Result<Outcome, BufferOverflow> {
        let mut p = 0;
        while p < input.len() && !self.observer.partial_complete() {
            let b = input[p];

            if self.skip_line {
                p += 1;
                self.last_byte = 0;
                if b == b'\n' || b == b'\r' {
                    self.reset_line();
                    self.observer.skip_line_complete();
                }
                continue;
            }

            if self.repair.is_active() || b >= 0x80 {
                match self.accumulate_multibyte(input, p) {
                    Ok(Some(next)) => {
                        self.last_byte = b;
                        if self.escape {
                            self.escape = false;
                        } else {
                            self.escape_quote = false;
                        }
                        p = next;
                        continue;
                    }
                    Ok(None) => {
                        // Split scalar: everything is parked, the visible
                        // write cursor is unchanged.
                        self.pos = input.len();
                        return Ok(Outcome::Continue);
                    }
                    Err(Fault::Structural(code)) => {
                        // Leave `pos` at the sequence start so skip mode
                        // rescans the garbage for a terminator.
                        self.pos = p;
                        return Ok(self.fail(code));
                    }
                    Err(Fault::Grow(e)) => return Err(e),
                }
            }

            p += 1;

            if self.escape {
                self.arena.push(b)?;
                self.escape = false;
                self.last_byte = b;
                continue;
            }

            let step = match b {
                b'"' => self.on_quote(),
                b'\\' => self.on_backslash(),
                b'\n' | b'\r' => self.on_terminator(b),
                b' ' => self.on_space(),
                b',' => self.on_comma(),
                b'=' => self.on_equals(),
                _ => self.on_content(b),
            };
            self.last_byte = b;
            match step {
                Ok(Outcome::Continue) => {}
                Ok(outcome) => {
                    self.pos = p;
                    self.last_outcome = outcome;
                    return Ok(outcome);
                }
                Err(Fault::Structural(code)) => {
                    self.pos = p;
                    return Ok(self.fail(code));
                }
                Err(Fault::Grow(e)) => return Err(e),
            }
        }
        self.pos = p;
        Ok(Outcome::Continue)
    }

    /// Decodes a multi-byte scalar starting (or resuming) at `input[p]`.
    /// `Ok(Some(next))` appended a whole scalar, `Ok(None)` parked a split
    /// one.
    fn accumulate_multibyte(&mut self, input: &[u8], p: usize) -> Result<Option<usize>, Fault> {
        if !self.repair.is_active() {
            let (ch, len) = bstr::decode_utf8(&input[p..]);
            if ch.is_some() {
                self.arena.push_scalar(&input[p..p + len])?;
                return Ok(Some(p + len));
            }
        }
        match self.repair.feed(input, p) {
            Ok(Repaired::Scalar { next }) => {
                let mut scalar = [0u8; 4];
                let len = self.repair.scalar().len();
                scalar[..len].copy_from_slice(self.repair.scalar());
                self.repair.clear();
                self.arena.push_scalar(&scalar[..len])?;
                Ok(Some(next))
            }
            Ok(Repaired::NeedMore) => Ok(None),
            Err(code) => Err(Fault::Structural(code)),
        }
    }

    fn on_content(&mut self, b: u8) -> Result<Outcome, Fault> {
        self.arena.push(b)?;
        // A non-quote byte cancels a dangling escape-quote marker: the
        // escape only matters to the following quote.
        self.escape_quote = false;
        Ok(Outcome::Continue)
    }

    fn on_quote(&mut self) -> Result<Outcome, Fault> {
        self.arena.push(b'"')?;
        if self.last_byte == b'=' && !self.escape_quote && !self.quoted {
            self.quoted = true;
        } else if self.quoted && !self.escape_quote {
            self.quoted = false;
        }
        self.escape_quote = false;
        Ok(Outcome::Continue)
    }

    fn on_backslash(&mut self) -> Result<Outcome, Fault> {
        if self.quoted {
            // Inside a string the backslash is content; remember it in case
            // a quote follows.
            self.arena.push(b'\\')?;
            self.escape_quote = true;
        } else {
            self.escape = true;
        }
        Ok(Outcome::Continue)
    }

    fn on_comma(&mut self) -> Result<Outcome, Fault> {
        if !self.escape_quote && !self.quoted {
            return self.fire_value_transition(Clause::TagName, Clause::FieldName);
        }
        self.arena.push(b',')?;
        self.escape_quote = false;
        Ok(Outcome::Continue)
    }

    fn on_equals(&mut self) -> Result<Outcome, Fault> {
        if !self.escape_quote && !self.quoted {
            return self.fire_name_transition();
        }
        self.arena.push(b'=')?;
        self.escape_quote = false;
        Ok(Outcome::Continue)
    }

    fn on_space(&mut self) -> Result<Outcome, Fault> {
        if !self.escape_quote && !self.quoted {
            return self.fire_value_transition(Clause::FieldName, Clause::Timestamp);
        }
        self.arena.push(b' ')?;
        self.escape_quote = false;
        Ok(Outcome::Continue)
    }

    fn on_terminator(&mut self, b: u8) -> Result<Outcome, Fault> {
        if self.quoted {
            // Inside an open quote a terminator is content.
            self.arena.push(b)?;
            return Ok(Outcome::Continue);
        }
        match self.end_of_line() {
            Ok(outcome) => Ok(outcome),
            Err(code) => {
                self.eol_error = true;
                Err(Fault::Structural(code))
            }
        }
    }

    /// A value clause ended: schedule the clause that follows it and fire.
    /// `after_value` follows a measurement or tag value, `after_field` a
    /// field value.
    fn fire_value_transition(
        &mut self,
        after_value: Clause,
        after_field: Clause,
    ) -> Result<Outcome, Fault> {
        let fired = self.clause.current();
        let next = match fired {
            Clause::Measurement | Clause::TagValue => after_value,
            Clause::FieldValue => after_field,
            _ => return Err(Fault::Structural(ErrorCode::Expected)),
        };
        self.clause = ClauseState::Pending { fired, next };
        self.fire_event()
    }

    /// A name clause ended at `=`: its value clause follows.
    fn fire_name_transition(&mut self) -> Result<Outcome, Fault> {
        let fired = self.clause.current();
        let next = match fired {
            Clause::TagName => Clause::TagValue,
            Clause::FieldName => Clause::FieldValue,
            _ => return Err(Fault::Structural(ErrorCode::Expected)),
        };
        self.clause = ClauseState::Pending { fired, next };
        self.fire_event()
    }

    fn fire_event(&mut self) -> Result<Outcome, Fault> {
        // Fields take empty values, same as null; everything else must have
        // at least one character.
        if self.arena.token_is_empty() && self.clause.current() != Clause::FieldValue {
            return Err(Fault::Structural(ErrorCode::Empty));
        }
        Ok(Outcome::Event)
    }

    fn end_of_line(&mut self) -> Result<Outcome, ErrorCode> {
        match self.clause.current() {
            Clause::Measurement if self.arena.token_is_empty() => {
                // Blank line: legal, produces no events at all. This also
                // keeps `\r\n` from ending a line twice.
                self.arena.chop();
                Ok(Outcome::Continue)
            }
            Clause::Measurement | Clause::TagValue | Clause::Timestamp => {
                if self.arena.token_is_empty() {
                    Err(ErrorCode::Empty)
                } else {
                    Ok(Outcome::LineEnd)
                }
            }
            Clause::FieldValue => Ok(Outcome::LineEnd),
            // A name with no `=` cannot end a line.
            Clause::TagName | Clause::FieldName => Err(ErrorCode::Expected),
        }
    }

    fn fail(&mut self, code: ErrorCode) -> Outcome {
        self.skip_line = true;
        if let ClauseState::Pending { fired, .. } = self.clause {
            self.clause = ClauseState::Active(fired);
        }
        self.error = Some(ErrorState {
            code,
            position: self.arena.token_chars(),
        });
        self.last_outcome = Outcome::Error;
        Outcome::Error
    }

    #[cfg(test)]
    pub(crate) fn arena_capacity(&self) -> usize {
        self.arena.capacity()
    }
}
