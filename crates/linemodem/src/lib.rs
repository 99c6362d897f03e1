//! A streaming, incremental lexer for a line-oriented time-series wire
//! protocol: one record per line — measurement, comma-separated tags,
//! space-separated fields, optional timestamp — designed to be ingested
//! from network sockets.
//!
//! Input arrives in arbitrarily-sized chunks that may split a token, a
//! quoted string, an escape sequence or a multi-byte UTF-8 character across
//! chunk boundaries; the lexer resumes on the next chunk with no data loss
//! and no event duplication. Completed tokens are never copied: the listener
//! receives a [`TokenSpan`] and resolves it lazily through a [`Resolver`].
//!
//! # Examples
//!
//! ```rust
//! use linemodem::{Clause, ErrorCode, LexerOptions, LineParser, Listener, Resolver, TokenSpan};
//!
//! struct Printer;
//!
//! impl Listener for Printer {
//!     fn on_event(&mut self, token: TokenSpan, clause: Clause, resolver: Resolver<'_>) {
//!         println!("{clause:?}: {:?}", resolver.get(token).unwrap());
//!     }
//!
//!     fn on_line_end(&mut self, _resolver: Resolver<'_>) {
//!         println!("line end");
//!     }
//!
//!     fn on_error(&mut self, position: usize, clause: Clause, code: ErrorCode) {
//!         println!("error in {clause:?} at {position}: {code}");
//!     }
//! }
//!
//! let mut parser = LineParser::new(LexerOptions::default(), Printer);
//! parser.parse(b"weather,city=sf temp=71 1465839830100400200\n").unwrap();
//! parser.parse_last();
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod arena;
mod error;
mod lexer;
mod options;
mod parser;
mod utf8;

#[cfg(test)]
mod tests;

pub use arena::{Resolver, TokenSpan};
pub use error::{BufferOverflow, ErrorCode, SpanError};
pub use lexer::{Clause, ErrorState, Lexer, LineBoundaryObserver, Outcome};
pub use options::LexerOptions;
pub use parser::{CommitMode, LineParser, Listener};
