use alloc::{string::String, vec::Vec};

use crate::{
    Clause, CommitMode, ErrorCode, LexerOptions, LineParser, Listener, Resolver, TokenSpan,
};

mod parse_bad;

/// Everything a listener can observe, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entry {
    Token(Clause, String),
    LineEnd,
    Error {
        position: usize,
        clause: Clause,
        code: ErrorCode,
    },
    Commit(CommitMode),
}

/// Listener that resolves every span eagerly and records the callbacks.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub(crate) entries: Vec<Entry>,
}

impl Listener for Recorder {
    fn on_event(&mut self, token: TokenSpan, clause: Clause, resolver: Resolver<'_>) {
        let text = resolver.get(token).unwrap();
        self.entries.push(Entry::Token(clause, String::from(text)));
    }

    fn on_line_end(&mut self, _resolver: Resolver<'_>) {
        self.entries.push(Entry::LineEnd);
    }

    fn on_error(&mut self, position: usize, clause: Clause, code: ErrorCode) {
        self.entries.push(Entry::Error {
            position,
            clause,
            code,
        });
    }

    fn commit_all(&mut self, mode: CommitMode) {
        self.entries.push(Entry::Commit(mode));
    }
}

pub(crate) fn tok(clause: Clause, text: &str) -> Entry {
    Entry::Token(clause, String::from(text))
}

/// Parses `input` as a single chunk, then flushes.
pub(crate) fn parse_all(input: &[u8]) -> Vec<Entry> {
    parse_split(&[input])
}

/// Parses `input` split into the given parts, then flushes.
pub(crate) fn parse_split(parts: &[&[u8]]) -> Vec<Entry> {
    let mut parser = LineParser::new(LexerOptions::default(), Recorder::default());
    for part in parts {
        parser.parse(part).unwrap();
    }
    parser.parse_last();
    parser.into_listener().entries
}
