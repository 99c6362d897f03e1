use alloc::vec;

use super::{Entry, parse_all, parse_split, tok};
use crate::{Clause, ErrorCode};

#[test]
fn empty_tag_value_is_an_error_and_the_line_is_discarded() {
    assert_eq!(
        parse_all(b"measurement,tag1= field1=1\nm2,t=v f=2\n"),
        vec![
            tok(Clause::Measurement, "measurement"),
            tok(Clause::TagName, "tag1"),
            Entry::Error {
                position: 0,
                clause: Clause::TagValue,
                code: ErrorCode::Empty,
            },
            tok(Clause::Measurement, "m2"),
            tok(Clause::TagName, "t"),
            tok(Clause::TagValue, "v"),
            tok(Clause::FieldName, "f"),
            tok(Clause::FieldValue, "2"),
            Entry::LineEnd,
        ]
    );
}

#[test]
fn empty_measurement_is_an_error() {
    assert_eq!(
        parse_all(b",t=v f=1\n"),
        vec![Entry::Error {
            position: 0,
            clause: Clause::Measurement,
            code: ErrorCode::Empty,
        }]
    );
}

#[test]
fn tag_without_equals() {
    assert_eq!(
        parse_all(b"m,tag field=1\n"),
        vec![
            tok(Clause::Measurement, "m"),
            Entry::Error {
                position: 3,
                clause: Clause::TagName,
                code: ErrorCode::Expected,
            },
        ]
    );
}

#[test]
fn equals_in_measurement() {
    assert_eq!(
        parse_all(b"m=1 f=2\n"),
        vec![Entry::Error {
            position: 1,
            clause: Clause::Measurement,
            code: ErrorCode::Expected,
        }]
    );
}

#[test]
fn double_space_between_clauses() {
    assert_eq!(
        parse_all(b"m  f=1\n"),
        vec![
            tok(Clause::Measurement, "m"),
            Entry::Error {
                position: 0,
                clause: Clause::FieldName,
                code: ErrorCode::Expected,
            },
        ]
    );
}

#[test]
fn delimiter_after_timestamp() {
    assert_eq!(
        parse_all(b"m f=1 123,x\n"),
        vec![
            tok(Clause::Measurement, "m"),
            tok(Clause::FieldName, "f"),
            tok(Clause::FieldValue, "1"),
            Entry::Error {
                position: 3,
                clause: Clause::Timestamp,
                code: ErrorCode::Expected,
            },
        ]
    );
}

#[test]
fn name_at_line_end() {
    assert_eq!(
        parse_all(b"m,t=v,dangling\n"),
        vec![
            tok(Clause::Measurement, "m"),
            tok(Clause::TagName, "t"),
            tok(Clause::TagValue, "v"),
            Entry::Error {
                position: 8,
                clause: Clause::TagName,
                code: ErrorCode::Expected,
            },
        ]
    );
}

#[test]
fn a_terminator_triggered_error_does_not_discard_the_next_line() {
    // The newline that exposed the dangling name already ended the line,
    // so recovery must not scan for another one.
    assert_eq!(
        parse_all(b"m,t=v,dangling\nok f=1\n"),
        vec![
            tok(Clause::Measurement, "m"),
            tok(Clause::TagName, "t"),
            tok(Clause::TagValue, "v"),
            Entry::Error {
                position: 8,
                clause: Clause::TagName,
                code: ErrorCode::Expected,
            },
            tok(Clause::Measurement, "ok"),
            tok(Clause::FieldName, "f"),
            tok(Clause::FieldValue, "1"),
            Entry::LineEnd,
        ]
    );
}

#[test]
fn an_empty_timestamp_at_line_end_recovers_on_the_next_line() {
    assert_eq!(
        parse_all(b"m f=1 \nok f=2\n"),
        vec![
            tok(Clause::Measurement, "m"),
            tok(Clause::FieldName, "f"),
            tok(Clause::FieldValue, "1"),
            Entry::Error {
                position: 0,
                clause: Clause::Timestamp,
                code: ErrorCode::Empty,
            },
            tok(Clause::Measurement, "ok"),
            tok(Clause::FieldName, "f"),
            tok(Clause::FieldValue, "2"),
            Entry::LineEnd,
        ]
    );
}

#[test]
fn malformed_utf8_is_an_encoding_error_with_clean_recovery() {
    assert_eq!(
        parse_all(b"m,t=\xFF\xFF\xFF\xFF f=1\nm2 f=2\n"),
        vec![
            tok(Clause::Measurement, "m"),
            tok(Clause::TagName, "t"),
            Entry::Error {
                position: 0,
                clause: Clause::TagValue,
                code: ErrorCode::Encoding,
            },
            tok(Clause::Measurement, "m2"),
            tok(Clause::FieldName, "f"),
            tok(Clause::FieldValue, "2"),
            Entry::LineEnd,
        ]
    );
}

#[test]
fn a_terminator_behind_a_split_lead_byte_is_not_swallowed() {
    // The lead byte is parked at the first chunk's end; the newline that
    // follows can never continue it, so it must stay in the stream for
    // recovery instead of vanishing into the park buffer.
    assert_eq!(
        parse_split(&[b"m,t=\xC3", b"\nok f=1\n"]),
        vec![
            tok(Clause::Measurement, "m"),
            tok(Clause::TagName, "t"),
            Entry::Error {
                position: 0,
                clause: Clause::TagValue,
                code: ErrorCode::Encoding,
            },
            tok(Clause::Measurement, "ok"),
            tok(Clause::FieldName, "f"),
            tok(Clause::FieldValue, "1"),
            Entry::LineEnd,
        ]
    );
}

#[test]
fn no_state_bleed_from_a_discarded_quoted_line() {
    assert_eq!(
        parse_all(b"m,t= f=\"y z\"\nm2 f=\"ok\"\n"),
        vec![
            tok(Clause::Measurement, "m"),
            tok(Clause::TagName, "t"),
            Entry::Error {
                position: 0,
                clause: Clause::TagValue,
                code: ErrorCode::Empty,
            },
            tok(Clause::Measurement, "m2"),
            tok(Clause::FieldName, "f"),
            tok(Clause::FieldValue, "\"ok\""),
            Entry::LineEnd,
        ]
    );
}

#[test]
fn parse_last_in_skip_mode_reports_line_end_without_a_token() {
    assert_eq!(
        parse_all(b"m,t= f=1"),
        vec![
            tok(Clause::Measurement, "m"),
            tok(Clause::TagName, "t"),
            Entry::Error {
                position: 0,
                clause: Clause::TagValue,
                code: ErrorCode::Empty,
            },
            Entry::LineEnd,
        ]
    );
}

#[test]
fn error_position_counts_characters_not_bytes() {
    // Two three-byte scalars before the bad delimiter: column 2, not 6.
    assert_eq!(
        parse_all("北京=1 f=2\n".as_bytes()),
        vec![Entry::Error {
            position: 2,
            clause: Clause::Measurement,
            code: ErrorCode::Expected,
        }]
    );
}

#[test]
fn errors_on_consecutive_lines_are_each_reported() {
    assert_eq!(
        parse_all(b"m,t= f=1\nm2= x\nm3 f=3\n"),
        vec![
            tok(Clause::Measurement, "m"),
            tok(Clause::TagName, "t"),
            Entry::Error {
                position: 0,
                clause: Clause::TagValue,
                code: ErrorCode::Empty,
            },
            Entry::Error {
                position: 2,
                clause: Clause::Measurement,
                code: ErrorCode::Expected,
            },
            tok(Clause::Measurement, "m3"),
            tok(Clause::FieldName, "f"),
            tok(Clause::FieldValue, "3"),
            Entry::LineEnd,
        ]
    );
}
