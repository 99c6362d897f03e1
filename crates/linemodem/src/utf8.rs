//! Repair path for multi-byte UTF-8 scalars split across chunk boundaries.
//!
//! Input arrives from a socket in arbitrarily-sized chunks, so a multi-byte
//! character can be cut anywhere. When the one-shot decode in the lexer runs
//! out of bytes, the consumed prefix is parked here and re-attempted as each
//! new byte arrives. Only continuation bytes (`0x80..=0xBF`) can extend a
//! parked sequence; anything else can never complete a decode and fails
//! right away, unconsumed, so line terminators and delimiters are never
//! swallowed into the park buffer. The buffer is a fixed four-byte array: a
//! valid UTF-8 scalar is at most four bytes, so four parked bytes with no
//! successful decode means the sequence is malformed, which bounds memory
//! use and turns permanently-broken input into a per-line error instead of
//! unbounded buffering.
//!
//! The arena's visible write cursor is untouched while bytes are parked; on
//! success the scalar is replayed into the normal accumulation path exactly
//! once.

use crate::error::ErrorCode;

/// What the repair engine did with the bytes it was fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Repaired {
    /// A whole scalar decoded; its bytes are in [`Utf8Repair::scalar`] and
    /// the input cursor should resume at `next`.
    Scalar {
        /// Index of the first input byte not consumed by the repair.
        next: usize,
    },
    /// The chunk ran out before the scalar completed; everything was parked
    /// and the caller should unwind without changing observable state.
    NeedMore,
}

/// Accumulator for a partially-decoded multi-byte sequence.
#[derive(Debug, Default)]
pub(crate) struct Utf8Repair {
    buf: [u8; 4],
    len: u8,
}

impl Utf8Repair {
    /// Whether a sequence is currently parked, i.e. the next input byte
    /// belongs to this engine no matter what it is.
    pub(crate) fn is_active(&self) -> bool {
        self.len > 0
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    /// The bytes of the scalar decoded by the last successful [`feed`].
    ///
    /// [`feed`]: Utf8Repair::feed
    pub(crate) fn scalar(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// Parks bytes starting at `input[pos]`, re-attempting a decode after
    /// each one.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::Encoding`] when a parked sequence meets a byte outside
    /// `0x80..=0xBF` (left unconsumed for the caller to rescan) or once four
    /// bytes are parked and still do not form a scalar. The park buffer is
    /// cleared either way.
    pub(crate) fn feed(&mut self, input: &[u8], mut pos: usize) -> Result<Repaired, ErrorCode> {
        loop {
            let b = input[pos];
            if self.len > 0 && !(0x80..=0xBF).contains(&b) {
                self.clear();
                return Err(ErrorCode::Encoding);
            }
            self.buf[self.len as usize] = b;
            self.len += 1;
            pos += 1;
            if self.len > 1 {
                let (ch, len) = bstr::decode_utf8(self.scalar());
                if ch.is_some() {
                    debug_assert_eq!(len, self.len as usize);
                    return Ok(Repaired::Scalar { next: pos });
                }
                if usize::from(self.len) == self.buf.len() {
                    self.clear();
                    return Err(ErrorCode::Encoding);
                }
            }
            if pos >= input.len() {
                return Ok(Repaired::NeedMore);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("é", 1)]
    #[case("北", 1)]
    #[case("北", 2)]
    #[case("👍", 1)]
    #[case("👍", 2)]
    #[case("👍", 3)]
    fn scalar_split_at_every_boundary(#[case] ch: &str, #[case] split: usize) {
        let bytes = ch.as_bytes();
        let mut repair = Utf8Repair::default();
        assert_eq!(repair.feed(&bytes[..split], 0), Ok(Repaired::NeedMore));
        assert!(repair.is_active());
        assert_eq!(
            repair.feed(&bytes[split..], 0),
            Ok(Repaired::Scalar {
                next: bytes.len() - split
            })
        );
        assert_eq!(repair.scalar(), bytes);
    }

    #[test]
    fn byte_at_a_time() {
        let bytes = "👍".as_bytes();
        let mut repair = Utf8Repair::default();
        for &b in &bytes[..3] {
            assert_eq!(repair.feed(&[b], 0), Ok(Repaired::NeedMore));
        }
        assert_eq!(
            repair.feed(&[bytes[3]], 0),
            Ok(Repaired::Scalar { next: 1 })
        );
        assert_eq!(repair.scalar(), bytes);
    }

    #[test]
    fn four_parked_bytes_with_no_scalar_are_malformed() {
        // 0xF5 is outside the valid lead range but its continuations park
        // normally; the budget catches it at the fourth byte.
        let mut repair = Utf8Repair::default();
        assert_eq!(
            repair.feed(&[0xF5, 0x80, 0x80, 0x80], 0),
            Err(ErrorCode::Encoding)
        );
        assert!(!repair.is_active());
    }

    #[rstest]
    #[case(b'a')]
    #[case(b'\n')]
    #[case(0xFF)]
    #[case(0xC3)]
    fn a_non_continuation_byte_after_a_lead_fails_fast(#[case] follow: u8) {
        // Nothing outside 0x80..=0xBF can ever complete the sequence; the
        // engine rejects it unconsumed instead of parking it.
        let mut repair = Utf8Repair::default();
        assert_eq!(repair.feed(&[0xC3], 0), Ok(Repaired::NeedMore));
        assert_eq!(repair.feed(&[follow], 0), Err(ErrorCode::Encoding));
        assert!(!repair.is_active());
    }

    #[test]
    fn consumes_from_offset() {
        let input = b"xx\xC3\xA9";
        let mut repair = Utf8Repair::default();
        assert_eq!(repair.feed(input, 2), Ok(Repaired::Scalar { next: 4 }));
        assert_eq!(repair.scalar(), "é".as_bytes());
    }
}
