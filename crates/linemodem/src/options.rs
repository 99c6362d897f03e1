/// Configuration for a [`Lexer`](crate::Lexer) session.
///
/// # Examples
///
/// ```rust
/// use linemodem::LexerOptions;
///
/// let options = LexerOptions {
///     buffer_size: 64 * 1024,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LexerOptions {
    /// Initial capacity, in bytes, of the arena backing the current line's
    /// tokens.
    ///
    /// The arena doubles on demand, so this is a starting point, not a
    /// limit; size it for the common line length to avoid growth on the hot
    /// path. Growth is capped at [`u32::MAX`] bytes, past which parsing
    /// fails terminally.
    ///
    /// # Default
    ///
    /// `4096`
    pub buffer_size: usize,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self { buffer_size: 4096 }
    }
}
