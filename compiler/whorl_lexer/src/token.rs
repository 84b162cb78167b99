//! Tokens produced by the lexer.

use whorl_grammar::LexMode;
use whorl_ir::{Span, StateId, SymbolId, TextLength};

/// One lexed token.
///
/// Tokens are transient: the parser turns them into leaf nodes right away.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub symbol: SymbolId,
    pub start: TextLength,
    pub end: TextLength,
    /// Furthest byte the lexer examined, exclusive. A peek at end of input
    /// counts as one byte past the end.
    pub lookahead_end: u32,
    /// Parse state the token was lexed in.
    pub parse_state: StateId,
    pub lex_mode: LexMode,
}

impl Token {
    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.start.bytes, self.end.bytes)
    }

    /// Size of the token.
    #[inline]
    pub fn len(&self) -> TextLength {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start.bytes == self.end.bytes
    }

    /// The end-of-input token.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.symbol.is_end()
    }

    /// A character no token could start with.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.symbol.is_error()
    }

    /// Bytes examined past the token's end.
    #[inline]
    pub fn lookahead_bytes(&self) -> u32 {
        self.lookahead_end.saturating_sub(self.end.bytes)
    }
}
