//! Table-driven lexing.
//!
//! [`Lexer::next_token`] produces one token for a parse state:
//!
//! 1. If the state's lex mode has valid external tokens and the grammar has
//!    an external scanner, the scanner runs first from the raw position.
//!    If it declines, the cursor is reset.
//! 2. Separator characters are skipped.
//! 3. At end of input the `END` token is returned.
//! 4. The DFA runs from the mode's lex state with maximal munch, backing up
//!    to the last accepting position.
//! 5. If no prefix is accepted, an `ERROR` token covering one character is
//!    returned and the parser recovers from it.
//!
//! Every character the lexer looks at, including the failed scanner attempt
//! and the character that stopped the DFA, extends the token's
//! `lookahead_end`. Incremental reparsing uses that range to decide whether
//! an edit could change the token.

use std::cell::Cell;

use tracing::trace;
use whorl_grammar::{Grammar, LexMode, ScanContext};
use whorl_ir::{StateId, SymbolId, TextLength};

use crate::{Cursor, SourceBuffer, Token};

/// Furthest examined byte, exclusive.
#[derive(Clone, Copy, Debug)]
struct Examined {
    end: u32,
    source_len: u32,
}

impl Examined {
    fn new(source_len: u32) -> Self {
        Examined { end: 0, source_len }
    }

    /// Look at the character under the cursor, recording the bytes seen.
    #[inline]
    fn peek(&mut self, cursor: &Cursor<'_>) -> Option<char> {
        match cursor.peek_char() {
            Some((c, width)) => {
                self.end = self.end.max(cursor.pos() + width);
                Some(c)
            }
            None => {
                self.end = self.end.max(self.source_len + 1);
                None
            }
        }
    }
}

/// Lexer for one source text and grammar.
#[derive(Clone, Copy, Debug)]
pub struct Lexer<'a> {
    grammar: &'a Grammar,
    source: &'a SourceBuffer,
}

impl<'a> Lexer<'a> {
    pub fn new(grammar: &'a Grammar, source: &'a SourceBuffer) -> Self {
        Lexer { grammar, source }
    }

    pub fn source(&self) -> &'a SourceBuffer {
        self.source
    }

    /// Position of the first non-separator character at or after `position`.
    pub fn skip_separators(&self, position: TextLength) -> TextLength {
        let separators = self.grammar.separators();
        let mut cursor = self.source.cursor_at(position);
        while let Some(c) = cursor.lookahead() {
            if !separators.contains(c) {
                break;
            }
            cursor.advance_char();
        }
        cursor.position()
    }

    /// Lex one token at `position` using the lex mode of `state`.
    pub fn next_token(&self, state: StateId, position: TextLength) -> Token {
        self.next_token_in_mode(state, self.grammar.lex_mode(state), position)
    }

    /// Lex one token at `position` using `mode`, recording `state` as the
    /// state the token was lexed for.
    pub fn next_token_in_mode(&self, state: StateId, mode: LexMode, position: TextLength) -> Token {
        let mut examined = Examined::new(self.source.len());

        if mode.external_lex_state != 0 {
            if let Some(token) = self.scan_external(state, mode, position, &mut examined) {
                trace!(symbol = ?token.symbol, span = ?token.span(), "external token");
                return token;
            }
        }

        let separators = self.grammar.separators();
        let mut cursor = self.source.cursor_at(position);
        while let Some(c) = examined.peek(&cursor) {
            if !separators.contains(c) {
                break;
            }
            cursor.advance_char();
        }

        let start = cursor;
        let token = if cursor.is_eof() {
            self.token(SymbolId::END, state, mode, &start, &start, examined)
        } else {
            self.run_dfa(state, mode, start, examined)
        };
        trace!(symbol = ?token.symbol, span = ?token.span(), lookahead_end = token.lookahead_end, "token");
        token
    }

    fn run_dfa(
        &self,
        state: StateId,
        mode: LexMode,
        start: Cursor<'a>,
        mut examined: Examined,
    ) -> Token {
        let mut cursor = start;
        let mut lex_state = mode.lex_state;
        let mut accepted: Option<(SymbolId, Cursor<'a>)> = None;

        while let Some(dfa_state) = self.grammar.lex_state(lex_state) {
            if let Some(symbol) = dfa_state.accept {
                if cursor.pos() > start.pos() {
                    accepted = Some((symbol, cursor));
                }
            }
            if dfa_state.transitions.is_empty() {
                break;
            }
            let Some(c) = examined.peek(&cursor) else {
                break;
            };
            match dfa_state.next(c) {
                Some(next) => {
                    cursor.advance_char();
                    lex_state = next;
                }
                None => break,
            }
        }

        match accepted {
            Some((symbol, end)) => self.token(symbol, state, mode, &start, &end, examined),
            None => {
                let mut end = start;
                examined.peek(&end);
                end.advance_char();
                self.token(SymbolId::ERROR, state, mode, &start, &end, examined)
            }
        }
    }

    fn token(
        &self,
        symbol: SymbolId,
        state: StateId,
        mode: LexMode,
        start: &Cursor<'_>,
        end: &Cursor<'_>,
        examined: Examined,
    ) -> Token {
        Token {
            symbol,
            start: start.position(),
            end: end.position(),
            lookahead_end: examined.end.max(end.pos()),
            parse_state: state,
            lex_mode: mode,
        }
    }

    fn scan_external(
        &self,
        state: StateId,
        mode: LexMode,
        position: TextLength,
        examined: &mut Examined,
    ) -> Option<Token> {
        let scanner = self.grammar.external_scanner()?;
        let valid = self.grammar.external_valid(mode.external_lex_state);
        if !valid.iter().any(|&v| v) {
            return None;
        }

        let mut cx = ScanCursor {
            cursor: self.source.cursor_at(position),
            start: None,
            marked_end: None,
            examined: Cell::new(*examined),
        };
        let result = scanner.scan(&mut cx, valid);
        *examined = cx.examined.get();

        let index = result?;
        if !valid.get(index).copied().unwrap_or(false) {
            return None;
        }
        let symbol = *self.grammar.external_tokens().get(index)?;
        let start = cx.start.unwrap_or(self.source.cursor_at(position));
        let end = cx.marked_end.unwrap_or(cx.cursor);
        if end.pos() <= start.pos() {
            return None;
        }
        Some(self.token(symbol, state, mode, &start, &end, *examined))
    }
}

/// [`ScanContext`] over a lexer cursor.
struct ScanCursor<'a> {
    cursor: Cursor<'a>,
    /// Token start after leading `skip` calls.
    start: Option<Cursor<'a>>,
    marked_end: Option<Cursor<'a>>,
    examined: Cell<Examined>,
}

impl ScanCursor<'_> {
    fn note(&self) -> Option<char> {
        let mut examined = self.examined.get();
        let c = examined.peek(&self.cursor);
        self.examined.set(examined);
        c
    }
}

impl ScanContext for ScanCursor<'_> {
    fn lookahead(&self) -> Option<char> {
        self.note()
    }

    fn advance(&mut self) {
        if self.start.is_none() {
            self.start = Some(self.cursor);
        }
        self.note();
        self.cursor.advance_char();
    }

    fn skip(&mut self) {
        self.note();
        self.cursor.advance_char();
        self.start = Some(self.cursor);
    }

    fn mark_end(&mut self) {
        self.marked_end = Some(self.cursor);
    }

    fn is_at_end(&self) -> bool {
        self.note();
        self.cursor.is_eof()
    }

    fn column(&self) -> u32 {
        self.cursor.point().column
    }
}
