//! Hooks for hand-written scanners.
//!
//! Some tokens cannot be expressed as a character-class DFA: the terminator
//! of a raw string depends on how it was opened, indentation depends on
//! earlier lines. A grammar may declare such tokens as external and attach an
//! [`ExternalScanner`] that recognises them.

/// Cursor view handed to an external scanner.
///
/// The scanner consumes characters with [`advance`](ScanContext::advance)
/// and decides where the token ends with [`mark_end`](ScanContext::mark_end).
/// If `mark_end` is never called the token ends at the last consumed
/// character.
pub trait ScanContext {
    /// Character at the cursor, `None` at end of input.
    fn lookahead(&self) -> Option<char>;

    /// Consume the lookahead as part of the token.
    fn advance(&mut self);

    /// Consume the lookahead as leading whitespace, before the token.
    fn skip(&mut self);

    /// End the token at the current position. Later `advance` calls only
    /// extend the examined range.
    fn mark_end(&mut self);

    fn is_at_end(&self) -> bool;

    /// Byte column of the cursor.
    fn column(&self) -> u32;
}

/// A scanner for a grammar's external tokens.
///
/// Implementations must be deterministic: the same input and validity set
/// must give the same result, or incremental reparsing will diverge from a
/// full parse.
pub trait ExternalScanner: Send + Sync {
    /// Try to recognise one of the external tokens marked valid.
    ///
    /// `valid[i]` tells whether the grammar's `i`-th external token may
    /// appear here. Returns the index of the recognised token, or `None` to
    /// let the built-in lexer run instead.
    fn scan(&self, cx: &mut dyn ScanContext, valid: &[bool]) -> Option<usize>;
}
