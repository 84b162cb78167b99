//! Character cursor over a sentinel-terminated buffer.
//!
//! The cursor decodes UTF-8 one character at a time and tracks the row and
//! byte column alongside the byte offset. Bytes that do not start a valid
//! UTF-8 sequence decode as U+FFFD with width 1, so every byte sequence can
//! be lexed.

use whorl_ir::{Point, TextLength};

/// Cursor over a sentinel-terminated byte buffer.
///
/// Created via [`SourceBuffer::cursor()`](crate::SourceBuffer::cursor).
/// The cursor is [`Copy`], enabling cheap snapshots for backtracking to the
/// last accepting position.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    /// Sentinel-terminated buffer (source + sentinel + padding).
    buf: &'a [u8],
    /// Current read position (byte index into `buf`).
    pos: u32,
    /// Row and column of `pos`.
    point: Point,
    /// Length of actual source content (excludes sentinel and padding).
    source_len: u32,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8], source_len: u32, position: TextLength) -> Self {
        debug_assert!(
            (source_len as usize) < buf.len(),
            "sentinel must be within buffer bounds"
        );
        Cursor {
            buf,
            pos: position.bytes.min(source_len),
            point: position.extent,
            source_len,
        }
    }

    /// Returns the byte at the current position (`0x00` at EOF).
    #[inline]
    pub fn current(&self) -> u8 {
        self.buf[self.pos as usize]
    }

    /// Returns `true` if the cursor has reached the end of the source.
    ///
    /// Interior null bytes are not EOF.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source_len
    }

    /// Current byte offset in the source.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Row and column of the cursor.
    #[inline]
    pub fn point(&self) -> Point {
        self.point
    }

    /// Byte offset and point together.
    #[inline]
    pub fn position(&self) -> TextLength {
        TextLength::new(self.pos, self.point)
    }

    /// Length of the source content.
    #[inline]
    pub fn source_len(&self) -> u32 {
        self.source_len
    }

    /// Returns the number of bytes in the UTF-8 sequence starting with `byte`,
    /// or `None` for bytes that cannot start a sequence.
    #[inline]
    fn utf8_width(byte: u8) -> Option<usize> {
        match byte {
            0x00..=0x7F => Some(1),
            0xC2..=0xDF => Some(2),
            0xE0..=0xEF => Some(3),
            0xF0..=0xF4 => Some(4),
            _ => None,
        }
    }

    /// Decode the character at the cursor with its byte width.
    ///
    /// Returns `None` at EOF.
    #[inline]
    pub fn peek_char(&self) -> Option<(char, u32)> {
        if self.is_eof() {
            return None;
        }
        let byte = self.current();
        if byte < 0x80 {
            return Some((char::from(byte), 1));
        }
        let start = self.pos as usize;
        let decoded = Self::utf8_width(byte).and_then(|width| {
            let end = start + width;
            if end > self.source_len as usize {
                return None;
            }
            let text = std::str::from_utf8(&self.buf[start..end]).ok()?;
            let c = text.chars().next()?;
            Some((c, whorl_ir::to_u32(width, "bytes in character")))
        });
        Some(decoded.unwrap_or((char::REPLACEMENT_CHARACTER, 1)))
    }

    /// The character at the cursor, `None` at EOF.
    #[inline]
    pub fn lookahead(&self) -> Option<char> {
        self.peek_char().map(|(c, _)| c)
    }

    /// Advance past one character. No-op at EOF.
    #[inline]
    pub fn advance_char(&mut self) {
        let Some((c, width)) = self.peek_char() else {
            return;
        };
        self.pos += width;
        if c == '\n' {
            self.point = Point::new(self.point.row + 1, 0);
        } else {
            self.point.column += width;
        }
    }

    /// Source bytes between `start` and the cursor.
    pub fn slice_from(&self, start: u32) -> &'a [u8] {
        &self.buf[start as usize..self.pos as usize]
    }
}

#[cfg(test)]
mod tests;
