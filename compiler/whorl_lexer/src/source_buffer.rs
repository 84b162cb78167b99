//! Sentinel-terminated source buffer.
//!
//! The buffer guarantees a `0x00` sentinel byte after the source content.
//! The total buffer size is rounded up to the next 64-byte boundary, which
//! also provides safe padding for reads a few bytes past the end while
//! decoding a truncated UTF-8 sequence.

use whorl_ir::TextLength;

use crate::Cursor;

/// Cache line size in bytes, used for buffer alignment padding.
const CACHE_LINE: usize = 64;

/// Sentinel-terminated source buffer.
///
/// # Layout
///
/// ```text
/// [source_bytes..., 0x00, padding_zeros...]
///  ^                ^     ^
///  0                |     rounded up to 64-byte boundary
///              source_len (sentinel)
/// ```
#[derive(Clone, Debug)]
pub struct SourceBuffer {
    /// Owned buffer: `[source_bytes..., 0x00 sentinel, 0x00 padding...]`.
    buf: Vec<u8>,
    /// Length of the actual source content (excludes sentinel and padding).
    source_len: u32,
}

impl SourceBuffer {
    /// Copy `source` into a padded, sentinel-terminated buffer.
    ///
    /// Any byte sequence is accepted; invalid UTF-8 decodes as U+FFFD.
    /// Sources larger than `u32::MAX` bytes are truncated at `u32::MAX`;
    /// the parser rejects them before a buffer is built.
    pub fn new(source: &[u8]) -> Self {
        let source_len = source.len().min(u32::MAX as usize - CACHE_LINE);
        let padded_len = (source_len + 1 + CACHE_LINE - 1) & !(CACHE_LINE - 1);

        let mut buf = vec![0u8; padded_len];
        buf[..source_len].copy_from_slice(&source[..source_len]);

        SourceBuffer {
            buf,
            source_len: u32::try_from(source_len).unwrap_or(u32::MAX),
        }
    }

    /// Returns the source bytes (without sentinel or padding).
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.source_len as usize]
    }

    /// Returns the full buffer including sentinel and padding.
    pub fn as_sentinel_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Create a [`Cursor`] positioned at byte 0.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.buf, self.source_len, TextLength::ZERO)
    }

    /// Create a [`Cursor`] at a known position.
    ///
    /// `position.extent` must be the point of `position.bytes`; the cursor
    /// tracks rows and columns from there.
    pub fn cursor_at(&self, position: TextLength) -> Cursor<'_> {
        Cursor::new(&self.buf, self.source_len, position)
    }

    /// Length of the source content in bytes.
    pub fn len(&self) -> u32 {
        self.source_len
    }

    pub fn is_empty(&self) -> bool {
        self.source_len == 0
    }
}
