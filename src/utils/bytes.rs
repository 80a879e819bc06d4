//! Read-only byte buffer view
//!
//! Bounds-checked accessors over a borrowed slice. Nothing here allocates;
//! every accessor returns `None` instead of reading past the end.

use std::ops::Range;

/// Immutable view over a byte sequence
#[derive(Debug, Clone, Copy)]
pub struct ByteView<'a> {
    data: &'a [u8],
}

impl<'a> ByteView<'a> {
    /// Wrap a byte slice
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// The underlying slice
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Total length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the view is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte at `offset`
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    /// Big-endian u16 at `offset`
    pub fn u16_be(&self, offset: usize) -> Option<u16> {
        let end = offset.checked_add(2)?;
        let bytes = self.data.get(offset..end)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Sub-slice for `range`
    pub fn slice(&self, range: Range<usize>) -> Option<&'a [u8]> {
        self.data.get(range)
    }

    /// Whether the bytes at `offset` start with `pattern`
    pub fn starts_with_at(&self, offset: usize, pattern: &[u8]) -> bool {
        self.data
            .get(offset..)
            .is_some_and(|rest| rest.starts_with(pattern))
    }

    /// Number of bytes from `offset` to the end
    pub fn remaining(&self, offset: usize) -> usize {
        self.data.len().saturating_sub(offset)
    }
}
