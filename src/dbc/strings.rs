//! String block construction
//!
//! The writer resolves every string and localized slot through one pool per
//! pass; identical content shares one offset.

use std::collections::HashMap;

/// Deduplicating string block builder.
///
/// Offset 0 is reserved for the absent/empty string, so the block is born
/// with its single NUL terminator and novel content starts at offset 1.
/// Offsets depend only on the order of [`intern`] calls, never on map
/// iteration order, so a given call sequence always reproduces the same
/// block bytes.
///
/// [`intern`]: StringPool::intern
#[derive(Debug)]
pub struct StringPool {
    block: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StringPool {
    /// A fresh pool holding only the reserved empty-string terminator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            block: vec![0],
            offsets: HashMap::new(),
        }
    }

    /// Return the offset for `s`, appending it (plus NUL) if unseen.
    ///
    /// The empty string always resolves to offset 0 without consuming block
    /// space. Matching is byte-identical; no normalization.
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        if let Some(&offset) = self.offsets.get(s) {
            return offset;
        }

        let offset = self.block.len() as u32;
        self.block.extend_from_slice(s.as_bytes());
        self.block.push(0);
        self.offsets.insert(s.to_string(), offset);
        offset
    }

    /// Current block size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// Whether the block holds any content beyond the reserved terminator.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.block.len() <= 1
    }

    /// Consume the pool, yielding the finished string block.
    #[must_use]
    pub fn into_block(self) -> Vec<u8> {
        self.block
    }
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}
