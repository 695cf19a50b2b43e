//! End offsets for variable-length value storage.

use std::ops::Range;

use crate::values::Values;

/// A sequence of end offsets delimiting `n` variable-length items within a
/// contiguous byte buffer.
///
/// The container always holds `n + 1` offsets, where the first is the start
/// of the first item (normally 0) and each subsequent offset is the end of
/// one item and the start of the next.
#[derive(Debug, Clone)]
pub struct Offsets(Values);

impl Offsets {
    /// Creates offsets for an empty sequence (a single zero entry).
    pub fn new() -> Offsets {
        let mut values = Values::new();
        values.push(0u64);
        Offsets(values)
    }

    /// Creates offsets with capacity for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Offsets {
        let mut values = Values::with_capacity::<u64>(capacity + 1);
        values.push(0u64);
        Offsets(values)
    }

    /// Returns the number of items delimited by these offsets.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.0.len::<u64>() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        self.0.as_slice()
    }

    /// First offset (start of the first item).
    #[inline]
    pub fn first(&self) -> u64 {
        self.as_slice()[0]
    }

    /// Last offset (end of the final item).
    #[inline]
    pub fn last(&self) -> u64 {
        *self.as_slice().last().expect("non-empty offsets")
    }

    /// Returns the byte range of the item at `index`.
    #[inline]
    pub fn range_at(&self, index: usize) -> Range<u64> {
        let offsets = self.as_slice();
        offsets[index]..offsets[index + 1]
    }

    /// Appends the next end offset. `next_offset` must not be less than the
    /// current last offset.
    #[inline]
    pub fn push_offset(&mut self, next_offset: u64) {
        debug_assert!(next_offset >= self.last());
        self.0.push(next_offset);
    }

    /// Appends an item of the given length.
    #[inline]
    pub fn push_length(&mut self, len: usize) {
        self.0.push(self.last() + len as u64);
    }

    /// Consumes the offsets and returns the underlying values.
    pub fn into_inner(self) -> Values {
        self.0
    }
}

impl Default for Offsets {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for Offsets {
    type Target = [u64];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}
