//! Byte buffers for the stoa crates: a mutable aligned vector and a shared
//! immutable view over it, cloneable and sliceable without copying.

use std::{
    ops::{Range, RangeBounds},
    sync::Arc,
};

pub mod buffer;

pub use buffer::AlignedByteVec;

/// An immutable, reference-counted region of bytes.
///
/// `Bytes` instances can be cloned and sliced freely; all views share one
/// underlying allocation, which stays alive as long as any view does. The
/// allocation payload is 64-byte aligned, so a whole-buffer view supports
/// typed access for any primitive element type.
#[derive(Clone)]
pub struct Bytes {
    data: Arc<AlignedByteVec>,
    offset: usize,
    len: usize,
}

impl Bytes {
    /// Creates an empty `Bytes`.
    pub fn new() -> Bytes {
        Bytes::from_vec(AlignedByteVec::new())
    }

    /// Creates a `Bytes` that takes ownership of `vec` without copying.
    pub fn from_vec(vec: AlignedByteVec) -> Bytes {
        let len = vec.len();
        Bytes {
            data: Arc::new(vec),
            offset: 0,
            len,
        }
    }

    /// Creates a `Bytes` of `len` zero bytes.
    pub fn zeroed(len: usize) -> Bytes {
        Bytes::from_vec(AlignedByteVec::zeroed(len))
    }

    /// Creates a `Bytes` containing a copy of `data`.
    pub fn copy_from_slice(data: &[u8]) -> Bytes {
        Bytes::from_vec(AlignedByteVec::copy_from_slice(data))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data.as_slice()[self.offset..self.offset + self.len]
    }

    /// Returns a new view of a subrange of this one, sharing the same
    /// allocation.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or decreasing.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Bytes {
        let range = self.verify_range(range);
        Bytes {
            data: self.data.clone(),
            offset: self.offset + range.start,
            len: range.end - range.start,
        }
    }

    /// Views the bytes as a slice of `T`.
    ///
    /// Panics if the view's length is not a multiple of `size_of::<T>()` or
    /// its start is not aligned for `T`; whole-buffer views are always
    /// sufficiently aligned.
    #[inline]
    pub fn typed_data<T>(&self) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Returns true if `self` and `other` are views of the same allocation
    /// with the same bounds. Used to observe zero-copy sharing; value
    /// equality is `PartialEq`.
    pub fn aliases(&self, other: &Bytes) -> bool {
        Arc::ptr_eq(&self.data, &other.data) && self.offset == other.offset && self.len == other.len
    }

    fn verify_range(&self, range: impl RangeBounds<usize>) -> Range<usize> {
        use std::ops::Bound;

        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.checked_add(1).expect("out of range"),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&n) => n.checked_add(1).expect("out of range"),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => self.len,
        };

        assert!(
            start <= end,
            "range start must not be greater than end: {start} <= {end}"
        );
        assert!(end <= self.len, "range end out of bounds: {end} <= {}", self.len);
        start..end
    }
}

impl std::ops::Deref for Bytes {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl From<AlignedByteVec> for Bytes {
    fn from(vec: AlignedByteVec) -> Bytes {
        Bytes::from_vec(vec)
    }
}

impl Default for Bytes {
    fn default() -> Self {
        Bytes::new()
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Bytes) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Bytes {}

impl std::fmt::Debug for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bytes")
            .field("len", &self.len)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
