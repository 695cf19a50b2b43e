//! Typed value storage over an aligned byte buffer.

use stoa_bytes::buffer::AlignedByteVec;

/// A collection of fixed-width values stored as bytes with alignment
/// guarantees.
///
/// `Values` wraps an [`AlignedByteVec`] and provides methods for working
/// with byte representations of typed values.
#[derive(Debug, Clone, Default)]
pub struct Values(AlignedByteVec);

impl Values {
    /// Creates a new, empty `Values` instance.
    pub fn new() -> Values {
        Values(AlignedByteVec::new())
    }

    /// Creates a `Values` instance over the byte storage of `vec`.
    pub fn from_vec(vec: AlignedByteVec) -> Values {
        Values(vec)
    }

    /// Creates a `Values` instance holding `len` zeroed elements of type `T`.
    pub fn zeroed<T>(len: usize) -> Values
    where
        T: bytemuck::Zeroable,
    {
        Values(AlignedByteVec::zeroed(len * size_of::<T>()))
    }

    /// Creates an empty `Values` instance with capacity for `capacity`
    /// elements of type `T`.
    pub fn with_capacity<T>(capacity: usize) -> Values {
        Values(AlignedByteVec::with_capacity(capacity * size_of::<T>()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of complete elements of type `T` stored.
    #[inline]
    pub fn len<T>(&self) -> usize {
        self.0.len() / size_of::<T>()
    }

    /// Returns the number of bytes stored.
    #[inline]
    pub fn bytes_len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Interprets the underlying bytes as a slice of `T`.
    #[inline]
    pub fn as_slice<T>(&self) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        self.0.typed_data()
    }

    /// Interprets the underlying bytes as a mutable slice of `T`.
    #[inline]
    pub fn as_mut_slice<T>(&mut self) -> &mut [T]
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        self.0.typed_data_mut()
    }

    /// Resizes to `new_len` elements of type `T`, filling new slots with
    /// zeroes.
    pub fn resize_zeroed<T>(&mut self, new_len: usize)
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        self.0.resize_zeroed::<T>(new_len);
    }

    /// Resizes to `new_len` bytes, filling new slots with zeroes.
    pub fn resize_zeroed_bytes(&mut self, new_len: usize) {
        self.0.resize(new_len, 0);
    }

    /// Appends a single element.
    #[inline]
    pub fn push<T>(&mut self, value: T)
    where
        T: bytemuck::NoUninit,
    {
        self.0.push_typed(value);
    }

    /// Appends all elements of `values`.
    #[inline]
    pub fn extend_from_slice<T>(&mut self, values: &[T])
    where
        T: bytemuck::NoUninit,
    {
        self.0.extend_from_typed_slice(values);
    }

    /// Consumes the container and returns the underlying byte vector.
    pub fn into_inner(self) -> AlignedByteVec {
        self.0
    }
}
