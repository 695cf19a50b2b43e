/// A growable byte vector whose payload starts on a 64-byte boundary.
///
/// Alignment is maintained by over-allocating the backing `Vec` and padding
/// its front, so typed views produced with `bytemuck` are valid for every
/// primitive element type. Capacity is managed in 64-byte blocks and growth
/// doubles the allocation.
pub struct AlignedByteVec {
    /// Backing storage, may include padding at the front.
    inner: Vec<u8>,
    /// Offset from the start of `inner` to the aligned payload.
    start: u32,
}

impl AlignedByteVec {
    /// Payload start alignment in bytes.
    pub const ALIGNMENT: usize = 64;
    /// Capacity granularity in bytes.
    const BLOCK_SIZE: usize = 64;

    /// Creates an empty vector without allocating.
    pub fn new() -> AlignedByteVec {
        AlignedByteVec {
            inner: Vec::new(),
            start: 0,
        }
    }

    /// Creates an empty vector that can hold at least `capacity` bytes
    /// without reallocating.
    pub fn with_capacity(capacity: usize) -> AlignedByteVec {
        Self::make(capacity)
    }

    /// Creates a vector of `len` zero bytes.
    pub fn zeroed(len: usize) -> AlignedByteVec {
        AlignedByteVec::from_value(len, 0)
    }

    /// Creates a vector of `len` bytes, each set to `value`.
    pub fn from_value(len: usize, value: u8) -> AlignedByteVec {
        let mut v = AlignedByteVec::with_capacity(len);
        v.resize(len, value);
        v
    }

    /// Creates a vector containing a copy of `data`.
    pub fn copy_from_slice(data: &[u8]) -> AlignedByteVec {
        let mut v = AlignedByteVec::with_capacity(data.len());
        v.extend_from_slice(data);
        v
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len() - self.start_offset()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of bytes the vector can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        round_down(
            self.inner.capacity() - self.start_offset(),
            Self::BLOCK_SIZE,
        )
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        unsafe { self.inner.as_ptr().add(self.start_offset()) }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.start_offset()..]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let start = self.start_offset();
        &mut self.inner[start..]
    }

    /// Reserves capacity for at least `additional` more bytes.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        if self.capacity() - self.len() >= additional {
            return;
        }
        self.grow(additional);
    }

    /// Appends all bytes of `s`.
    #[inline]
    pub fn extend_from_slice(&mut self, s: &[u8]) {
        self.reserve(s.len());
        self.inner.extend_from_slice(s);
    }

    /// Resizes to `new_len` bytes, filling any new space with `value`.
    pub fn resize(&mut self, new_len: usize, value: u8) {
        let len = self.len();
        if new_len > len {
            self.reserve(new_len - len);
        }
        let start = self.start_offset();
        self.inner.resize(start + new_len, value);
    }

    /// Truncates the vector to `new_len` bytes.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len < self.len() {
            self.inner.truncate(self.start_offset() + new_len);
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }
}

impl AlignedByteVec {
    /// Appends the bytes of `value`.
    #[inline]
    pub fn push_typed<T>(&mut self, value: T)
    where
        T: bytemuck::NoUninit,
    {
        self.extend_from_slice(bytemuck::bytes_of(&value));
    }

    /// Appends the bytes of all elements of `values`.
    #[inline]
    pub fn extend_from_typed_slice<T>(&mut self, values: &[T])
    where
        T: bytemuck::NoUninit,
    {
        self.extend_from_slice(bytemuck::cast_slice(values));
    }

    /// Resizes to `new_count` elements of type `T`, filling any new slots
    /// with `value`.
    pub fn resize_typed<T>(&mut self, new_count: usize, value: T)
    where
        T: bytemuck::NoUninit + bytemuck::AnyBitPattern,
    {
        let count = self.len() / size_of::<T>();
        if new_count > count {
            self.reserve((new_count - count) * size_of::<T>());
            for _ in count..new_count {
                self.inner.extend_from_slice(bytemuck::bytes_of(&value));
            }
        } else {
            self.truncate(new_count * size_of::<T>());
        }
    }

    /// Resizes to `new_count` elements of type `T`, filling any new slots
    /// with zeros.
    pub fn resize_zeroed<T>(&mut self, new_count: usize)
    where
        T: bytemuck::NoUninit + bytemuck::AnyBitPattern,
    {
        self.resize(new_count * size_of::<T>(), 0);
    }

    /// Views the payload as a slice of `T`.
    ///
    /// Panics if the payload length is not a multiple of `size_of::<T>()`.
    #[inline]
    pub fn typed_data<T>(&self) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Views the payload as a mutable slice of `T`.
    #[inline]
    pub fn typed_data_mut<T>(&mut self) -> &mut [T]
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        bytemuck::cast_slice_mut(self.as_mut_slice())
    }
}

impl AlignedByteVec {
    fn make(capacity: usize) -> AlignedByteVec {
        if capacity == 0 {
            return AlignedByteVec {
                inner: Vec::new(),
                start: 0,
            };
        }

        let vec_capacity = round_up(capacity, Self::BLOCK_SIZE)
            .checked_add(Self::ALIGNMENT)
            .expect("capacity overflow");
        let mut vec = Vec::<u8>::with_capacity(vec_capacity);

        let p = vec.as_ptr() as usize;
        let start = round_up(p, Self::ALIGNMENT) - p;
        vec.resize(start, 0);

        let res = AlignedByteVec {
            inner: vec,
            start: start as u32,
        };
        debug_assert!(res.capacity() >= capacity);
        res
    }

    #[cold]
    fn grow(&mut self, additional: usize) {
        let new_cap = round_up(
            self.len().checked_add(additional).expect("length overflow"),
            Self::BLOCK_SIZE,
        );
        let new_cap = std::cmp::max(self.capacity() * 2, new_cap);
        let mut v = Self::make(new_cap);
        if !self.is_empty() {
            v.inner.extend_from_slice(self.as_slice());
        }
        *self = v;
    }

    #[inline]
    fn start_offset(&self) -> usize {
        self.start as usize
    }
}

impl std::ops::Deref for AlignedByteVec {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl std::ops::DerefMut for AlignedByteVec {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl Clone for AlignedByteVec {
    fn clone(&self) -> AlignedByteVec {
        AlignedByteVec::copy_from_slice(self.as_slice())
    }
}

impl Default for AlignedByteVec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AlignedByteVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedByteVec")
            .field("len", &self.len())
            .field("cap", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// Rounds `n` up to the next multiple of `block_size` (a power of two).
#[inline]
fn round_up(n: usize, block_size: usize) -> usize {
    n.checked_add(block_size - 1).expect("round_up overflow") & !(block_size - 1)
}

/// Rounds `n` down to the previous multiple of `block_size` (a power of two).
#[inline]
fn round_down(n: usize, block_size: usize) -> usize {
    n & !(block_size - 1)
}
