//! Bit-packed validity bitmaps.
//!
//! Bit order is least-significant-bit first: logical bit `i` lives in byte
//! `i / 8` at bit position `i % 8`. A set bit marks a valid (non-null)
//! position. Windows into a bitmap are expressed as a bit offset plus a
//! length, which supports zero-copy slicing of the containers that carry
//! them.

use stoa_bytes::buffer::AlignedByteVec;

/// Number of bytes needed to store `bit_len` bits.
#[inline]
pub fn byte_len(bit_len: usize) -> usize {
    bit_len.div_ceil(8)
}

#[inline]
pub fn get_bit(bytes: &[u8], index: usize) -> bool {
    (bytes[index / 8] >> (index % 8)) & 1 != 0
}

#[inline]
pub fn set_bit(bytes: &mut [u8], index: usize) {
    bytes[index / 8] |= 1 << (index % 8);
}

/// Counts the set bits in the window of `len` bits starting at bit `offset`.
pub fn count_set_bits(bytes: &[u8], offset: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let end = offset + len;
    assert!(bytes.len() * 8 >= end);

    let mut count = 0;
    let mut i = offset;
    while i < end && i % 8 != 0 {
        count += get_bit(bytes, i) as usize;
        i += 1;
    }
    while i + 8 <= end {
        count += bytes[i / 8].count_ones() as usize;
        i += 8;
    }
    while i < end {
        count += get_bit(bytes, i) as usize;
        i += 1;
    }
    count
}

/// Copies the window of `len` bits starting at bit `offset` into a fresh
/// buffer re-aligned to start at bit 0. Bits past `len` in the final byte of
/// the result are zero.
pub fn copy_bitmap(bytes: &[u8], offset: usize, len: usize) -> AlignedByteVec {
    if len == 0 {
        return AlignedByteVec::new();
    }
    assert!(bytes.len() * 8 >= offset + len);

    let out_len = byte_len(len);
    let mut out = AlignedByteVec::zeroed(out_len);
    let byte = offset / 8;
    let shift = offset % 8;
    if shift == 0 {
        out.as_mut_slice().copy_from_slice(&bytes[byte..byte + out_len]);
    } else {
        for i in 0..out_len {
            let lo = bytes[byte + i] >> shift;
            let hi = if byte + i + 1 < bytes.len() {
                bytes[byte + i + 1] << (8 - shift)
            } else {
                0
            };
            out[i] = lo | hi;
        }
    }
    if len % 8 != 0 {
        out[out_len - 1] &= (1u8 << (len % 8)) - 1;
    }
    out
}

/// Incrementally builds a validity bitmap.
#[derive(Debug, Clone, Default)]
pub struct BitmapBuilder {
    bytes: AlignedByteVec,
    len: usize,
}

impl BitmapBuilder {
    pub fn new() -> BitmapBuilder {
        BitmapBuilder {
            bytes: AlignedByteVec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(bit_capacity: usize) -> BitmapBuilder {
        BitmapBuilder {
            bytes: AlignedByteVec::with_capacity(byte_len(bit_capacity)),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends one bit.
    #[inline]
    pub fn append(&mut self, valid: bool) {
        if self.len % 8 == 0 {
            self.bytes.push_typed(0u8);
        }
        if valid {
            set_bit(&mut self.bytes, self.len);
        }
        self.len += 1;
    }

    /// Appends `count` copies of the same bit.
    pub fn append_n(&mut self, count: usize, valid: bool) {
        for _ in 0..count {
            self.append(valid);
        }
    }

    /// Reads back the bit at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len);
        get_bit(&self.bytes, index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the builder and returns the packed bytes.
    pub fn finish(self) -> AlignedByteVec {
        self.bytes
    }
}
