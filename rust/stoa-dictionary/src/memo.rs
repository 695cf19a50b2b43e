//! Memoization tables that assign dense ids to distinct values.
//!
//! Ids are assigned in first-seen order, starting at zero, and never change
//! once assigned. The tables are the accumulation layer behind the
//! dictionary unifiers in [`crate::unify`].

use std::{
    collections::HashMap,
    hash::{BuildHasherDefault, Hash, Hasher},
};

use ahash::AHashMap;
use bytemuck::Pod;
use tinyvec::TinyVec;
use xxhash_rust::xxh3::xxh3_64;

use stoa_bytes::buffer::AlignedByteVec;
use stoa_column::{offsets::Offsets, values::Values};

/// Assigns dense ids to distinct fixed-size scalar values.
#[derive(Debug, Clone, Default)]
pub struct ScalarMemoTable<T>
where
    T: Pod + Eq + Hash,
{
    /// Id assigned to each distinct value.
    ids: AHashMap<T, i32>,
    /// Distinct values in id order.
    entries: Vec<T>,
}

impl<T> ScalarMemoTable<T>
where
    T: Pod + Eq + Hash,
{
    pub fn new() -> ScalarMemoTable<T> {
        ScalarMemoTable {
            ids: AHashMap::default(),
            entries: Vec::new(),
        }
    }

    /// Returns the id of `value`, assigning the next dense id when the value
    /// has not been seen before.
    #[inline]
    pub fn get_or_insert(&mut self, value: T) -> i32 {
        if let Some(&id) = self.ids.get(&value) {
            return id;
        }
        let id = self.entries.len();
        assert!(id < i32::MAX as usize);
        self.entries.push(value);
        self.ids.insert(value, id as i32);
        id as i32
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All distinct values in id order.
    pub fn values(&self) -> &[T] {
        &self.entries
    }

    /// Copies the entries with ids at or above `start_id` into a fresh
    /// values buffer.
    pub fn materialize_from(&self, start_id: usize) -> Values {
        let mut values = Values::with_capacity::<T>(self.entries.len() - start_id);
        values.extend_from_slice(&self.entries[start_id..]);
        values
    }
}

/// Assigns dense ids to distinct variable-length byte values.
///
/// Value bytes live in a single arena buffer delimited by an offset array.
/// The hash map keys are xxh3 hashes of the values; each key holds the ids
/// of the values hashing to it, and a lookup resolves collisions by
/// comparing bytes against the arena.
#[derive(Debug, Clone, Default)]
pub struct BinaryMemoTable {
    /// Ids of the values hashing to each key.
    buckets: HashMap<u64, TinyVec<[i32; 2]>, BuildHasherDefault<IdentityHasher>>,
    /// Concatenated bytes of all distinct values.
    arena: AlignedByteVec,
    /// End offset of each value in the arena.
    offsets: Offsets,
}

impl BinaryMemoTable {
    pub fn new() -> BinaryMemoTable {
        BinaryMemoTable::default()
    }

    /// Returns the id of `value`, assigning the next dense id when the value
    /// has not been seen before.
    #[inline]
    pub fn get_or_insert(&mut self, value: &[u8]) -> i32 {
        let hash = xxh3_64(value);
        let bucket = self.buckets.entry(hash).or_default();
        for &id in bucket.iter() {
            let range = self.offsets.range_at(id as usize);
            if &self.arena[range.start as usize..range.end as usize] == value {
                return id;
            }
        }
        let id = self.offsets.item_count();
        assert!(id < i32::MAX as usize);
        self.arena.extend_from_slice(value);
        self.offsets.push_length(value.len());
        bucket.push(id as i32);
        id as i32
    }

    pub fn len(&self) -> usize {
        self.offsets.item_count()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The bytes of the value assigned `id`.
    pub fn value(&self, id: i32) -> &[u8] {
        let range = self.offsets.range_at(id as usize);
        &self.arena[range.start as usize..range.end as usize]
    }

    /// Copies the entries with ids at or above `start_id` into fresh value
    /// and offset buffers. The returned offsets are rebased to zero.
    pub fn materialize_from(&self, start_id: usize) -> (Values, Offsets) {
        let start = self.offsets.as_slice()[start_id];
        let mut values = Values::new();
        values.extend_from_slice(&self.arena[start as usize..]);
        let mut offsets = Offsets::with_capacity(self.len() - start_id);
        for id in start_id..self.len() {
            offsets.push_offset(self.offsets.range_at(id).end - start);
        }
        (values, offsets)
    }
}

/// Passes already-uniform u64 keys through as their own hash.
struct IdentityHasher(u64);

impl Default for IdentityHasher {
    #[inline]
    fn default() -> IdentityHasher {
        IdentityHasher(0)
    }
}

impl Hasher for IdentityHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, _: &[u8]) {
        unimplemented!("IdentityHasher is only implemented for u64 keys");
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_memo() {
        let mut memo = ScalarMemoTable::<i64>::new();
        assert_eq!(memo.get_or_insert(100), 0);
        assert_eq!(memo.get_or_insert(-5), 1);
        assert_eq!(memo.get_or_insert(100), 0);
        assert_eq!(memo.get_or_insert(42), 2);
        assert_eq!(memo.len(), 3);
        assert_eq!(memo.values(), &[100, -5, 42]);

        let values = memo.materialize_from(1);
        assert_eq!(values.as_slice::<i64>(), &[-5, 42]);
    }

    #[test]
    fn test_binary_memo() {
        let mut memo = BinaryMemoTable::new();
        assert_eq!(memo.get_or_insert(b"apple"), 0);
        assert_eq!(memo.get_or_insert(b""), 1);
        assert_eq!(memo.get_or_insert(b"banana"), 2);
        assert_eq!(memo.get_or_insert(b"apple"), 0);
        assert_eq!(memo.get_or_insert(b""), 1);
        assert_eq!(memo.len(), 3);
        assert_eq!(memo.value(0), b"apple");
        assert_eq!(memo.value(1), b"");
        assert_eq!(memo.value(2), b"banana");
    }

    #[test]
    fn test_binary_memo_materialize() {
        let mut memo = BinaryMemoTable::new();
        memo.get_or_insert(b"one");
        memo.get_or_insert(b"three");
        memo.get_or_insert(b"fifteen");

        let (values, offsets) = memo.materialize_from(0);
        assert_eq!(values.as_bytes(), b"onethreefifteen");
        assert_eq!(offsets.as_slice(), &[0, 3, 8, 15]);

        let (values, offsets) = memo.materialize_from(1);
        assert_eq!(values.as_bytes(), b"threefifteen");
        assert_eq!(offsets.as_slice(), &[0, 5, 12]);
    }

    #[test]
    fn test_binary_memo_randomized() {
        fastrand::seed(29);
        let mut memo = BinaryMemoTable::new();
        let mut reference: Vec<Vec<u8>> = Vec::new();
        for _ in 0..2000 {
            let value: Vec<u8> = (0..fastrand::usize(0..8))
                .map(|_| fastrand::u8(0..4))
                .collect();
            let id = memo.get_or_insert(&value);
            match reference.iter().position(|seen| *seen == value) {
                Some(pos) => assert_eq!(id as usize, pos),
                None => {
                    assert_eq!(id as usize, reference.len());
                    reference.push(value);
                }
            }
        }
        assert_eq!(memo.len(), reference.len());
        for (pos, value) in reference.iter().enumerate() {
            assert_eq!(memo.value(pos as i32), &value[..]);
        }
    }
}
