//! Unification of dictionaries across column chunks.
//!
//! A [`DictionaryUnifier`] accumulates the distinct values observed in a
//! sequence of per-chunk dictionaries and assigns each a stable id in
//! first-seen order. For every merged chunk it can report a transpose map
//! from the chunk's local ids to the unified ids, which
//! [`crate::transpose::transpose`] then applies to the chunk's index
//! buffers. [`DictionaryUnifier::finish`] produces the unified dictionary
//! together with the narrowest signed index type that addresses it.

use std::hash::Hash;
use std::sync::Arc;

use bytemuck::Pod;

use stoa_column::{
    column::Column,
    schema::{BasicType, BasicTypeDescriptor, DictionaryTypeDescriptor, IndexWidth},
};
use stoa_common::{Result, error::Error};

use crate::{
    memo::{BinaryMemoTable, ScalarMemoTable},
    value::FloatValue,
};

/// The outcome of dictionary unification: the merged dictionary of distinct
/// values and the dictionary type to encode against it.
#[derive(Debug, Clone)]
pub struct UnifiedDictionary {
    /// Index and value types for columns encoded against the dictionary.
    /// The index type is the narrowest signed integer that can address
    /// every entry.
    pub dictionary_type: DictionaryTypeDescriptor,
    /// The distinct values, in first-seen order.
    pub dictionary: Arc<Column>,
}

/// Merges per-chunk dictionaries into a single vocabulary.
///
/// Implementations are obtained from [`make_unifier`] for a concrete value
/// type. Merging a chunk whose values disagree with that type fails with a
/// type mismatch, and a dictionary containing nulls is rejected; a failed
/// merge leaves the accumulated state untouched.
pub trait DictionaryUnifier: std::fmt::Debug {
    /// Merges the values of `dictionary` into the unified vocabulary
    /// without reporting a transpose map.
    fn unify(&mut self, dictionary: &Column) -> Result<()>;

    /// Merges the values of `dictionary` and returns the transpose map
    /// carrying each of its positions to the unified id of the value
    /// stored there.
    fn unify_with_map(&mut self, dictionary: &Column) -> Result<Vec<i32>>;

    /// Completes unification, producing the merged dictionary.
    fn finish(self: Box<Self>) -> Result<UnifiedDictionary>;
}

/// Creates a unifier for dictionaries of the given value type.
///
/// Integer, floating point, `DateTime`, `String`, `Binary`,
/// `FixedSizeBinary` and `Guid` values are supported.
pub fn make_unifier(value_type: BasicTypeDescriptor) -> Result<Box<dyn DictionaryUnifier>> {
    let unifier: Box<dyn DictionaryUnifier> = match value_type.basic_type {
        BasicType::Int8 if value_type.signed => Box::new(PrimitiveUnifier::<i8>::new(value_type)),
        BasicType::Int8 => Box::new(PrimitiveUnifier::<u8>::new(value_type)),
        BasicType::Int16 if value_type.signed => Box::new(PrimitiveUnifier::<i16>::new(value_type)),
        BasicType::Int16 => Box::new(PrimitiveUnifier::<u16>::new(value_type)),
        BasicType::Int32 if value_type.signed => Box::new(PrimitiveUnifier::<i32>::new(value_type)),
        BasicType::Int32 => Box::new(PrimitiveUnifier::<u32>::new(value_type)),
        BasicType::Int64 if value_type.signed => Box::new(PrimitiveUnifier::<i64>::new(value_type)),
        BasicType::Int64 => Box::new(PrimitiveUnifier::<u64>::new(value_type)),
        BasicType::DateTime => Box::new(PrimitiveUnifier::<u64>::new(value_type)),
        BasicType::Float32 => {
            Box::new(PrimitiveUnifier::<FloatValue<f32>>::new(value_type))
        }
        BasicType::Float64 => {
            Box::new(PrimitiveUnifier::<FloatValue<f64>>::new(value_type))
        }
        BasicType::String | BasicType::Binary => Box::new(BinaryUnifier::new(value_type)),
        BasicType::FixedSizeBinary | BasicType::Guid => {
            Box::new(FixedSizeBinaryUnifier::new(value_type))
        }
        BasicType::Unit
        | BasicType::Boolean
        | BasicType::List
        | BasicType::FixedSizeList
        | BasicType::Struct
        | BasicType::Map
        | BasicType::Union => {
            return Err(Error::not_implemented(format!(
                "dictionary unification for {value_type} values"
            )));
        }
    };
    Ok(unifier)
}

/// Validates an incoming chunk dictionary before any of its values are
/// interned, so that a failure leaves the unifier unchanged.
fn check_dictionary(value_type: BasicTypeDescriptor, dictionary: &Column) -> Result<()> {
    if dictionary.type_desc() != value_type {
        return Err(Error::type_mismatch(
            value_type.to_string(),
            dictionary.type_desc().to_string(),
        ));
    }
    if dictionary.null_count() != 0 {
        return Err(Error::invalid_arg(
            "dictionary",
            "dictionary values must not contain nulls",
        ));
    }
    Ok(())
}

/// Selects the dictionary type for a unified vocabulary of `len` entries.
fn dictionary_type_for(value_type: BasicTypeDescriptor, len: usize) -> DictionaryTypeDescriptor {
    DictionaryTypeDescriptor {
        index_type: IndexWidth::select_for_len(len).descriptor(),
        value_type,
    }
}

#[derive(Debug)]
struct PrimitiveUnifier<T>
where
    T: Pod + Eq + Hash,
{
    value_type: BasicTypeDescriptor,
    memo: ScalarMemoTable<T>,
}

impl<T> PrimitiveUnifier<T>
where
    T: Pod + Eq + Hash,
{
    fn new(value_type: BasicTypeDescriptor) -> PrimitiveUnifier<T> {
        assert_eq!(value_type.primitive_size(), Some(size_of::<T>()));
        PrimitiveUnifier {
            value_type,
            memo: ScalarMemoTable::new(),
        }
    }
}

impl<T> DictionaryUnifier for PrimitiveUnifier<T>
where
    T: Pod + Eq + Hash + std::fmt::Debug,
{
    fn unify(&mut self, dictionary: &Column) -> Result<()> {
        check_dictionary(self.value_type, dictionary)?;
        for &value in dictionary.as_slice::<T>() {
            self.memo.get_or_insert(value);
        }
        Ok(())
    }

    fn unify_with_map(&mut self, dictionary: &Column) -> Result<Vec<i32>> {
        check_dictionary(self.value_type, dictionary)?;
        let values = dictionary.as_slice::<T>();
        let mut map = Vec::with_capacity(values.len());
        for &value in values {
            map.push(self.memo.get_or_insert(value));
        }
        Ok(map)
    }

    fn finish(self: Box<Self>) -> Result<UnifiedDictionary> {
        let len = self.memo.len();
        let values = self.memo.materialize_from(0);
        let dictionary = Column::from_parts(self.value_type, values, None, None, len);
        Ok(UnifiedDictionary {
            dictionary_type: dictionary_type_for(self.value_type, len),
            dictionary: Arc::new(dictionary),
        })
    }
}

#[derive(Debug)]
struct BinaryUnifier {
    value_type: BasicTypeDescriptor,
    memo: BinaryMemoTable,
}

impl BinaryUnifier {
    fn new(value_type: BasicTypeDescriptor) -> BinaryUnifier {
        BinaryUnifier {
            value_type,
            memo: BinaryMemoTable::new(),
        }
    }
}

impl DictionaryUnifier for BinaryUnifier {
    fn unify(&mut self, dictionary: &Column) -> Result<()> {
        check_dictionary(self.value_type, dictionary)?;
        for i in 0..dictionary.len() {
            self.memo.get_or_insert(dictionary.binary_at(i));
        }
        Ok(())
    }

    fn unify_with_map(&mut self, dictionary: &Column) -> Result<Vec<i32>> {
        check_dictionary(self.value_type, dictionary)?;
        let mut map = Vec::with_capacity(dictionary.len());
        for i in 0..dictionary.len() {
            map.push(self.memo.get_or_insert(dictionary.binary_at(i)));
        }
        Ok(map)
    }

    fn finish(self: Box<Self>) -> Result<UnifiedDictionary> {
        let len = self.memo.len();
        let (values, offsets) = self.memo.materialize_from(0);
        let dictionary = Column::from_parts(self.value_type, values, Some(offsets), None, len);
        Ok(UnifiedDictionary {
            dictionary_type: dictionary_type_for(self.value_type, len),
            dictionary: Arc::new(dictionary),
        })
    }
}

/// Unifier for `FixedSizeBinary` and `Guid` values. The memo arena stays
/// contiguous at the fixed value size, so the unified dictionary carries no
/// offsets.
#[derive(Debug)]
struct FixedSizeBinaryUnifier {
    value_type: BasicTypeDescriptor,
    memo: BinaryMemoTable,
}

impl FixedSizeBinaryUnifier {
    fn new(value_type: BasicTypeDescriptor) -> FixedSizeBinaryUnifier {
        FixedSizeBinaryUnifier {
            value_type,
            memo: BinaryMemoTable::new(),
        }
    }
}

impl DictionaryUnifier for FixedSizeBinaryUnifier {
    fn unify(&mut self, dictionary: &Column) -> Result<()> {
        check_dictionary(self.value_type, dictionary)?;
        for i in 0..dictionary.len() {
            self.memo.get_or_insert(dictionary.binary_at(i));
        }
        Ok(())
    }

    fn unify_with_map(&mut self, dictionary: &Column) -> Result<Vec<i32>> {
        check_dictionary(self.value_type, dictionary)?;
        let mut map = Vec::with_capacity(dictionary.len());
        for i in 0..dictionary.len() {
            map.push(self.memo.get_or_insert(dictionary.binary_at(i)));
        }
        Ok(map)
    }

    fn finish(self: Box<Self>) -> Result<UnifiedDictionary> {
        let len = self.memo.len();
        let (values, _) = self.memo.materialize_from(0);
        let dictionary = Column::from_parts(self.value_type, values, None, None, len);
        Ok(UnifiedDictionary {
            dictionary_type: dictionary_type_for(self.value_type, len),
            dictionary: Arc::new(dictionary),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stoa_common::error::ErrorKind;

    fn string_desc() -> BasicTypeDescriptor {
        BasicTypeDescriptor {
            basic_type: BasicType::String,
            fixed_size: 0,
            signed: false,
        }
    }

    fn int32_desc() -> BasicTypeDescriptor {
        BasicTypeDescriptor {
            basic_type: BasicType::Int32,
            fixed_size: 0,
            signed: true,
        }
    }

    #[test]
    fn test_string_round_trip() {
        let mut unifier = make_unifier(string_desc()).unwrap();
        let first_map = unifier
            .unify_with_map(&Column::from_strings(["b", "a", "c"]))
            .unwrap();
        let second_map = unifier
            .unify_with_map(&Column::from_strings(["a", "d"]))
            .unwrap();
        assert_eq!(first_map, vec![0, 1, 2]);
        assert_eq!(second_map, vec![1, 3]);

        let unified = unifier.finish().unwrap();
        assert_eq!(
            unified.dictionary_type.index_type,
            IndexWidth::W8.descriptor()
        );
        let dictionary = unified.dictionary.as_ref();
        assert_eq!(dictionary.len(), 4);
        let entries: Vec<&str> = (0..4).map(|i| dictionary.string_at(i)).collect();
        assert_eq!(entries, ["b", "a", "c", "d"]);
    }

    #[test]
    fn test_chunk_order_shapes_canonical_order() {
        let mut unifier = make_unifier(string_desc()).unwrap();
        let first_map = unifier
            .unify_with_map(&Column::from_strings(["a", "d"]))
            .unwrap();
        let second_map = unifier
            .unify_with_map(&Column::from_strings(["b", "a", "c"]))
            .unwrap();
        assert_eq!(first_map, vec![0, 1]);
        assert_eq!(second_map, vec![2, 0, 3]);

        let unified = unifier.finish().unwrap();
        let dictionary = unified.dictionary.as_ref();
        let entries: Vec<&str> = (0..4).map(|i| dictionary.string_at(i)).collect();
        assert_eq!(entries, ["a", "d", "b", "c"]);
    }

    #[test]
    fn test_unify_without_map_shares_vocabulary() {
        let mut unifier = make_unifier(string_desc()).unwrap();
        unifier.unify(&Column::from_strings(["b", "a", "c"])).unwrap();
        let map = unifier
            .unify_with_map(&Column::from_strings(["a", "d"]))
            .unwrap();
        assert_eq!(map, vec![1, 3]);
        assert_eq!(unifier.finish().unwrap().dictionary.len(), 4);
    }

    #[test]
    fn test_duplicate_positions_share_ids() {
        let mut unifier = make_unifier(string_desc()).unwrap();
        let map = unifier
            .unify_with_map(&Column::from_strings(["x", "y", "x", "y", "x"]))
            .unwrap();
        assert_eq!(map, vec![0, 1, 0, 1, 0]);
        assert_eq!(unifier.finish().unwrap().dictionary.len(), 2);
    }

    fn unified_width_for_count(count: i32) -> IndexWidth {
        let values: Vec<i32> = (0..count).collect();
        let mut unifier = make_unifier(int32_desc()).unwrap();
        unifier
            .unify(&Column::from_slice(int32_desc(), &values))
            .unwrap();
        let unified = unifier.finish().unwrap();
        IndexWidth::of(unified.dictionary_type.index_type).unwrap()
    }

    #[test]
    fn test_index_width_selection() {
        assert_eq!(unified_width_for_count(0), IndexWidth::W8);
        assert_eq!(unified_width_for_count(127), IndexWidth::W8);
        assert_eq!(unified_width_for_count(128), IndexWidth::W16);
        assert_eq!(unified_width_for_count(32767), IndexWidth::W16);
        assert_eq!(unified_width_for_count(32768), IndexWidth::W32);
    }

    #[test]
    fn test_determinism() {
        let chunks = [
            Column::from_strings(["pear", "fig", "plum"]),
            Column::from_strings(["fig", "date", "pear"]),
        ];
        let run = || {
            let mut unifier = make_unifier(string_desc()).unwrap();
            let maps: Vec<Vec<i32>> = chunks
                .iter()
                .map(|chunk| unifier.unify_with_map(chunk).unwrap())
                .collect();
            (maps, unifier.finish().unwrap())
        };
        let (first_maps, first) = run();
        let (second_maps, second) = run();
        assert_eq!(first_maps, second_maps);
        assert_eq!(first.dictionary_type, second.dictionary_type);
        assert_eq!(first.dictionary.as_ref(), second.dictionary.as_ref());
    }

    #[test]
    fn test_int_unification() {
        let mut unifier = make_unifier(int32_desc()).unwrap();
        let map = unifier
            .unify_with_map(&Column::from_slice(int32_desc(), &[7i32, -1, 7, 100]))
            .unwrap();
        assert_eq!(map, vec![0, 1, 0, 2]);
        let unified = unifier.finish().unwrap();
        assert_eq!(unified.dictionary.as_slice::<i32>(), &[7, -1, 100]);
    }

    #[test]
    fn test_float_unification_collapses_nan_and_zero() {
        let desc = BasicTypeDescriptor {
            basic_type: BasicType::Float32,
            fixed_size: 0,
            signed: false,
        };
        let mut unifier = make_unifier(desc).unwrap();
        let map = unifier
            .unify_with_map(&Column::from_slice(
                desc,
                &[1.5f32, -0.0, 0.0, 1.5, f32::NAN, f32::NAN],
            ))
            .unwrap();
        assert_eq!(map, vec![0, 1, 1, 0, 2, 2]);

        let unified = unifier.finish().unwrap();
        let entries = unified.dictionary.as_slice::<f32>();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], 1.5);
        assert_eq!(entries[1], 0.0);
        assert!(entries[2].is_nan());
    }

    #[test]
    fn test_fixed_size_binary_unification() {
        let desc = BasicTypeDescriptor {
            basic_type: BasicType::FixedSizeBinary,
            fixed_size: 4,
            signed: false,
        };
        let mut first = Column::empty(desc);
        for value in [b"aaaa", b"bbbb", b"aaaa"] {
            first.push_binary(value);
        }
        let mut second = Column::empty(desc);
        second.push_binary(b"cccc");
        second.push_binary(b"bbbb");

        let mut unifier = make_unifier(desc).unwrap();
        assert_eq!(unifier.unify_with_map(&first).unwrap(), vec![0, 1, 0]);
        assert_eq!(unifier.unify_with_map(&second).unwrap(), vec![2, 1]);

        let unified = unifier.finish().unwrap();
        let dictionary = unified.dictionary.as_ref();
        assert_eq!(dictionary.len(), 3);
        assert!(dictionary.offsets().is_none());
        assert_eq!(dictionary.binary_at(0), b"aaaa");
        assert_eq!(dictionary.binary_at(2), b"cccc");
    }

    #[test]
    fn test_empty_unifier() {
        let unifier = make_unifier(string_desc()).unwrap();
        let unified = unifier.finish().unwrap();
        assert_eq!(unified.dictionary.len(), 0);
        assert_eq!(
            unified.dictionary_type.index_type,
            IndexWidth::W8.descriptor()
        );
    }

    #[test]
    fn test_unsupported_value_types() {
        for basic_type in [
            BasicType::Unit,
            BasicType::Boolean,
            BasicType::List,
            BasicType::FixedSizeList,
            BasicType::Struct,
            BasicType::Map,
            BasicType::Union,
        ] {
            let desc = BasicTypeDescriptor {
                basic_type,
                fixed_size: 0,
                signed: false,
            };
            let err = make_unifier(desc).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::NotImplemented { .. }));
            assert!(err.to_string().contains(&basic_type.to_string()));
        }
    }

    #[test]
    fn test_type_mismatch_leaves_state_unchanged() {
        let mut unifier = make_unifier(string_desc()).unwrap();
        unifier.unify(&Column::from_strings(["a"])).unwrap();

        let err = unifier
            .unify(&Column::from_slice(int32_desc(), &[1i32]))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));

        let map = unifier
            .unify_with_map(&Column::from_strings(["b"]))
            .unwrap();
        assert_eq!(map, vec![1]);
    }

    #[test]
    fn test_null_dictionary_rejected() {
        let mut unifier = make_unifier(string_desc()).unwrap();
        unifier.unify(&Column::from_strings(["a"])).unwrap();

        let nullable = Column::from_nullable_strings([Some("b"), None]);
        let err = unifier.unify_with_map(&nullable).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));

        // The rejected chunk must not have leaked values into the vocabulary.
        let map = unifier
            .unify_with_map(&Column::from_strings(["b"]))
            .unwrap();
        assert_eq!(map, vec![1]);
    }
}
