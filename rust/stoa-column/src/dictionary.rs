//! The dictionary-encoded column container.

use std::sync::Arc;

use stoa_bytes::{Bytes, buffer::AlignedByteVec};
use stoa_common::{Result, error::Error, verify_arg};

use crate::{
    bitmap::{self, BitmapBuilder},
    column::Column,
    schema::{BasicTypeDescriptor, DictionaryTypeDescriptor, IndexWidth},
};

/// Signed integer types usable as dictionary indices.
pub trait IndexInt: bytemuck::Pod + Copy + 'static {
    const WIDTH: IndexWidth;

    /// Converts a canonical dictionary position to this index type. The
    /// value is truncated if the width cannot represent it; index type
    /// selection is responsible for picking a wide enough type.
    fn from_i32(value: i32) -> Self;

    fn to_i64(self) -> i64;
}

macro_rules! impl_index_int {
    ($ty:ty, $width:expr) => {
        impl IndexInt for $ty {
            const WIDTH: IndexWidth = $width;

            #[inline]
            fn from_i32(value: i32) -> Self {
                value as $ty
            }

            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }
        }
    };
}

impl_index_int!(i8, IndexWidth::W8);
impl_index_int!(i16, IndexWidth::W16);
impl_index_int!(i32, IndexWidth::W32);
impl_index_int!(i64, IndexWidth::W64);

/// A column of integer indices into a shared dictionary of values.
///
/// The indices buffer and the validity bitmap are immutable shared byte
/// views; cloning or slicing a `DictionaryColumn` never copies them. A
/// non-zero `offset` positions the logical window inside the physical
/// buffers (elements for indices, bits for validity).
///
/// Invariant: every non-null index value lies in `[0, dictionary.len())`.
/// [`DictionaryColumn::try_new`] verifies this; [`DictionaryColumn::from_parts`]
/// trusts the caller and is meant for indices that are valid by
/// construction.
#[derive(Debug, Clone)]
pub struct DictionaryColumn {
    dict_type: DictionaryTypeDescriptor,
    width: IndexWidth,
    dictionary: Arc<Column>,
    indices: Bytes,
    validity: Option<Bytes>,
    len: usize,
    offset: usize,
    null_count: usize,
}

impl DictionaryColumn {
    /// Creates a dictionary column, verifying buffer shapes and the index
    /// range invariant.
    pub fn try_new(
        dict_type: DictionaryTypeDescriptor,
        dictionary: Arc<Column>,
        indices: Bytes,
        validity: Option<Bytes>,
        len: usize,
        offset: usize,
    ) -> Result<DictionaryColumn> {
        let width = IndexWidth::of(dict_type.index_type).ok_or_else(|| {
            Error::invalid_arg(
                "dict_type",
                format!("index type {} is not a signed integer", dict_type.index_type),
            )
        })?;
        if dict_type.value_type != dictionary.type_desc() {
            return Err(Error::type_mismatch(
                dict_type.value_type.to_string(),
                dictionary.type_desc().to_string(),
            ));
        }
        verify_arg!(indices, indices.len() >= (offset + len) * width.byte_width());
        if let Some(validity) = validity.as_ref() {
            verify_arg!(validity, validity.len() * 8 >= offset + len);
        }

        let column = Self::assemble(dict_type, width, dictionary, indices, validity, len, offset);
        column.verify_index_range()?;
        Ok(column)
    }

    /// Wraps buffers that satisfy the index range invariant by construction.
    /// Only cheap structural facts are checked.
    pub fn from_parts(
        dict_type: DictionaryTypeDescriptor,
        dictionary: Arc<Column>,
        indices: Bytes,
        validity: Option<Bytes>,
        len: usize,
        offset: usize,
    ) -> DictionaryColumn {
        let width = IndexWidth::of(dict_type.index_type).expect("signed integer index type");
        assert_eq!(dict_type.value_type, dictionary.type_desc());
        assert!(indices.len() >= (offset + len) * width.byte_width());
        if let Some(validity) = validity.as_ref() {
            assert!(validity.len() * 8 >= offset + len);
        }
        Self::assemble(dict_type, width, dictionary, indices, validity, len, offset)
    }

    /// Builds a column at offset 0 from typed indices and an optional
    /// per-position validity vector.
    pub fn try_from_indices<T: IndexInt>(
        dictionary: Arc<Column>,
        indices: &[T],
        validity: Option<&[bool]>,
    ) -> Result<DictionaryColumn> {
        let dict_type = DictionaryTypeDescriptor {
            index_type: T::WIDTH.descriptor(),
            value_type: dictionary.type_desc(),
        };
        let mut buf = AlignedByteVec::new();
        buf.extend_from_typed_slice(indices);
        let validity = validity.map(|flags| {
            assert_eq!(flags.len(), indices.len());
            let mut bits = BitmapBuilder::with_capacity(flags.len());
            for &valid in flags {
                bits.append(valid);
            }
            Bytes::from_vec(bits.finish())
        });
        DictionaryColumn::try_new(
            dict_type,
            dictionary,
            Bytes::from_vec(buf),
            validity,
            indices.len(),
            0,
        )
    }

    fn assemble(
        dict_type: DictionaryTypeDescriptor,
        width: IndexWidth,
        dictionary: Arc<Column>,
        indices: Bytes,
        validity: Option<Bytes>,
        len: usize,
        offset: usize,
    ) -> DictionaryColumn {
        let null_count = match validity.as_ref() {
            Some(bits) => len - bitmap::count_set_bits(bits, offset, len),
            None => 0,
        };
        DictionaryColumn {
            dict_type,
            width,
            dictionary,
            indices,
            validity,
            len,
            offset,
            null_count,
        }
    }

    fn verify_index_range(&self) -> Result<()> {
        let dict_len = self.dictionary.len() as i64;
        for i in 0..self.len {
            if let Some(index) = self.index_at(i) {
                if index < 0 || index >= dict_len {
                    return Err(Error::invalid_arg(
                        "indices",
                        format!(
                            "index {index} at position {i} is out of range for a dictionary \
                             of {dict_len} entries"
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl DictionaryColumn {
    #[inline]
    pub fn dict_type(&self) -> DictionaryTypeDescriptor {
        self.dict_type
    }

    #[inline]
    pub fn index_type(&self) -> BasicTypeDescriptor {
        self.dict_type.index_type
    }

    #[inline]
    pub fn value_type(&self) -> BasicTypeDescriptor {
        self.dict_type.value_type
    }

    #[inline]
    pub fn index_width(&self) -> IndexWidth {
        self.width
    }

    pub fn dictionary(&self) -> &Arc<Column> {
        &self.dictionary
    }

    pub fn indices(&self) -> &Bytes {
        &self.indices
    }

    pub fn validity(&self) -> Option<&Bytes> {
        self.validity.as_ref()
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
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn null_count(&self) -> usize {
        self.null_count
    }

    #[inline]
    pub fn is_valid(&self, index: usize) -> bool {
        assert!(index < self.len);
        self.validity
            .as_ref()
            .is_none_or(|bits| bitmap::get_bit(bits, self.offset + index))
    }

    #[inline]
    pub fn is_null(&self, index: usize) -> bool {
        !self.is_valid(index)
    }

    /// Views the logical index window as a typed slice. `T` must match the
    /// column's index width.
    pub fn typed_indices<T: IndexInt>(&self) -> &[T] {
        assert_eq!(T::WIDTH, self.width);
        let end = (self.offset + self.len) * size_of::<T>();
        let physical: &[T] = bytemuck::cast_slice(&self.indices.as_slice()[..end]);
        &physical[self.offset..]
    }

    /// Returns the index value at logical position `index`, widened to
    /// `i64`, or `None` when the position is null.
    pub fn index_at(&self, index: usize) -> Option<i64> {
        if !self.is_valid(index) {
            return None;
        }
        let value = match self.width {
            IndexWidth::W8 => self.typed_indices::<i8>()[index].to_i64(),
            IndexWidth::W16 => self.typed_indices::<i16>()[index].to_i64(),
            IndexWidth::W32 => self.typed_indices::<i32>()[index].to_i64(),
            IndexWidth::W64 => self.typed_indices::<i64>()[index],
        };
        Some(value)
    }

    /// Resolves the dictionary value bytes at logical position `index`, or
    /// `None` when the position is null.
    pub fn value_bytes_at(&self, index: usize) -> Option<&[u8]> {
        self.index_at(index)
            .map(|id| self.dictionary.binary_at(id as usize))
    }

    /// Returns a zero-copy view of `len` positions starting at `offset`
    /// (relative to this view). All buffers are shared.
    pub fn slice(&self, offset: usize, len: usize) -> DictionaryColumn {
        assert!(offset + len <= self.len);
        Self::assemble(
            self.dict_type,
            self.width,
            self.dictionary.clone(),
            self.indices.clone(),
            self.validity.clone(),
            len,
            self.offset + offset,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stoa_common::error::ErrorKind;

    use crate::schema::BasicType;

    fn string_dictionary() -> Arc<Column> {
        Arc::new(Column::from_strings(["red", "green", "blue"]))
    }

    #[test]
    fn test_try_from_indices() {
        let column =
            DictionaryColumn::try_from_indices::<i32>(string_dictionary(), &[0, 2, 2, 1], None)
                .unwrap();
        assert_eq!(column.len(), 4);
        assert_eq!(column.offset(), 0);
        assert_eq!(column.null_count(), 0);
        assert_eq!(column.index_width(), IndexWidth::W32);
        assert_eq!(column.index_at(1), Some(2));
        assert_eq!(column.value_bytes_at(1), Some(&b"blue"[..]));
        assert_eq!(column.typed_indices::<i32>(), &[0, 2, 2, 1]);
    }

    #[test]
    fn test_nulls() {
        let column = DictionaryColumn::try_from_indices::<i8>(
            string_dictionary(),
            &[0, 0, 1, 2],
            Some(&[true, false, true, false]),
        )
        .unwrap();
        assert_eq!(column.null_count(), 2);
        assert!(column.is_null(1));
        assert!(column.is_valid(2));
        assert_eq!(column.index_at(1), None);
        assert_eq!(column.index_at(2), Some(1));
        assert_eq!(column.value_bytes_at(3), None);
    }

    #[test]
    fn test_index_out_of_range() {
        let err = DictionaryColumn::try_from_indices::<i32>(string_dictionary(), &[0, 3], None)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));

        let err = DictionaryColumn::try_from_indices::<i32>(string_dictionary(), &[-1], None)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));

        // A null position may carry any index content.
        DictionaryColumn::try_from_indices::<i32>(
            string_dictionary(),
            &[0, 100],
            Some(&[true, false]),
        )
        .unwrap();
    }

    #[test]
    fn test_type_mismatch() {
        let dict_type = DictionaryTypeDescriptor {
            index_type: IndexWidth::W32.descriptor(),
            value_type: BasicTypeDescriptor {
                basic_type: BasicType::Int64,
                fixed_size: 0,
                signed: true,
            },
        };
        let err = DictionaryColumn::try_new(
            dict_type,
            string_dictionary(),
            Bytes::zeroed(4),
            None,
            1,
            0,
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn test_unsigned_index_type_rejected() {
        let dict_type = DictionaryTypeDescriptor {
            index_type: BasicTypeDescriptor {
                basic_type: BasicType::Int32,
                fixed_size: 0,
                signed: false,
            },
            value_type: string_dictionary().type_desc(),
        };
        let err = DictionaryColumn::try_new(
            dict_type,
            string_dictionary(),
            Bytes::zeroed(4),
            None,
            1,
            0,
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_short_indices_buffer() {
        let dict_type = DictionaryTypeDescriptor {
            index_type: IndexWidth::W32.descriptor(),
            value_type: string_dictionary().type_desc(),
        };
        let err = DictionaryColumn::try_new(
            dict_type,
            string_dictionary(),
            Bytes::zeroed(4),
            None,
            2,
            0,
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_slice() {
        let column = DictionaryColumn::try_from_indices::<i16>(
            string_dictionary(),
            &[0, 1, 2, 0, 1],
            Some(&[true, true, false, true, false]),
        )
        .unwrap();
        let view = column.slice(1, 3);
        assert_eq!(view.len(), 3);
        assert_eq!(view.offset(), 1);
        assert_eq!(view.null_count(), 1);
        assert_eq!(view.typed_indices::<i16>(), &[1, 2, 0]);
        assert_eq!(view.index_at(0), Some(1));
        assert_eq!(view.index_at(1), None);
        assert_eq!(view.index_at(2), Some(0));
        assert!(view.indices().aliases(column.indices()));

        let inner = view.slice(2, 1);
        assert_eq!(inner.offset(), 3);
        assert_eq!(inner.index_at(0), Some(0));
        assert_eq!(inner.null_count(), 0);
    }
}
