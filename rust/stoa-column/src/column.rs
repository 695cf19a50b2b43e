//! The plain (non-encoded) column container.

use crate::{
    bitmap::BitmapBuilder,
    offsets::Offsets,
    schema::BasicTypeDescriptor,
    values::Values,
};

/// An owned sequence of values of a single basic type, with optional nulls.
///
/// Fixed-size types store `len * primitive_size` payload bytes in `values`;
/// variable-size types additionally carry `len + 1` end offsets. Validity is
/// a bit-packed bitmap materialized only once the first null is appended; a
/// column without a bitmap has no nulls.
#[derive(Debug, Clone)]
pub struct Column {
    type_desc: BasicTypeDescriptor,
    len: usize,
    null_count: usize,
    values: Values,
    offsets: Option<Offsets>,
    validity: Option<BitmapBuilder>,
}

impl Column {
    /// Creates an empty column of the given type.
    pub fn empty(type_desc: BasicTypeDescriptor) -> Column {
        let offsets = type_desc.basic_type.requires_offsets().then(Offsets::new);
        Column {
            type_desc,
            len: 0,
            null_count: 0,
            values: Values::new(),
            offsets,
            validity: None,
        }
    }

    /// Wraps prebuilt buffers into a column.
    ///
    /// # Panics
    ///
    /// Panics if the buffers are inconsistent with `type_desc` and `len`.
    pub fn from_parts(
        type_desc: BasicTypeDescriptor,
        values: Values,
        offsets: Option<Offsets>,
        validity: Option<BitmapBuilder>,
        len: usize,
    ) -> Column {
        if let Some(offsets) = offsets.as_ref() {
            assert_eq!(offsets.item_count(), len);
            assert_eq!(offsets.last() as usize, values.bytes_len());
        } else if let Some(size) = type_desc.primitive_size() {
            assert_eq!(values.bytes_len(), len * size);
        }
        let null_count = match validity.as_ref() {
            Some(bitmap) => {
                assert_eq!(bitmap.len(), len);
                len - crate::bitmap::count_set_bits(bitmap.as_slice(), 0, len)
            }
            None => 0,
        };
        Column {
            type_desc,
            len,
            null_count,
            values,
            offsets,
            validity,
        }
    }

    /// Creates a column of a fixed-size type from a slice of values.
    ///
    /// # Panics
    ///
    /// Panics if `size_of::<T>()` differs from the type's primitive size.
    pub fn from_slice<T>(type_desc: BasicTypeDescriptor, items: &[T]) -> Column
    where
        T: bytemuck::NoUninit,
    {
        assert_eq!(type_desc.primitive_size(), Some(size_of::<T>()));
        let mut values = Values::with_capacity::<T>(items.len());
        values.extend_from_slice(items);
        Column {
            type_desc,
            len: items.len(),
            null_count: 0,
            values,
            offsets: None,
            validity: None,
        }
    }

    /// Creates a string column from an iterator of items.
    pub fn from_strings<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Column {
        let type_desc = BasicTypeDescriptor {
            basic_type: crate::schema::BasicType::String,
            fixed_size: 0,
            signed: false,
        };
        let mut column = Column::empty(type_desc);
        for item in items {
            column.push_str(item.as_ref());
        }
        column
    }

    /// Creates a string column where `None` items become nulls.
    pub fn from_nullable_strings<S: AsRef<str>>(
        items: impl IntoIterator<Item = Option<S>>,
    ) -> Column {
        let type_desc = BasicTypeDescriptor {
            basic_type: crate::schema::BasicType::String,
            fixed_size: 0,
            signed: false,
        };
        let mut column = Column::empty(type_desc);
        for item in items {
            match item {
                Some(value) => column.push_str(value.as_ref()),
                None => column.push_null(),
            }
        }
        column
    }

    /// Creates a binary column from an iterator of byte strings.
    pub fn from_binary<B: AsRef<[u8]>>(items: impl IntoIterator<Item = B>) -> Column {
        let type_desc = BasicTypeDescriptor {
            basic_type: crate::schema::BasicType::Binary,
            fixed_size: 0,
            signed: false,
        };
        let mut column = Column::empty(type_desc);
        for item in items {
            column.push_binary(item.as_ref());
        }
        column
    }
}

impl Column {
    /// Appends a fixed-size value.
    ///
    /// # Panics
    ///
    /// Panics if `size_of::<T>()` differs from the type's primitive size.
    pub fn push_value<T>(&mut self, value: T)
    where
        T: bytemuck::NoUninit,
    {
        assert_eq!(self.type_desc.primitive_size(), Some(size_of::<T>()));
        self.values.push(value);
        if let Some(validity) = self.validity.as_mut() {
            validity.append(true);
        }
        self.len += 1;
    }

    /// Appends a byte-string value, variable-length or fixed-size depending
    /// on the column type.
    pub fn push_binary(&mut self, value: &[u8]) {
        if let Some(offsets) = self.offsets.as_mut() {
            offsets.push_length(value.len());
        } else {
            let size = self.type_desc.primitive_size().expect("fixed-size type");
            assert_eq!(value.len(), size);
        }
        self.values.extend_from_slice(value);
        if let Some(validity) = self.validity.as_mut() {
            validity.append(true);
        }
        self.len += 1;
    }

    pub fn push_str(&mut self, value: &str) {
        self.push_binary(value.as_bytes());
    }

    /// Appends a null. The payload slot holds zeroes (or an empty item for
    /// offsetted types) and the validity bit is cleared.
    pub fn push_null(&mut self) {
        if let Some(offsets) = self.offsets.as_mut() {
            offsets.push_length(0);
        } else {
            let size = self.type_desc.primitive_size().expect("fixed-size type");
            self.values.resize_zeroed_bytes(self.values.bytes_len() + size);
        }
        self.ensure_validity().append(false);
        self.null_count += 1;
        self.len += 1;
    }

    fn ensure_validity(&mut self) -> &mut BitmapBuilder {
        if self.validity.is_none() {
            let mut bitmap = BitmapBuilder::with_capacity(self.len + 1);
            bitmap.append_n(self.len, true);
            self.validity = Some(bitmap);
        }
        self.validity.as_mut().expect("validity bitmap")
    }
}

impl Column {
    #[inline]
    pub fn type_desc(&self) -> BasicTypeDescriptor {
        self.type_desc
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
    pub fn null_count(&self) -> usize {
        self.null_count
    }

    #[inline]
    pub fn is_valid(&self, index: usize) -> bool {
        assert!(index < self.len);
        self.validity.as_ref().is_none_or(|bitmap| bitmap.get(index))
    }

    #[inline]
    pub fn is_null(&self, index: usize) -> bool {
        !self.is_valid(index)
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn offsets(&self) -> Option<&Offsets> {
        self.offsets.as_ref()
    }

    /// Views the payload as a typed slice. Meaningful for fixed-size types
    /// whose primitive size equals `size_of::<T>()`.
    #[inline]
    pub fn as_slice<T>(&self) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        self.values.as_slice()
    }

    /// Returns the raw bytes of the value at `index`.
    pub fn binary_at(&self, index: usize) -> &[u8] {
        assert!(index < self.len);
        let range = if let Some(offsets) = self.offsets.as_ref() {
            let range = offsets.range_at(index);
            range.start as usize..range.end as usize
        } else {
            let size = self.type_desc.primitive_size().expect("fixed-size type");
            index * size..(index + 1) * size
        };
        &self.values.as_bytes()[range]
    }

    pub fn string_at(&self, index: usize) -> &str {
        std::str::from_utf8(self.binary_at(index)).expect("invalid utf8")
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Column) -> bool {
        if self.type_desc != other.type_desc
            || self.len != other.len
            || self.null_count != other.null_count
        {
            return false;
        }
        for i in 0..self.len {
            match (self.is_null(i), other.is_null(i)) {
                (true, true) => continue,
                (false, false) => {
                    if self.binary_at(i) != other.binary_at(i) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Column {}
