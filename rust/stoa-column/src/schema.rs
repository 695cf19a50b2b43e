//! Logical type descriptors for columns and dictionary-encoded columns.

/// The physical value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BasicType {
    Unit = 0,
    Boolean = 1,
    Int8 = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    Float32 = 6,
    Float64 = 7,
    Binary = 8,
    FixedSizeBinary = 9,
    String = 10,
    Guid = 11,
    DateTime = 12,
    List = 13,
    FixedSizeList = 14,
    Struct = 15,
    Map = 16,
    Union = 17,
}

impl BasicType {
    /// Returns `true` if the value storage for this type requires offset
    /// encoding (variable-length values).
    pub fn requires_offsets(&self) -> bool {
        matches!(
            self,
            BasicType::Binary | BasicType::String | BasicType::List | BasicType::Map
        )
    }

    /// Returns `true` if this is one of the integer types (i8, i16, i32 or i64).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            BasicType::Int8 | BasicType::Int16 | BasicType::Int32 | BasicType::Int64
        )
    }
}

impl std::fmt::Display for BasicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BasicType::Unit => "unit",
            BasicType::Boolean => "boolean",
            BasicType::Int8 => "int8",
            BasicType::Int16 => "int16",
            BasicType::Int32 => "int32",
            BasicType::Int64 => "int64",
            BasicType::Float32 => "float32",
            BasicType::Float64 => "float64",
            BasicType::Binary => "binary",
            BasicType::FixedSizeBinary => "fixed_size_binary",
            BasicType::String => "string",
            BasicType::Guid => "guid",
            BasicType::DateTime => "datetime",
            BasicType::List => "list",
            BasicType::FixedSizeList => "fixed_size_list",
            BasicType::Struct => "struct",
            BasicType::Map => "map",
            BasicType::Union => "union",
        };
        f.write_str(name)
    }
}

/// Describes a basic data type, including its size and signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicTypeDescriptor {
    /// The underlying physical type of the value.
    pub basic_type: BasicType,
    /// The fixed size of the vector-like type, if applicable. Relevant only
    /// for `FixedSizeBinary` (value size in bytes) and `FixedSizeList`
    /// (element count); zero for any other basic type.
    pub fixed_size: usize,
    /// Indicates whether the type is signed. Can be `true` only for `Int8`,
    /// `Int16`, `Int32` and `Int64`.
    pub signed: bool,
}

impl BasicTypeDescriptor {
    /// Returns the fixed size of the primitive basic type in bytes, or `None`
    /// if the type is variable-length or composite.
    pub fn primitive_size(&self) -> Option<usize> {
        match self.basic_type {
            BasicType::Unit | BasicType::Boolean => None,
            BasicType::Int8 => Some(1),
            BasicType::Int16 => Some(2),
            BasicType::Int32 => Some(4),
            BasicType::Int64 => Some(8),
            BasicType::Float32 => Some(4),
            BasicType::Float64 => Some(8),
            BasicType::Binary => None,
            BasicType::FixedSizeBinary => Some(self.fixed_size),
            BasicType::String => None,
            BasicType::Guid => Some(16),
            BasicType::DateTime => Some(8),
            BasicType::List
            | BasicType::FixedSizeList
            | BasicType::Struct
            | BasicType::Map
            | BasicType::Union => None,
        }
    }
}

impl Default for BasicTypeDescriptor {
    fn default() -> Self {
        Self {
            basic_type: BasicType::Unit,
            fixed_size: 0,
            signed: false,
        }
    }
}

impl std::fmt::Display for BasicTypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.basic_type.is_integer() && !self.signed {
            return write!(f, "u{}", self.basic_type);
        }
        match self.basic_type {
            BasicType::FixedSizeBinary | BasicType::FixedSizeList => {
                write!(f, "{}<{}>", self.basic_type, self.fixed_size)
            }
            _ => write!(f, "{}", self.basic_type),
        }
    }
}

/// Describes a dictionary-encoded column: the integer type of the indices
/// and the logical type of the dictionary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DictionaryTypeDescriptor {
    pub index_type: BasicTypeDescriptor,
    pub value_type: BasicTypeDescriptor,
}

impl std::fmt::Display for DictionaryTypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dictionary<{}, {}>", self.index_type, self.value_type)
    }
}

/// A column type: either a plain basic type or a dictionary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Basic(BasicTypeDescriptor),
    Dictionary(DictionaryTypeDescriptor),
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Basic(desc) => write!(f, "{desc}"),
            DataType::Dictionary(desc) => write!(f, "{desc}"),
        }
    }
}

/// Width of a dictionary index type, restricted to the signed integer widths
/// the encoding supports. Constructing an `IndexWidth` is the validation
/// step; code holding one can dispatch over it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IndexWidth {
    /// Resolves the width of a descriptor usable as a dictionary index type,
    /// or `None` if the descriptor is not a signed integer type.
    pub fn of(desc: BasicTypeDescriptor) -> Option<IndexWidth> {
        if !desc.signed {
            return None;
        }
        match desc.basic_type {
            BasicType::Int8 => Some(IndexWidth::W8),
            BasicType::Int16 => Some(IndexWidth::W16),
            BasicType::Int32 => Some(IndexWidth::W32),
            BasicType::Int64 => Some(IndexWidth::W64),
            _ => None,
        }
    }

    /// Selects the smallest width able to address every position of a
    /// dictionary with `len` entries.
    pub fn select_for_len(len: usize) -> IndexWidth {
        if len <= i8::MAX as usize {
            IndexWidth::W8
        } else if len <= i16::MAX as usize {
            IndexWidth::W16
        } else if len <= i32::MAX as usize {
            IndexWidth::W32
        } else {
            IndexWidth::W64
        }
    }

    #[inline]
    pub fn byte_width(self) -> usize {
        match self {
            IndexWidth::W8 => 1,
            IndexWidth::W16 => 2,
            IndexWidth::W32 => 4,
            IndexWidth::W64 => 8,
        }
    }

    pub fn descriptor(self) -> BasicTypeDescriptor {
        let basic_type = match self {
            IndexWidth::W8 => BasicType::Int8,
            IndexWidth::W16 => BasicType::Int16,
            IndexWidth::W32 => BasicType::Int32,
            IndexWidth::W64 => BasicType::Int64,
        };
        BasicTypeDescriptor {
            basic_type,
            fixed_size: 0,
            signed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_size() {
        let desc = BasicTypeDescriptor {
            basic_type: BasicType::Int32,
            fixed_size: 0,
            signed: true,
        };
        assert_eq!(desc.primitive_size(), Some(4));

        let desc = BasicTypeDescriptor {
            basic_type: BasicType::FixedSizeBinary,
            fixed_size: 10,
            signed: false,
        };
        assert_eq!(desc.primitive_size(), Some(10));

        let desc = BasicTypeDescriptor {
            basic_type: BasicType::String,
            fixed_size: 0,
            signed: false,
        };
        assert_eq!(desc.primitive_size(), None);
        assert!(desc.basic_type.requires_offsets());
    }

    #[test]
    fn test_index_width_of() {
        let int16 = BasicTypeDescriptor {
            basic_type: BasicType::Int16,
            fixed_size: 0,
            signed: true,
        };
        assert_eq!(IndexWidth::of(int16), Some(IndexWidth::W16));

        let uint16 = BasicTypeDescriptor {
            basic_type: BasicType::Int16,
            fixed_size: 0,
            signed: false,
        };
        assert_eq!(IndexWidth::of(uint16), None);

        let float = BasicTypeDescriptor {
            basic_type: BasicType::Float32,
            fixed_size: 0,
            signed: false,
        };
        assert_eq!(IndexWidth::of(float), None);
    }

    #[test]
    fn test_index_width_selection() {
        assert_eq!(IndexWidth::select_for_len(0), IndexWidth::W8);
        assert_eq!(IndexWidth::select_for_len(127), IndexWidth::W8);
        assert_eq!(IndexWidth::select_for_len(128), IndexWidth::W16);
        assert_eq!(IndexWidth::select_for_len(32767), IndexWidth::W16);
        assert_eq!(IndexWidth::select_for_len(32768), IndexWidth::W32);
        assert_eq!(IndexWidth::select_for_len(i32::MAX as usize), IndexWidth::W32);
        assert_eq!(IndexWidth::select_for_len(i32::MAX as usize + 1), IndexWidth::W64);
    }

    #[test]
    fn test_display() {
        let value_type = BasicTypeDescriptor {
            basic_type: BasicType::String,
            fixed_size: 0,
            signed: false,
        };
        let desc = DictionaryTypeDescriptor {
            index_type: IndexWidth::W32.descriptor(),
            value_type,
        };
        assert_eq!(desc.to_string(), "dictionary<int32, string>");
        assert_eq!(DataType::Basic(value_type).to_string(), "string");

        let uint64 = BasicTypeDescriptor {
            basic_type: BasicType::Int64,
            fixed_size: 0,
            signed: false,
        };
        assert_eq!(uint64.to_string(), "uint64");
    }
}
