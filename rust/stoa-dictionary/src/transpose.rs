//! Transposition of dictionary index buffers onto a unified dictionary.

use std::sync::Arc;

use stoa_bytes::{Bytes, buffer::AlignedByteVec};
use stoa_column::{
    bitmap,
    column::Column,
    dictionary::{DictionaryColumn, IndexInt},
    schema::{DataType, IndexWidth},
};
use stoa_common::{Result, error::Error, verify_arg};

/// Re-encodes `source` against `target_dictionary` by mapping every index
/// through `transpose_map`.
///
/// `transpose_map` carries one entry per source dictionary position, giving
/// the id of that value in the target dictionary. When the map is the
/// identity and the index widths agree, the source buffers are shared with
/// the result instead of copied. Otherwise a fresh index buffer is written
/// at offset zero, with the validity bitmap shared when possible and
/// realigned when the source view starts at a non-zero offset.
pub fn transpose(
    source: &DictionaryColumn,
    target_type: &DataType,
    target_dictionary: Arc<Column>,
    transpose_map: &[i32],
) -> Result<DictionaryColumn> {
    let out_type = match target_type {
        DataType::Dictionary(out_type) => *out_type,
        other => {
            return Err(Error::type_mismatch(
                "dictionary type".to_string(),
                other.to_string(),
            ));
        }
    };
    let out_width = IndexWidth::of(out_type.index_type).ok_or_else(|| {
        Error::not_implemented(format!(
            "transposition to {} indices",
            out_type.index_type
        ))
    })?;
    if out_type.value_type != target_dictionary.type_desc() {
        return Err(Error::type_mismatch(
            out_type.value_type.to_string(),
            target_dictionary.type_desc().to_string(),
        ));
    }
    verify_arg!(
        transpose_map,
        transpose_map.len() == source.dictionary().len()
    );

    let in_width = source.index_width();
    if in_width == out_width && is_trivial_transposition(transpose_map) {
        return Ok(DictionaryColumn::from_parts(
            out_type,
            target_dictionary,
            source.indices().clone(),
            source.validity().cloned(),
            source.len(),
            source.offset(),
        ));
    }

    let len = source.len();
    let mut out_buf = AlignedByteVec::zeroed(len * out_width.byte_width());
    match (in_width, out_width) {
        (IndexWidth::W8, IndexWidth::W8) => {
            transpose_indices::<i8, i8>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W8, IndexWidth::W16) => {
            transpose_indices::<i8, i16>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W8, IndexWidth::W32) => {
            transpose_indices::<i8, i32>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W8, IndexWidth::W64) => {
            transpose_indices::<i8, i64>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W16, IndexWidth::W8) => {
            transpose_indices::<i16, i8>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W16, IndexWidth::W16) => {
            transpose_indices::<i16, i16>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W16, IndexWidth::W32) => {
            transpose_indices::<i16, i32>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W16, IndexWidth::W64) => {
            transpose_indices::<i16, i64>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W32, IndexWidth::W8) => {
            transpose_indices::<i32, i8>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W32, IndexWidth::W16) => {
            transpose_indices::<i32, i16>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W32, IndexWidth::W32) => {
            transpose_indices::<i32, i32>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W32, IndexWidth::W64) => {
            transpose_indices::<i32, i64>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W64, IndexWidth::W8) => {
            transpose_indices::<i64, i8>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W64, IndexWidth::W16) => {
            transpose_indices::<i64, i16>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W64, IndexWidth::W32) => {
            transpose_indices::<i64, i32>(source, transpose_map, &mut out_buf)
        }
        (IndexWidth::W64, IndexWidth::W64) => {
            transpose_indices::<i64, i64>(source, transpose_map, &mut out_buf)
        }
    }

    // The result lives at offset zero, so a bitmap belonging to a shifted
    // source view has to be realigned.
    let validity = match source.validity() {
        Some(bits) if source.offset() != 0 => Some(Bytes::from_vec(bitmap::copy_bitmap(
            bits,
            source.offset(),
            len,
        ))),
        Some(bits) => Some(bits.clone()),
        None => None,
    };

    Ok(DictionaryColumn::from_parts(
        out_type,
        target_dictionary,
        Bytes::from_vec(out_buf),
        validity,
        len,
        0,
    ))
}

fn is_trivial_transposition(transpose_map: &[i32]) -> bool {
    transpose_map
        .iter()
        .enumerate()
        .all(|(position, &id)| id == position as i32)
}

fn transpose_indices<I, O>(source: &DictionaryColumn, map: &[i32], out: &mut AlignedByteVec)
where
    I: IndexInt,
    O: IndexInt,
{
    let values = source.typed_indices::<I>();
    let out = out.typed_data_mut::<O>();
    for (i, slot) in out.iter_mut().enumerate() {
        if source.is_valid(i) {
            *slot = O::from_i32(map[values[i].to_i64() as usize]);
        }
    }
}
