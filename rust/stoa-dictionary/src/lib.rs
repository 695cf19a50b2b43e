//! Dictionary unification and transposition for Stoa columns.
//!
//! Dictionary-encoded column chunks are written independently, so each
//! chunk carries its own dictionary and the same value may be assigned
//! different ids in different chunks. This crate reconciles them:
//!
//! 1. A [`crate::unify::DictionaryUnifier`] merges the per-chunk
//!    dictionaries into one vocabulary, assigning stable ids in first-seen
//!    order and reporting a transpose map for every merged chunk.
//! 2. [`crate::unify::DictionaryUnifier::finish`] materializes the unified
//!    dictionary and selects the narrowest signed index type addressing it.
//! 3. [`crate::transpose::transpose`] rewrites each chunk's index buffer
//!    through its transpose map, sharing buffers outright when the map is
//!    the identity and the index widths agree.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stoa_column::{column::Column, dictionary::DictionaryColumn, schema::DataType};
//! use stoa_dictionary::{transpose::transpose, unify::make_unifier};
//!
//! # fn main() -> stoa_common::Result<()> {
//! // Two chunks of the same string column, each with its own dictionary.
//! let first_dict = Arc::new(Column::from_strings(["b", "a", "c"]));
//! let second_dict = Arc::new(Column::from_strings(["a", "d"]));
//! let first = DictionaryColumn::try_from_indices::<i8>(first_dict.clone(), &[0, 1, 2], None)?;
//! let second = DictionaryColumn::try_from_indices::<i8>(second_dict.clone(), &[0, 1, 0], None)?;
//!
//! let mut unifier = make_unifier(first_dict.type_desc())?;
//! let first_map = unifier.unify_with_map(&first_dict)?;
//! let second_map = unifier.unify_with_map(&second_dict)?;
//! let unified = unifier.finish()?;
//!
//! // Re-encode both chunks against the unified dictionary.
//! let target_type = DataType::Dictionary(unified.dictionary_type);
//! let first = transpose(&first, &target_type, unified.dictionary.clone(), &first_map)?;
//! let second = transpose(&second, &target_type, unified.dictionary.clone(), &second_map)?;
//! assert_eq!(first.typed_indices::<i8>(), &[0, 1, 2]);
//! assert_eq!(second.typed_indices::<i8>(), &[1, 3, 1]);
//! # Ok(())
//! # }
//! ```

pub mod memo;
pub mod transpose;
pub mod unify;
pub mod value;
