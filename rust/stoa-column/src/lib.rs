//! Columnar containers for the Stoa data toolkit.
//!
//! This crate provides the in-memory column representations that the rest of
//! the Stoa crates operate on: flat columns of typed values and
//! dictionary-encoded columns that pair an integer index buffer with a shared
//! dictionary of distinct values.
//!
//! # Core Concepts
//!
//! ## Columns
//!
//! [`crate::column::Column`] is an owned slice of values of a single storage
//! type. Values are stored in contiguous, aligned byte buffers
//! ([`crate::values::Values`]); variable-length types carry an offset array
//! ([`crate::offsets::Offsets`]) and nullable columns carry a validity
//! bitmap (built with [`crate::bitmap::BitmapBuilder`]).
//!
//! ## Dictionary encoding
//!
//! [`crate::dictionary::DictionaryColumn`] stores a column as integer
//! positions into a dictionary [`crate::column::Column`] of distinct values.
//! The index buffer and validity bitmap are immutable shared byte views, so
//! cloning and slicing are zero-copy. Index widths are modeled by
//! [`crate::schema::IndexWidth`] and the [`crate::dictionary::IndexInt`]
//! trait covers the signed integer types usable as indices.
//!
//! ## Type descriptors
//!
//! [`crate::schema::BasicTypeDescriptor`] captures the storage type of a
//! column, and [`crate::schema::DictionaryTypeDescriptor`] the
//! index/value type pair of a dictionary-encoded one.

pub mod bitmap;
pub mod column;
pub mod dictionary;
pub mod offsets;
pub mod schema;
pub mod values;
