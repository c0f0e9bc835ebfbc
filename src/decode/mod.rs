//! Table decoder module
//!
//! # Overview
//!
//! The decode module extracts one dimension of a normalized table (the free,
//! usually "area", dimension) over all its categories while every other
//! dimension is pinned to configured keys:
//!
//! - [`resolve_dimension`] - find a dimension by case-insensitive name hints
//! - [`compute_strides`] / [`flat_index`] - row-major index arithmetic
//! - [`TableDecoder`] - scalar or labeled-vector output per area
//! - [`infer_scale`] - explicit, opt-in unit correction

mod decoder;
mod scale;
mod types;

pub use decoder::{compute_strides, decode, flat_index, resolve_dimension, TableDecoder};
pub use scale::{apply_scale, infer_scale, ScalePolicy, DEFAULT_THOUSANDS_THRESHOLD};
pub use types::{
    Cell, DecodedRow, DecodedTable, DecodedValue, FixedSelection, MeasureValue,
    PositionalFallback, RoleHints, Selection, SelectionKeys,
};
