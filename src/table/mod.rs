//! Statistical table module
//!
//! Supports: PxWeb "px" bundles (JSON-stat 1.0) and JSON-stat2
//!
//! # Overview
//!
//! Raw response bodies are classified into [`RawTable`] and normalized into a
//! single [`TabularResponse`] shape: ordered dimensions with indexed
//! categories, plus a flat row-major value array.

mod raw;
mod types;

pub use raw::{
    RawJsonStat2Table, RawPxDataset, RawPxWebTable, RawTable, RawValues, MAX_SPARSE_CELLS,
};
pub use types::{Category, Dimension, TableInfo, TabularResponse};
