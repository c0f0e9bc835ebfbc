//! YAML Loader module
//!
//! Parse dataset catalogs from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `CatalogDefinition` - A PxWeb database and its datasets
//! - `DatasetDefinition` - Table path, query, decoding roles, fallback
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{load_catalog, load_catalog_from_str, validate_catalog};
pub use types::{
    CatalogDefinition, DatasetDefinition, FallbackDefinition, FallbackRow, FallbackValue,
    FixedDefinition, HttpDefinition, QueryItemDefinition, RoleDefinition,
};
