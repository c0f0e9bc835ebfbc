// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pxcube
//!
//! Decode PxWeb / JSON-stat2 multidimensional tables into per-area values.
//!
//! ## Features
//!
//! - **Table Normalization**: PxWeb "px" bundles and JSON-stat2 datasets
//! - **Hint-Based Decoding**: Dimensions found by case-insensitive name hints
//! - **Scalar or Vector Output**: One value or labeled channels per area
//! - **Explicit Scale Policy**: Opt-in thousands correction
//! - **Resilient Fetching**: Retries, rate limiting, deterministic fallback data
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pxcube::{load_catalog, DatasetLoader, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let catalog = load_catalog("statfin")?;
//!     let loader = DatasetLoader::new(catalog)?;
//!
//!     let unemployment = loader.load("unemployment").await?;
//!     for row in &unemployment.table.rows {
//!         println!("{}: {:?}", row.key, row.value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────────┐   ┌─────────┐
//! │  Catalog │──▶│   HTTP   │──▶│   RawTable   │──▶│ Decoder │──▶ DecodedTable
//! │  (YAML)  │   │  client  │   │  normalize() │   │ + scale │
//! └──────────┘   └──────────┘   └──────────────┘   └─────────┘
//!                     │ failure                          │
//!                     └──────────▶ FallbackProvider ─────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Raw table shapes and normalization
pub mod table;

/// Table decoder and scale policy
pub mod decode;

/// PxWeb query bodies
pub mod query;

/// PxWeb table metadata
pub mod metadata;

/// Dataset loading engine
pub mod engine;

/// YAML loader for dataset catalogs
pub mod loader;

/// Built-in catalogs
pub mod catalogs;

/// Joining decoded rows to map features
pub mod join;

/// Summary statistics
pub mod stats;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use decode::{
    decode, infer_scale, Cell, DecodedTable, DecodedValue, RoleHints, ScalePolicy, Selection,
    TableDecoder,
};
pub use engine::{DatasetLoader, LoadedDataset, Origin};
pub use loader::{load_catalog, load_catalog_from_str, CatalogDefinition, DatasetDefinition};
pub use table::{RawTable, TabularResponse};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
