//! Engine types
//!
//! Results of loading a dataset and where their data came from.

use crate::decode::DecodedTable;
use crate::table::TableInfo;
use serde::Serialize;

/// Where a loaded table's data came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// Fetched and decoded from the live table
    Live,
    /// Decoded from a response body supplied by the caller
    Local,
    /// Static fallback rows from the catalog
    Fallback {
        /// Why the live table was not used
        reason: String,
    },
}

impl Origin {
    /// Create a fallback origin
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self::Fallback {
            reason: reason.into(),
        }
    }

    /// Check if this is fallback data
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// A decoded dataset ready to hand to a map or chart
#[derive(Debug, Clone, Serialize)]
pub struct LoadedDataset {
    /// Dataset name
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub origin: Origin,
    /// Scale multiplier that was applied to the decoded values
    pub multiplier: f64,
    /// Descriptive fields of the source table (live data only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<TableInfo>,
    pub table: DecodedTable,
}

impl LoadedDataset {
    /// Check if the live table was used
    pub fn is_live(&self) -> bool {
        !self.origin.is_fallback()
    }
}

/// Options for loading datasets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skip the network and serve fallback data directly
    pub offline: bool,
}

impl LoadOptions {
    /// Options for offline loading
    pub fn offline() -> Self {
        Self { offline: true }
    }
}
