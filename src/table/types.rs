//! Normalized table types
//!
//! Every raw response shape is adapted into a [`TabularResponse`] before
//! decoding. Dimensions keep their categories sorted by positional index.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// One category of a dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Category key (e.g. municipality code "KU091")
    pub key: String,
    /// 0-based position within the dimension
    pub index: usize,
    /// Human-readable label, if the table carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Category {
    /// Create a category without a label
    pub fn new(key: impl Into<String>, index: usize) -> Self {
        Self {
            key: key.into(),
            index,
            label: None,
        }
    }

    /// Set the label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// One axis of a statistical table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    categories: Vec<Category>,
}

impl Dimension {
    /// Create a dimension, checking that category indices are exactly `0..size`
    /// and that keys are unique.
    pub fn new(
        name: impl Into<String>,
        label: Option<String>,
        mut categories: Vec<Category>,
    ) -> Result<Self> {
        let name = name.into();
        let size = categories.len();
        let mut seen = vec![false; size];
        let mut keys = HashSet::with_capacity(size);

        for category in &categories {
            if category.index >= size || seen[category.index] {
                return Err(Error::invalid_table(format!(
                    "dimension '{name}': category '{}' has index {} (expected a unique index in 0..{size})",
                    category.key, category.index
                )));
            }
            seen[category.index] = true;

            if !keys.insert(category.key.as_str()) {
                return Err(Error::invalid_table(format!(
                    "dimension '{name}': duplicate category key '{}'",
                    category.key
                )));
            }
        }

        categories.sort_by_key(|c| c.index);

        Ok(Self {
            name,
            label,
            categories,
        })
    }

    /// Create a dimension from keys in positional order
    pub fn from_keys<I, S>(name: impl Into<String>, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories = keys
            .into_iter()
            .enumerate()
            .map(|(index, key)| Category::new(key, index))
            .collect();

        Self::new(name, None, categories)
    }

    /// Dimension id as it appears in the table
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable dimension label
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of categories
    pub fn size(&self) -> usize {
        self.categories.len()
    }

    /// Categories in positional order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category at a position
    pub fn category(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    /// Positional index of a category key
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.index)
    }
}

/// Table-level descriptive fields carried through from the raw response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    /// Table title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Publishing agency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Last update time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

/// A multidimensional table: dimensions plus a flat row-major value array
/// (last dimension varies fastest).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularResponse {
    /// Dimensions, outermost first
    pub dimensions: Vec<Dimension>,
    /// Flat cells; `None` is a null cell
    pub values: Vec<Option<f64>>,
    /// Descriptive fields
    pub info: TableInfo,
}

impl TabularResponse {
    /// Create a table without descriptive info
    pub fn new(dimensions: Vec<Dimension>, values: Vec<Option<f64>>) -> Self {
        Self {
            dimensions,
            values,
            info: TableInfo::default(),
        }
    }

    /// Set descriptive info
    #[must_use]
    pub fn with_info(mut self, info: TableInfo) -> Self {
        self.info = info;
        self
    }

    /// Dimension sizes, outermost first
    pub fn sizes(&self) -> Vec<usize> {
        self.dimensions.iter().map(Dimension::size).collect()
    }

    /// Number of cells the dimensions describe (`None` on overflow)
    pub fn expected_len(&self) -> Option<usize> {
        self.dimensions
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(d.size()))
    }

    /// Whether `values` has exactly one cell per category combination
    pub fn is_complete(&self) -> bool {
        self.expected_len() == Some(self.values.len())
    }

    /// Look up a dimension by exact name
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name() == name)
    }

    /// Cell at a flat index; `None` when out of bounds or null
    pub fn value_at(&self, flat_index: usize) -> Option<f64> {
        self.values.get(flat_index).copied().flatten()
    }
}
