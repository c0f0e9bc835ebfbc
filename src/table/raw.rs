//! Raw response shapes and their adapters
//!
//! PxWeb serves tables either as a JSON-stat 1.0 bundle (`{"dataset": {...}}`,
//! the "px" JSON format) or as a flat JSON-stat2 dataset. Both are classified
//! once into [`RawTable`] and each variant has its own adapter into
//! [`TabularResponse`].

use super::types::{Category, Dimension, TableInfo, TabularResponse};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Largest table a sparse `value` object may expand to
pub const MAX_SPARSE_CELLS: usize = 10_000_000;

/// A table response as received, before normalization
#[derive(Debug, Clone)]
pub enum RawTable {
    /// PxWeb "px" / JSON-stat 1.0 bundle
    PxWeb(RawPxWebTable),
    /// JSON-stat 2.0 dataset
    JsonStat2(RawJsonStat2Table),
}

impl RawTable {
    /// Parse a response body
    pub fn parse(body: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Classify a JSON value as one of the supported table shapes
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(Error::decode("table response is not a JSON object"));
        };

        if obj.contains_key("dataset") {
            let table = serde_json::from_value(value)
                .map_err(|e| Error::decode(format!("Invalid PxWeb table: {e}")))?;
            return Ok(Self::PxWeb(table));
        }

        let is_dataset_class = obj.get("class").and_then(JsonValue::as_str) == Some("dataset");
        if is_dataset_class || (obj.contains_key("id") && obj.contains_key("dimension")) {
            let table = serde_json::from_value(value)
                .map_err(|e| Error::decode(format!("Invalid JSON-stat2 table: {e}")))?;
            return Ok(Self::JsonStat2(table));
        }

        Err(Error::decode(
            "unrecognized table shape: expected a PxWeb `dataset` bundle or a JSON-stat2 dataset",
        ))
    }

    /// Short name of the shape, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PxWeb(_) => "pxweb",
            Self::JsonStat2(_) => "json-stat2",
        }
    }

    /// Adapt into the common table shape
    pub fn normalize(self) -> Result<TabularResponse> {
        match self {
            Self::PxWeb(table) => table.normalize(),
            Self::JsonStat2(table) => table.normalize(),
        }
    }
}

// ============================================================================
// PxWeb "px" bundle
// ============================================================================

/// `{"dataset": {...}}` as served by PxWeb
#[derive(Debug, Clone, Deserialize)]
pub struct RawPxWebTable {
    /// The single dataset in the bundle
    pub dataset: RawPxDataset,
}

/// JSON-stat 1.0 dataset: `id`, `size` and `role` live inside `dimension`
#[derive(Debug, Clone, Deserialize)]
pub struct RawPxDataset {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    pub dimension: JsonObject,
    #[serde(default)]
    pub value: RawValues,
}

impl RawPxWebTable {
    /// Adapt into the common table shape
    pub fn normalize(self) -> Result<TabularResponse> {
        let RawPxDataset {
            label,
            source,
            updated,
            mut dimension,
            value,
        } = self.dataset;

        let order: Vec<String> = match dimension.remove("id") {
            Some(id) => serde_json::from_value(id)
                .map_err(|e| Error::decode(format!("Invalid dimension.id: {e}")))?,
            None => Vec::new(),
        };
        let sizes: Vec<usize> = match dimension.remove("size") {
            Some(size) => serde_json::from_value(size)
                .map_err(|e| Error::decode(format!("Invalid dimension.size: {e}")))?,
            None => Vec::new(),
        };
        dimension.remove("role");

        let info = TableInfo {
            label,
            source,
            updated: updated.as_deref().and_then(parse_updated),
        };
        build_table(order, &sizes, dimension, value, info)
    }
}

// ============================================================================
// JSON-stat2
// ============================================================================

/// Flat JSON-stat2 dataset
#[derive(Debug, Clone, Deserialize)]
pub struct RawJsonStat2Table {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub id: Vec<String>,
    #[serde(default)]
    pub size: Vec<usize>,
    pub dimension: JsonObject,
    #[serde(default)]
    pub value: RawValues,
}

impl RawJsonStat2Table {
    /// Adapt into the common table shape
    pub fn normalize(self) -> Result<TabularResponse> {
        if let Some(class) = self.class.as_deref() {
            if class != "dataset" {
                return Err(Error::decode(format!(
                    "JSON-stat2 class '{class}' is not a dataset"
                )));
            }
        }

        let info = TableInfo {
            label: self.label,
            source: self.source,
            updated: self.updated.as_deref().and_then(parse_updated),
        };
        build_table(self.id, &self.size, self.dimension, self.value, info)
    }
}

// ============================================================================
// Shared pieces
// ============================================================================

/// Value array: dense list or sparse `"position" -> value` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawValues {
    Dense(Vec<JsonValue>),
    Sparse(JsonObject),
}

impl Default for RawValues {
    fn default() -> Self {
        Self::Dense(Vec::new())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawDimension {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    category: RawCategory,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawCategory {
    #[serde(default)]
    index: Option<RawCategoryIndex>,
    #[serde(default)]
    label: Option<JsonObject>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawCategoryIndex {
    Positions(HashMap<String, usize>),
    Keys(Vec<String>),
}

fn build_table(
    mut order: Vec<String>,
    sizes: &[usize],
    dimensions: JsonObject,
    values: RawValues,
    info: TableInfo,
) -> Result<TabularResponse> {
    if order.is_empty() {
        order = dimensions.keys().cloned().collect();
    }

    if !sizes.is_empty() && sizes.len() != order.len() {
        return Err(Error::invalid_table(format!(
            "{} dimension ids but {} sizes",
            order.len(),
            sizes.len()
        )));
    }

    let mut dims = Vec::with_capacity(order.len());
    for (pos, id) in order.iter().enumerate() {
        let raw = dimensions.get(id).ok_or_else(|| {
            Error::invalid_table(format!("dimension '{id}' is listed but not described"))
        })?;
        let raw: RawDimension = serde_json::from_value(raw.clone())
            .map_err(|e| Error::decode(format!("Invalid dimension '{id}': {e}")))?;
        let dim = build_dimension(id, raw)?;

        if let Some(&size) = sizes.get(pos) {
            if size != dim.size() {
                return Err(Error::invalid_table(format!(
                    "dimension '{id}' declares size {size} but has {} categories",
                    dim.size()
                )));
            }
        }
        dims.push(dim);
    }

    let mut table = TabularResponse::new(dims, Vec::new()).with_info(info);
    table.values = build_values(values, table.expected_len())?;

    if !table.is_complete() {
        warn!(
            expected = ?table.expected_len(),
            actual = table.values.len(),
            "Table value count does not match dimension sizes"
        );
    }

    debug!(
        dimensions = ?table.dimensions.iter().map(Dimension::name).collect::<Vec<_>>(),
        sizes = ?table.sizes(),
        "Normalized table"
    );
    Ok(table)
}

fn build_dimension(id: &str, raw: RawDimension) -> Result<Dimension> {
    let labels = raw.category.label.unwrap_or_default();
    let label_of = |key: &str| {
        labels
            .get(key)
            .and_then(JsonValue::as_str)
            .map(ToString::to_string)
    };

    let categories: Vec<Category> = match raw.category.index {
        Some(RawCategoryIndex::Positions(positions)) => positions
            .into_iter()
            .map(|(key, index)| Category {
                label: label_of(&key),
                key,
                index,
            })
            .collect(),
        Some(RawCategoryIndex::Keys(keys)) => keys
            .into_iter()
            .enumerate()
            .map(|(index, key)| Category {
                label: label_of(&key),
                key,
                index,
            })
            .collect(),
        // A missing index means the label map gives the order
        None => labels
            .iter()
            .enumerate()
            .map(|(index, (key, label))| Category {
                key: key.clone(),
                index,
                label: label.as_str().map(ToString::to_string),
            })
            .collect(),
    };

    if categories.is_empty() {
        return Err(Error::invalid_table(format!(
            "dimension '{id}' has no categories"
        )));
    }

    Dimension::new(id, raw.label, categories)
}

fn build_values(values: RawValues, expected_len: Option<usize>) -> Result<Vec<Option<f64>>> {
    match values {
        RawValues::Dense(cells) => Ok(cells.iter().map(parse_cell).collect()),
        RawValues::Sparse(cells) => {
            let len = expected_len
                .ok_or_else(|| Error::invalid_table("dimension sizes overflow"))?;
            if len > MAX_SPARSE_CELLS {
                return Err(Error::invalid_table(format!(
                    "sparse table of {len} cells exceeds the limit of {MAX_SPARSE_CELLS}"
                )));
            }
            let mut out = vec![None; len];
            for (position, cell) in &cells {
                let index: usize = position.parse().map_err(|_| {
                    Error::invalid_table(format!("sparse value key '{position}' is not a position"))
                })?;
                let slot = out.get_mut(index).ok_or_else(|| {
                    Error::invalid_table(format!(
                        "sparse value position {index} outside table of {len} cells"
                    ))
                })?;
                *slot = parse_cell(cell);
            }
            Ok(out)
        }
    }
}

/// Numbers pass through, numeric strings are parsed, everything else
/// (null, "..", "-") is a missing cell.
fn parse_cell(cell: &JsonValue) -> Option<f64> {
    match cell {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn parse_updated(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    debug!(updated = raw, "Unparseable table update time");
    None
}
