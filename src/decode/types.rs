//! Decoder types
//!
//! Selection inputs (role hints, fixed selections, measure labels) and the
//! decoded output (rows of scalar or labeled-vector cells).

use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

// ============================================================================
// Selection
// ============================================================================

/// Positional default used when no hint matches a dimension name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalFallback {
    /// Outermost dimension
    First,
    /// Innermost dimension
    Last,
    /// Dimension at a 0-based position
    Position(usize),
}

impl PositionalFallback {
    /// Resolve against a dimension count
    pub fn resolve(&self, dimension_count: usize) -> Option<usize> {
        match *self {
            Self::First => (dimension_count > 0).then_some(0),
            Self::Last => dimension_count.checked_sub(1),
            Self::Position(pos) => (pos < dimension_count).then_some(pos),
        }
    }
}

/// Case-insensitive name hints for one semantic role (area, year, measure...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHints {
    /// Role name, used in errors
    pub role: String,
    /// Substrings tried in priority order
    pub hints: Vec<String>,
    /// Positional default when nothing matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<PositionalFallback>,
}

impl RoleHints {
    /// Create role hints
    pub fn new<I, S>(role: impl Into<String>, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: role.into(),
            hints: hints.into_iter().map(Into::into).collect(),
            fallback: None,
        }
    }

    /// Area / municipality role with the Finnish and English names StatFin uses
    pub fn area() -> Self {
        Self::new("area", ["alue", "municipality", "region"])
    }

    /// Time role
    pub fn time() -> Self {
        Self::new("time", ["vuosi", "year", "time"])
    }

    /// Measure / information role
    pub fn measure() -> Self {
        Self::new("measure", ["tiedot", "information", "measure"])
    }

    /// Set the positional fallback
    #[must_use]
    pub fn with_fallback(mut self, fallback: PositionalFallback) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Category keys chosen for a fixed dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionKeys {
    /// One key for every output channel
    Single(String),
    /// One key per output channel, in output order
    Channels(Vec<String>),
}

impl SelectionKeys {
    /// All configured keys
    pub fn keys(&self) -> &[String] {
        match self {
            Self::Single(key) => std::slice::from_ref(key),
            Self::Channels(keys) => keys,
        }
    }
}

/// A non-free dimension pinned to one key or to a list of channel keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSelection {
    /// How to find the dimension
    pub role: RoleHints,
    /// Which categories to take
    pub keys: SelectionKeys,
}

/// What to extract from a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The free dimension (all its categories become rows)
    pub area: RoleHints,
    /// Pinned dimensions
    pub fixed: Vec<FixedSelection>,
    /// Output labels for the channels; empty means scalar output (or the
    /// channel keys as labels when a channel selection exists)
    pub measures: Vec<String>,
}

impl Selection {
    /// Create a selection with the given free dimension
    pub fn new(area: RoleHints) -> Self {
        Self {
            area,
            fixed: Vec::new(),
            measures: Vec::new(),
        }
    }

    /// Pin a role to a single key
    #[must_use]
    pub fn fix(mut self, role: RoleHints, key: impl Into<String>) -> Self {
        self.fixed.push(FixedSelection {
            role,
            keys: SelectionKeys::Single(key.into()),
        });
        self
    }

    /// Pin a role to a list of channel keys
    #[must_use]
    pub fn channels<I, S>(mut self, role: RoleHints, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixed.push(FixedSelection {
            role,
            keys: SelectionKeys::Channels(keys.into_iter().map(Into::into).collect()),
        });
        self
    }

    /// Set the output labels
    #[must_use]
    pub fn measures<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.measures = labels.into_iter().map(Into::into).collect();
        self
    }
}

// ============================================================================
// Output
// ============================================================================

/// One decoded cell; missing is distinct from zero
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// A value was present
    Present(f64),
    /// Out of bounds or null in the source table
    Missing,
}

impl Cell {
    /// The value, if present
    pub fn value(&self) -> Option<f64> {
        match *self {
            Self::Present(v) => Some(v),
            Self::Missing => None,
        }
    }

    /// Whether the cell is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Map a present value
    #[must_use]
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Present(v) => Self::Present(f(v)),
            Self::Missing => Self::Missing,
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Present)
    }
}

/// A labeled channel of a vector value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureValue {
    pub label: String,
    pub cell: Cell,
}

/// Value decoded for one area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecodedValue {
    /// Single unlabeled measure
    Scalar(Cell),
    /// Labeled measures in configured order
    Vector(Vec<MeasureValue>),
}

impl DecodedValue {
    /// The scalar cell, if this is a scalar
    pub fn scalar(&self) -> Option<Cell> {
        match self {
            Self::Scalar(cell) => Some(*cell),
            Self::Vector(_) => None,
        }
    }

    /// A channel by label, if this is a vector
    pub fn channel(&self, label: &str) -> Option<Cell> {
        match self {
            Self::Scalar(_) => None,
            Self::Vector(measures) => measures.iter().find(|m| m.label == label).map(|m| m.cell),
        }
    }

    /// All cells in order
    pub fn cells(&self) -> Vec<Cell> {
        match self {
            Self::Scalar(cell) => vec![*cell],
            Self::Vector(measures) => measures.iter().map(|m| m.cell).collect(),
        }
    }

    /// Whether every cell is missing
    pub fn is_missing(&self) -> bool {
        self.cells().iter().all(Cell::is_missing)
    }

    #[must_use]
    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Scalar(cell) => Self::Scalar(cell.map(f)),
            Self::Vector(measures) => Self::Vector(
                measures
                    .into_iter()
                    .map(|m| MeasureValue {
                        label: m.label,
                        cell: m.cell.map(&f),
                    })
                    .collect(),
            ),
        }
    }
}

/// One row of a decoded table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedRow {
    /// Category key of the free dimension
    pub key: String,
    /// Category label, if the table has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: DecodedValue,
}

/// Free-dimension key → value, in the free dimension's category order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedTable {
    /// Name of the dimension the rows come from
    pub area_dimension: String,
    /// Channel labels (empty for scalar tables)
    #[serde(default)]
    pub measures: Vec<String>,
    pub rows: Vec<DecodedRow>,
}

impl DecodedTable {
    /// Create a table from rows
    pub fn new(area_dimension: impl Into<String>, measures: Vec<String>, rows: Vec<DecodedRow>) -> Self {
        Self {
            area_dimension: area_dimension.into(),
            measures,
            rows,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row by key
    pub fn row(&self, key: &str) -> Option<&DecodedRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Value by key
    pub fn get(&self, key: &str) -> Option<&DecodedValue> {
        self.row(key).map(|r| &r.value)
    }

    /// Row keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.key.as_str())
    }

    /// Whether rows carry vectors rather than scalars
    pub fn is_vector(&self) -> bool {
        !self.measures.is_empty()
    }

    /// Every cell of every row, row-major
    pub fn values(&self) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .flat_map(|r| r.value.cells())
            .map(|c| c.value())
            .collect()
    }

    /// Number of rows whose cells are all missing
    pub fn missing_count(&self) -> usize {
        self.rows.iter().filter(|r| r.value.is_missing()).count()
    }

    /// Multiply every present cell; missing cells stay missing
    #[must_use]
    pub fn scaled(self, multiplier: f64) -> Self {
        if (multiplier - 1.0).abs() < f64::EPSILON {
            return self;
        }
        Self {
            rows: self
                .rows
                .into_iter()
                .map(|r| DecodedRow {
                    value: r.value.map(|v| v * multiplier),
                    ..r
                })
                .collect(),
            ..self
        }
    }

    /// `{ key: value }` object in row order, for map/chart front-ends
    pub fn to_value_map(&self) -> JsonObject {
        self.rows
            .iter()
            .map(|r| {
                let value = match &r.value {
                    DecodedValue::Scalar(cell) => cell_json(*cell),
                    DecodedValue::Vector(measures) => JsonValue::Object(
                        measures
                            .iter()
                            .map(|m| (m.label.clone(), cell_json(m.cell)))
                            .collect(),
                    ),
                };
                (r.key.clone(), value)
            })
            .collect()
    }
}

fn cell_json(cell: Cell) -> JsonValue {
    cell.value()
        .and_then(serde_json::Number::from_f64)
        .map_or(JsonValue::Null, JsonValue::Number)
}
