//! Loader types
//!
//! Declarative dataset catalog types for YAML parsing.

use crate::decode::{
    DecodedRow, DecodedTable, DecodedValue, MeasureValue, PositionalFallback, RoleHints,
    ScalePolicy, Selection, SelectionKeys,
};
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::query::PxQuery;
use crate::types::{BackoffType, Method, ResponseFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// ============================================================================
// Catalog Definition
// ============================================================================

/// Top-level catalog: one PxWeb database and the datasets read from it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogDefinition {
    /// Catalog name
    pub name: String,
    /// Catalog version
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Base URL every dataset path is appended to
    pub base_url: String,
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpDefinition,
    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Dataset definitions
    pub datasets: Vec<DatasetDefinition>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl CatalogDefinition {
    /// Dataset by name
    pub fn dataset(&self, name: &str) -> Result<&DatasetDefinition> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| Error::unknown_dataset(name))
    }

    /// Dataset names in catalog order
    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.name.as_str()).collect()
    }

    /// Full URL of a dataset's table
    pub fn table_url(&self, dataset: &DatasetDefinition) -> String {
        if dataset.path.starts_with("http://") || dataset.path.starts_with("https://") {
            return dataset.path.clone();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            dataset.path.trim_start_matches('/')
        )
    }

    /// HTTP client configuration for this catalog
    pub fn client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.backoff,
                Duration::from_millis(self.http.initial_backoff_ms),
                Duration::from_millis(self.http.max_backoff_ms),
            );

        builder = match self.http.rate_limit {
            Some(limit) => builder.rate_limit(limit),
            None => builder.no_rate_limit(),
        };

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

// ============================================================================
// HTTP Definition
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpDefinition {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub backoff: BackoffType,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Token bucket; `null` disables rate limiting
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpDefinition {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            rate_limit: default_rate_limit(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::statfin())
}

// ============================================================================
// Dataset Definition
// ============================================================================

/// One table and how to decode it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatasetDefinition {
    /// Dataset name (unique within the catalog)
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Table path relative to the catalog base URL, or an absolute URL
    pub path: String,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub format: ResponseFormat,
    /// Variable filters sent in the POST body
    #[serde(default)]
    pub query: Vec<QueryItemDefinition>,
    /// The free dimension
    #[serde(default = "default_area")]
    pub area: RoleDefinition,
    /// Pinned dimensions
    #[serde(default)]
    pub fixed: Vec<FixedDefinition>,
    /// Output labels
    #[serde(default)]
    pub measures: Vec<String>,
    #[serde(default)]
    pub scale: ScalePolicy,
    /// Static data served when the live table cannot be used
    #[serde(default)]
    pub fallback: Option<FallbackDefinition>,
}

fn default_area() -> RoleDefinition {
    let hints = RoleHints::area();
    RoleDefinition {
        role: hints.role,
        hints: hints.hints,
        fallback: Some(PositionalFallback::First),
    }
}

impl DatasetDefinition {
    /// PxWeb query body
    pub fn px_query(&self) -> PxQuery {
        self.query
            .iter()
            .fold(PxQuery::new().format(self.format), |query, item| {
                query.filter(&item.code, &item.filter, item.values.iter().cloned())
            })
    }

    /// Decoder selection
    pub fn selection(&self) -> Result<Selection> {
        let mut selection = Selection::new(self.area.to_hints()).measures(self.measures.iter().cloned());
        for fixed in &self.fixed {
            let role = fixed.to_hints();
            selection = match fixed.selection_keys(&self.name)? {
                SelectionKeys::Single(key) => selection.fix(role, key),
                SelectionKeys::Channels(keys) => selection.channels(role, keys),
            };
        }
        Ok(selection)
    }

    /// Channel keys, if any fixed role selects several keys
    pub fn channel_keys(&self) -> Option<&[String]> {
        self.fixed.iter().find_map(|f| f.keys.as_deref())
    }

    /// Labels of decoded vectors; empty for scalar datasets
    pub fn output_labels(&self) -> Vec<String> {
        if !self.measures.is_empty() {
            return self.measures.clone();
        }
        self.channel_keys().map(<[String]>::to_vec).unwrap_or_default()
    }

    /// Build the fallback table, if one is configured
    pub fn fallback_table(&self) -> Result<Option<DecodedTable>> {
        self.fallback
            .as_ref()
            .map(|fallback| fallback.to_table(self))
            .transpose()
    }
}

/// One query variable filter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueryItemDefinition {
    /// Variable code
    pub code: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    pub values: Vec<String>,
}

fn default_filter() -> String {
    "item".to_string()
}

/// Role name plus the hints that locate its dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RoleDefinition {
    #[serde(default = "default_area_role")]
    pub role: String,
    pub hints: Vec<String>,
    #[serde(default)]
    pub fallback: Option<PositionalFallback>,
}

fn default_area_role() -> String {
    "area".to_string()
}

impl RoleDefinition {
    /// Decoder role hints
    pub fn to_hints(&self) -> RoleHints {
        RoleHints {
            role: self.role.clone(),
            hints: self.hints.clone(),
            fallback: self.fallback,
        }
    }
}

/// A pinned dimension: exactly one of `key` or `keys`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FixedDefinition {
    pub role: String,
    pub hints: Vec<String>,
    #[serde(default)]
    pub fallback: Option<PositionalFallback>,
    /// Single key
    #[serde(default)]
    pub key: Option<String>,
    /// Channel keys, in output order
    #[serde(default)]
    pub keys: Option<Vec<String>>,
}

impl FixedDefinition {
    /// Decoder role hints
    pub fn to_hints(&self) -> RoleHints {
        RoleHints {
            role: self.role.clone(),
            hints: self.hints.clone(),
            fallback: self.fallback,
        }
    }

    /// Configured keys
    pub fn selection_keys(&self, dataset: &str) -> Result<SelectionKeys> {
        match (&self.key, &self.keys) {
            (Some(key), None) => Ok(SelectionKeys::Single(key.clone())),
            (None, Some(keys)) => Ok(SelectionKeys::Channels(keys.clone())),
            _ => Err(Error::invalid_value(
                format!("datasets.{dataset}.fixed.{}", self.role),
                "exactly one of 'key' or 'keys' is required",
            )),
        }
    }
}

// ============================================================================
// Fallback Definition
// ============================================================================

/// Deterministic stand-in rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackDefinition {
    /// Area dimension id reported by the live table, e.g. `Alue`
    #[serde(default)]
    pub area_dimension: Option<String>,
    pub rows: Vec<FallbackRow>,
}

/// One fallback row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackRow {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    pub value: FallbackValue,
}

/// Scalar or one value per output label; `null` is missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FallbackValue {
    Scalar(Option<f64>),
    Vector(Vec<Option<f64>>),
}

impl FallbackDefinition {
    /// Build a decoded table shaped like the dataset's live output
    pub fn to_table(&self, dataset: &DatasetDefinition) -> Result<DecodedTable> {
        let labels = dataset.output_labels();
        let area = self
            .area_dimension
            .clone()
            .or_else(|| dataset.area.hints.first().cloned())
            .unwrap_or_else(|| dataset.area.role.clone());

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let value = match (&row.value, labels.is_empty()) {
                    (FallbackValue::Scalar(v), true) => DecodedValue::Scalar((*v).into()),
                    (FallbackValue::Vector(values), false) if values.len() == labels.len() => {
                        DecodedValue::Vector(
                            labels
                                .iter()
                                .zip(values)
                                .map(|(label, v)| MeasureValue {
                                    label: label.clone(),
                                    cell: (*v).into(),
                                })
                                .collect(),
                        )
                    }
                    _ => {
                        return Err(Error::invalid_value(
                            format!("datasets.{}.fallback.{}", dataset.name, row.key),
                            format!("value does not match the {} output labels", labels.len()),
                        ))
                    }
                };
                Ok(DecodedRow {
                    key: row.key.clone(),
                    label: row.label.clone(),
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DecodedTable::new(area, labels, rows))
    }
}
