//! Dataset loading engine
//!
//! Fetch, normalize, decode and scale catalog datasets.
//!
//! # Overview
//!
//! The engine module provides:
//! - `TableSource` - Where raw tables come from (HTTP by default)
//! - `FallbackProvider` - What to serve when the live table cannot be used
//! - `DatasetLoader` - Orchestrates both for one catalog

mod types;

pub use types::{LoadOptions, LoadedDataset, Origin};

use crate::decode::{apply_scale, DecodedTable, TableDecoder};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::loader::{CatalogDefinition, DatasetDefinition};
use crate::metadata::TableMetadata;
use crate::table::RawTable;
use crate::types::Method;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Table Sources
// ============================================================================

/// Source of raw tables and table metadata
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Fetch the table of a dataset
    async fn fetch(&self, url: &str, dataset: &DatasetDefinition) -> Result<RawTable>;

    /// Fetch the metadata of a table
    async fn metadata(&self, url: &str) -> Result<TableMetadata>;
}

/// PxWeb over HTTP
#[derive(Debug, Clone)]
pub struct HttpTableSource {
    client: HttpClient,
}

impl HttpTableSource {
    /// Create a source using the given client
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TableSource for HttpTableSource {
    async fn fetch(&self, url: &str, dataset: &DatasetDefinition) -> Result<RawTable> {
        let config = match dataset.method {
            Method::POST => RequestConfig::new().json(dataset.px_query().to_json()),
            Method::GET => RequestConfig::new(),
        };

        let response = self
            .client
            .request(dataset.method.into(), url, config)
            .await?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::decode(format!("Failed to read response body: {e}")))?;

        let raw = RawTable::parse(&body)?;
        debug!(dataset = %dataset.name, kind = raw.kind(), bytes = body.len(), "Fetched table");
        Ok(raw)
    }

    async fn metadata(&self, url: &str) -> Result<TableMetadata> {
        self.client.get_json(url).await
    }
}

// ============================================================================
// Fallback Providers
// ============================================================================

/// Stand-in data for a dataset whose live table cannot be used
pub trait FallbackProvider: Send + Sync {
    /// Fallback table, or `None` when the dataset has none
    fn fallback(&self, dataset: &DatasetDefinition) -> Result<Option<DecodedTable>>;
}

/// Serves the static rows configured in the catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogFallback;

impl FallbackProvider for CatalogFallback {
    fn fallback(&self, dataset: &DatasetDefinition) -> Result<Option<DecodedTable>> {
        dataset.fallback_table()
    }
}

/// Never falls back; errors propagate
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl FallbackProvider for NoFallback {
    fn fallback(&self, _dataset: &DatasetDefinition) -> Result<Option<DecodedTable>> {
        Ok(None)
    }
}

// ============================================================================
// Dataset Loader
// ============================================================================

/// Loads catalog datasets through a table source, falling back when needed
#[derive(Clone)]
pub struct DatasetLoader {
    catalog: Arc<CatalogDefinition>,
    source: Arc<dyn TableSource>,
    fallback: Arc<dyn FallbackProvider>,
    options: LoadOptions,
}

impl DatasetLoader {
    /// Create a loader fetching over HTTP with the catalog's client settings
    pub fn new(catalog: CatalogDefinition) -> Result<Self> {
        let client = HttpClient::with_config(catalog.client_config())?;
        Ok(Self::with_source(catalog, Arc::new(HttpTableSource::new(client))))
    }

    /// Create a loader with a custom table source
    pub fn with_source(catalog: CatalogDefinition, source: Arc<dyn TableSource>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            source,
            fallback: Arc::new(CatalogFallback),
            options: LoadOptions::default(),
        }
    }

    /// Replace the fallback provider
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackProvider>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set load options
    #[must_use]
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// The catalog
    pub fn catalog(&self) -> &CatalogDefinition {
        &self.catalog
    }

    /// The default load options
    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Load one dataset with the default options
    pub async fn load(&self, name: &str) -> Result<LoadedDataset> {
        self.load_with(name, self.options).await
    }

    /// Load one dataset
    ///
    /// Any fetch or decode failure is replaced by the dataset's fallback when
    /// the provider has one; otherwise the error is returned. An unknown
    /// dataset name is always an error.
    pub async fn load_with(&self, name: &str, options: LoadOptions) -> Result<LoadedDataset> {
        let dataset = self.catalog.dataset(name)?;

        if options.offline {
            info!(dataset = name, "Offline, serving fallback data");
            return match self.fallback.fallback(dataset)? {
                Some(table) => Ok(fallback_dataset(dataset, table, "offline")),
                None => Err(Error::config(format!(
                    "Dataset '{name}' has no fallback data for offline use"
                ))),
            };
        }

        match self.load_live(dataset).await {
            Ok(loaded) => Ok(loaded),
            Err(error) => match self.fallback.fallback(dataset)? {
                Some(table) => {
                    warn!(dataset = name, error = %error, "Live table failed, using fallback");
                    Ok(fallback_dataset(dataset, table, error.to_string()))
                }
                None => Err(error),
            },
        }
    }

    /// Load several datasets concurrently, in the given order
    pub async fn load_all<S: AsRef<str>>(&self, names: &[S]) -> Vec<(String, Result<LoadedDataset>)> {
        let loads = names.iter().map(|name| async move {
            let name = name.as_ref();
            (name.to_string(), self.load(name).await)
        });
        join_all(loads).await
    }

    /// Decode a response body that was saved or fetched elsewhere
    pub fn decode_body(&self, name: &str, body: &str) -> Result<LoadedDataset> {
        let dataset = self.catalog.dataset(name)?;
        let raw = RawTable::parse(body)?;
        decode_raw(dataset, raw, Origin::Local)
    }

    /// Fetch a dataset's table metadata
    pub async fn metadata(&self, name: &str) -> Result<TableMetadata> {
        let dataset = self.catalog.dataset(name)?;
        let url = self.catalog.table_url(dataset);
        self.source.metadata(&url).await
    }

    async fn load_live(&self, dataset: &DatasetDefinition) -> Result<LoadedDataset> {
        let url = self.catalog.table_url(dataset);
        let raw = self.source.fetch(&url, dataset).await?;
        decode_raw(dataset, raw, Origin::Live)
    }
}

impl std::fmt::Debug for DatasetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetLoader")
            .field("catalog", &self.catalog.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn decode_raw(dataset: &DatasetDefinition, raw: RawTable, origin: Origin) -> Result<LoadedDataset> {
    let response = raw.normalize()?;
    let decoder = TableDecoder::new(dataset.selection()?);
    let decoded = decoder.decode(&response)?;
    let (table, multiplier) = apply_scale(decoded, &dataset.scale);

    debug!(
        dataset = %dataset.name,
        rows = table.len(),
        missing = table.missing_count(),
        multiplier,
        "Loaded dataset"
    );

    Ok(LoadedDataset {
        name: dataset.name.clone(),
        title: dataset.title.clone(),
        origin,
        multiplier,
        info: Some(response.info),
        table,
    })
}

fn fallback_dataset(
    dataset: &DatasetDefinition,
    table: DecodedTable,
    reason: impl Into<String>,
) -> LoadedDataset {
    LoadedDataset {
        name: dataset.name.clone(),
        title: dataset.title.clone(),
        origin: Origin::fallback(reason),
        multiplier: 1.0,
        info: None,
        table,
    }
}
