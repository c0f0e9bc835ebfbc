//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::server::{serve, ServerConfig};
use crate::engine::{DatasetLoader, LoadOptions, LoadedDataset};
use crate::error::{Error, Result, ResultExt};
use crate::loader::{load_catalog, CatalogDefinition};
use crate::stats;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Datasets => self.datasets(),
            Commands::Validate => self.validate(),
            Commands::Metadata {
                dataset,
                find,
                variable,
            } => {
                self.metadata(dataset, find.as_deref(), variable.as_deref())
                    .await
            }
            Commands::Fetch { datasets, offline } => self.fetch(datasets, *offline).await,
            Commands::Decode { dataset, input } => self.decode(dataset, input),
            Commands::Serve { port } => {
                let config = ServerConfig {
                    loader: self.loader()?,
                };
                serve(config, *port).await
            }
        }
    }

    /// Load the catalog
    fn load_catalog(&self) -> Result<CatalogDefinition> {
        load_catalog(&self.cli.catalog)
    }

    /// Build a loader for the catalog
    fn loader(&self) -> Result<DatasetLoader> {
        DatasetLoader::new(self.load_catalog()?)
    }

    /// List catalog datasets
    fn datasets(&self) -> Result<()> {
        let catalog = self.load_catalog()?;
        self.output_message(&json!({
            "type": "DATASETS",
            "catalog": catalog.name,
            "datasets": dataset_summaries(&catalog)
        }));
        Ok(())
    }

    /// Validate the catalog
    fn validate(&self) -> Result<()> {
        let catalog = self.load_catalog()?;

        for dataset in &catalog.datasets {
            dataset.selection()?;
        }

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Catalog '{}' v{} is valid with {} datasets",
                    catalog.name,
                    catalog.version,
                    catalog.datasets.len()
                )
            }
        }));

        Ok(())
    }

    /// Show table metadata, or look up one value code
    async fn metadata(
        &self,
        dataset: &str,
        find: Option<&str>,
        variable: Option<&str>,
    ) -> Result<()> {
        let loader = self.loader()?;
        let metadata = loader
            .metadata(dataset)
            .await
            .with_context(|| format!("Failed to fetch metadata for dataset '{dataset}'"))?;

        let (Some(text), Some(variable)) = (find, variable) else {
            self.output_message(&json!({
                "type": "METADATA",
                "dataset": dataset,
                "metadata": metadata
            }));
            return Ok(());
        };

        let (code, label) = metadata.find_value(variable, text).ok_or_else(|| {
            Error::Other(format!(
                "No value matching '{text}' in variable '{variable}' of dataset '{dataset}'"
            ))
        })?;

        self.output_message(&json!({
            "type": "VALUE",
            "dataset": dataset,
            "variable": variable,
            "code": code,
            "text": label
        }));
        Ok(())
    }

    /// Load datasets and print them
    async fn fetch(&self, names: &[String], offline: bool) -> Result<()> {
        let options = LoadOptions { offline };
        let loader = self.loader()?.with_options(options);
        let names: Vec<String> = if names.is_empty() {
            loader
                .catalog()
                .dataset_names()
                .into_iter()
                .map(String::from)
                .collect()
        } else {
            names.to_vec()
        };

        let start = Instant::now();
        let results = loader.load_all(&names).await;
        let mut failed = 0;

        for (name, result) in results {
            match result {
                Ok(loaded) => self.output_dataset(&loaded),
                Err(e) => {
                    failed += 1;
                    self.output_message(&json!({
                        "type": "LOG",
                        "log": {
                            "level": "ERROR",
                            "message": format!("Dataset '{name}' failed: {e}")
                        }
                    }));
                }
            }
        }

        info!(
            datasets = names.len(),
            failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetch complete"
        );

        if failed > 0 {
            return Err(Error::Other(format!(
                "{failed} of {} datasets failed",
                names.len()
            )));
        }
        Ok(())
    }

    /// Decode a saved response body
    fn decode(&self, dataset: &str, input: &Path) -> Result<()> {
        let body = fs::read_to_string(input).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: input.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;

        let loaded = self.loader()?.decode_body(dataset, &body)?;
        self.output_dataset(&loaded);
        Ok(())
    }

    fn output_dataset(&self, loaded: &LoadedDataset) {
        self.output_message(&dataset_message(loaded));
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Short description of every dataset in a catalog
pub(crate) fn dataset_summaries(catalog: &CatalogDefinition) -> Vec<Value> {
    catalog
        .datasets
        .iter()
        .map(|d| {
            json!({
                "name": d.name,
                "title": d.title,
                "description": d.description,
                "url": catalog.table_url(d),
                "measures": d.output_labels(),
                "fallback": d.fallback.is_some()
            })
        })
        .collect()
}

/// `DATASET` message: the loaded table, a key → value map and summary statistics
pub(crate) fn dataset_message(loaded: &LoadedDataset) -> Value {
    let summary = if loaded.table.is_vector() {
        let means: serde_json::Map<String, Value> = stats::channel_means(&loaded.table)
            .into_iter()
            .map(|(label, mean)| (label, json!(mean)))
            .collect();
        json!({ "channel_means": means })
    } else {
        json!({ "mean": stats::mean(&loaded.table) })
    };

    json!({
        "type": "DATASET",
        "dataset": loaded,
        "values": loaded.table.to_value_map(),
        "summary": summary
    })
}
