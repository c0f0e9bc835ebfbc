//! YAML parser for dataset catalogs
//!
//! Parses and validates catalog YAML files.
//! Supports both built-in catalogs (by name) and custom YAML files (by path).

use crate::catalogs;
use crate::decode::ScalePolicy;
use crate::error::{Error, Result};
use crate::loader::types::{CatalogDefinition, DatasetDefinition, FixedDefinition};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Load a catalog from a built-in name or a file path
///
/// ```ignore
/// let catalog = load_catalog("statfin")?;
/// let catalog = load_catalog("./my-catalog.yaml")?;
/// ```
pub fn load_catalog(path: impl AsRef<Path>) -> Result<CatalogDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = catalogs::get_builtin(&path_str) {
            return load_catalog_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!(
                "Catalog '{}' not found. Built-in catalogs: {}. Or provide a path to a YAML file.",
                path.display(),
                catalogs::list_builtin().join(", ")
            ))
        } else {
            Error::config(format!(
                "Failed to read catalog file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_catalog_from_str(&content)
}

/// Load a catalog from a YAML string
pub fn load_catalog_from_str(yaml: &str) -> Result<CatalogDefinition> {
    let catalog: CatalogDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse catalog YAML: {e}")))?;

    validate_catalog(&catalog)?;
    debug!(
        catalog = %catalog.name,
        datasets = catalog.datasets.len(),
        "Loaded catalog"
    );
    Ok(catalog)
}

/// Validate a catalog definition
pub fn validate_catalog(catalog: &CatalogDefinition) -> Result<()> {
    if catalog.name.is_empty() {
        return Err(Error::config("Catalog name cannot be empty"));
    }

    if catalog.base_url.is_empty() {
        return Err(Error::config("Catalog base_url cannot be empty"));
    }
    Url::parse(&catalog.base_url)?;

    if catalog.datasets.is_empty() {
        return Err(Error::config("Catalog must have at least one dataset"));
    }

    let mut names = HashSet::new();
    for dataset in &catalog.datasets {
        if !names.insert(dataset.name.as_str()) {
            return Err(Error::config(format!(
                "Duplicate dataset name '{}'",
                dataset.name
            )));
        }
        validate_dataset(dataset)?;
    }

    Ok(())
}

/// Validate a dataset definition
fn validate_dataset(dataset: &DatasetDefinition) -> Result<()> {
    let name = &dataset.name;
    if name.is_empty() {
        return Err(Error::config("Dataset name cannot be empty"));
    }

    if dataset.path.is_empty() {
        return Err(Error::config(format!("Dataset '{name}' path cannot be empty")));
    }

    if dataset.path.starts_with("http://") || dataset.path.starts_with("https://") {
        Url::parse(&dataset.path)?;
    }

    if let Some(item) = dataset.query.iter().find(|q| q.code.is_empty()) {
        return Err(Error::invalid_value(
            format!("datasets.{name}.query"),
            format!("query item with filter '{}' has no code", item.filter),
        ));
    }

    if dataset.area.hints.is_empty() && dataset.area.fallback.is_none() {
        return Err(Error::invalid_value(
            format!("datasets.{name}.area"),
            "hints cannot be empty without a positional fallback",
        ));
    }

    let mut channel_len = None;
    for fixed in &dataset.fixed {
        validate_fixed(name, fixed)?;
        if let Some(keys) = &fixed.keys {
            match channel_len {
                Some(len) if len != keys.len() => {
                    return Err(Error::invalid_value(
                        format!("datasets.{name}.fixed.{}", fixed.role),
                        format!("{} channel keys, another role has {len}", keys.len()),
                    ));
                }
                _ => channel_len = Some(keys.len()),
            }
        }
    }

    let measures = dataset.measures.len();
    let measures_ok = match channel_len {
        Some(len) => measures == 0 || measures == len,
        None => measures <= 1,
    };
    if !measures_ok {
        return Err(Error::invalid_value(
            format!("datasets.{name}.measures"),
            format!(
                "{measures} labels for {} channels",
                channel_len.unwrap_or(0)
            ),
        ));
    }

    let labels = dataset.output_labels();
    let mut seen = HashSet::with_capacity(labels.len());
    if let Some(dup) = labels.iter().find(|l| !seen.insert(l.as_str())) {
        return Err(Error::invalid_value(
            format!("datasets.{name}.measures"),
            format!("duplicate output label '{dup}'"),
        ));
    }

    if let ScalePolicy::Fixed { multiplier } = dataset.scale {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(Error::invalid_value(
                format!("datasets.{name}.scale"),
                format!("multiplier must be positive, got {multiplier}"),
            ));
        }
    }

    // Fallback rows must match the output labels
    dataset.fallback_table()?;

    Ok(())
}

fn validate_fixed(dataset: &str, fixed: &FixedDefinition) -> Result<()> {
    let field = || format!("datasets.{dataset}.fixed.{}", fixed.role);

    if fixed.role.is_empty() {
        return Err(Error::missing_field(format!("datasets.{dataset}.fixed.role")));
    }
    if fixed.hints.is_empty() && fixed.fallback.is_none() {
        return Err(Error::invalid_value(
            field(),
            "hints cannot be empty without a positional fallback",
        ));
    }
    if fixed.hints.iter().any(|h| h.trim().is_empty()) {
        return Err(Error::invalid_value(field(), "hints cannot be blank"));
    }

    let keys = fixed.selection_keys(dataset)?;
    if keys.keys().is_empty() {
        return Err(Error::invalid_value(field(), "keys cannot be empty"));
    }

    Ok(())
}
