//! Table decoder
//!
//! Turns a [`TabularResponse`] plus a [`Selection`] into a [`DecodedTable`]
//! by stride arithmetic over the flat value array.

use super::types::{
    Cell, DecodedRow, DecodedTable, DecodedValue, MeasureValue, RoleHints, Selection,
    SelectionKeys,
};
use crate::error::{Error, Result};
use crate::table::{Dimension, TabularResponse};
use std::collections::HashSet;
use tracing::debug;

/// Find the dimension playing a role
///
/// Hints are tried in priority order, each against every dimension name
/// (case-insensitive substring). The positional fallback applies only when no
/// hint matches.
pub fn resolve_dimension(dimensions: &[Dimension], role: &RoleHints) -> Result<usize> {
    for hint in &role.hints {
        let hint = hint.to_lowercase();
        if hint.is_empty() {
            continue;
        }
        if let Some(pos) = dimensions
            .iter()
            .position(|d| d.name().to_lowercase().contains(&hint))
        {
            return Ok(pos);
        }
    }

    role.fallback
        .and_then(|f| f.resolve(dimensions.len()))
        .ok_or_else(|| Error::missing_dimension(&role.role))
}

/// Flat-array span of one index step per dimension; the last stride is 1
pub fn compute_strides(dimensions: &[Dimension]) -> Vec<usize> {
    let mut strides = vec![1usize; dimensions.len()];
    for i in (0..dimensions.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1].saturating_mul(dimensions[i + 1].size());
    }
    strides
}

/// `sum(chosen[d] * strides[d])`
///
/// Returns `None` on a length mismatch or overflow; callers treat that like
/// an out-of-bounds index.
pub fn flat_index(strides: &[usize], chosen: &[usize]) -> Option<usize> {
    if strides.len() != chosen.len() {
        return None;
    }
    strides
        .iter()
        .zip(chosen)
        .try_fold(0usize, |acc, (&stride, &index)| {
            acc.checked_add(index.checked_mul(stride)?)
        })
}

/// Decode a table with the given selection
pub fn decode(response: &TabularResponse, selection: &Selection) -> Result<DecodedTable> {
    TableDecoder::new(selection.clone()).decode(response)
}

/// A fixed dimension with its resolved category indices
struct ResolvedFixed {
    position: usize,
    indices: Vec<usize>,
    channels: bool,
}

impl ResolvedFixed {
    fn index_for(&self, channel: usize) -> usize {
        if self.channels {
            self.indices[channel]
        } else {
            self.indices[0]
        }
    }
}

/// Decoder bound to one selection, reusable across tables of the same dataset
#[derive(Debug, Clone)]
pub struct TableDecoder {
    selection: Selection,
}

impl TableDecoder {
    /// Create a decoder for a selection
    pub fn new(selection: Selection) -> Self {
        Self { selection }
    }

    /// The selection this decoder applies
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Decode a table
    ///
    /// Structural problems (unresolvable role, unknown key, conflicting
    /// configuration) abort the whole decode. Out-of-bounds or null cells
    /// become [`Cell::Missing`].
    pub fn decode(&self, response: &TabularResponse) -> Result<DecodedTable> {
        let dims = &response.dimensions;
        let area_pos = resolve_dimension(dims, &self.selection.area)?;

        let mut claimed: Vec<Option<&str>> = vec![None; dims.len()];
        claimed[area_pos] = Some(self.selection.area.role.as_str());

        let mut fixed = Vec::with_capacity(self.selection.fixed.len());
        for selection in &self.selection.fixed {
            let role = selection.role.role.as_str();
            let position = resolve_dimension(dims, &selection.role)?;
            let dim = &dims[position];

            if let Some(other) = claimed[position] {
                return Err(Error::config(format!(
                    "roles '{other}' and '{role}' both resolve to dimension '{}'",
                    dim.name()
                )));
            }
            claimed[position] = Some(role);

            let keys = selection.keys.keys();
            if keys.is_empty() {
                return Err(Error::config(format!("role '{role}' selects no keys")));
            }
            let indices = keys
                .iter()
                .map(|key| {
                    dim.index_of(key)
                        .ok_or_else(|| Error::unknown_key(role, dim.name(), key))
                })
                .collect::<Result<Vec<_>>>()?;

            fixed.push(ResolvedFixed {
                position,
                indices,
                channels: matches!(selection.keys, SelectionKeys::Channels(_)),
            });
        }

        let labels = self.channel_labels()?;
        let strides = compute_strides(dims);
        let area = &dims[area_pos];
        let channel_count = labels.as_ref().map_or(1, Vec::len);

        let mut chosen = vec![0usize; dims.len()];
        let mut rows = Vec::with_capacity(area.size());

        for category in area.categories() {
            chosen[area_pos] = category.index;

            let mut cells = Vec::with_capacity(channel_count);
            for channel in 0..channel_count {
                for f in &fixed {
                    chosen[f.position] = f.index_for(channel);
                }
                let cell: Cell = flat_index(&strides, &chosen)
                    .and_then(|i| response.value_at(i))
                    .into();
                cells.push(cell);
            }

            let value = match &labels {
                None => DecodedValue::Scalar(cells[0]),
                Some(labels) => DecodedValue::Vector(
                    labels
                        .iter()
                        .zip(cells)
                        .map(|(label, cell)| MeasureValue {
                            label: label.clone(),
                            cell,
                        })
                        .collect(),
                ),
            };

            rows.push(DecodedRow {
                key: category.key.clone(),
                label: category.label.clone(),
                value,
            });
        }

        let table = DecodedTable::new(area.name(), labels.unwrap_or_default(), rows);
        debug!(
            area = area.name(),
            rows = table.len(),
            missing = table.missing_count(),
            "Decoded table"
        );
        Ok(table)
    }

    /// Output labels, or `None` for scalar output
    fn channel_labels(&self) -> Result<Option<Vec<String>>> {
        let mut channel_keys: Option<&[String]> = None;
        for selection in &self.selection.fixed {
            if let SelectionKeys::Channels(keys) = &selection.keys {
                match channel_keys {
                    Some(existing) if existing.len() != keys.len() => {
                        return Err(Error::config(format!(
                            "channel selections disagree in length ({} vs {})",
                            existing.len(),
                            keys.len()
                        )));
                    }
                    Some(_) => {}
                    None => channel_keys = Some(keys),
                }
            }
        }

        let measures = &self.selection.measures;
        let labels = match channel_keys {
            Some(keys) if measures.is_empty() => Ok(Some(keys.to_vec())),
            Some(keys) if measures.len() == keys.len() => Ok(Some(measures.clone())),
            Some(keys) => Err(Error::config(format!(
                "{} measure labels for {} channel keys",
                measures.len(),
                keys.len()
            ))),
            None if measures.len() <= 1 => Ok((!measures.is_empty()).then(|| measures.clone())),
            None => Err(Error::config(format!(
                "{} measure labels but no channel selection",
                measures.len()
            ))),
        }?;

        if let Some(labels) = &labels {
            let mut seen = HashSet::with_capacity(labels.len());
            if let Some(dup) = labels.iter().find(|l| !seen.insert(l.as_str())) {
                return Err(Error::config(format!("duplicate output label '{dup}'")));
            }
        }
        Ok(labels)
    }
}
