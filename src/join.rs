//! Joining decoded rows to geographic features
//!
//! StatFin keys municipalities as `KU091`, while map data uses `091`, `91`
//! or only a name. [`AreaKeyIndex`] tries progressively looser matches.

use crate::decode::{DecodedRow, DecodedTable};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Optional alphabetic prefix followed by digits, e.g. `KU091`
static AREA_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z]*(\d+)\s*$").expect("area code pattern"));

/// Width of a zero-padded municipality code
const CODE_WIDTH: usize = 3;

/// How a feature was matched to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// Code equals the row key
    Exact,
    /// Digits equal after dropping an alphabetic prefix (`091` ~ `KU091`)
    Normalized,
    /// Digits equal after dropping leading zeros (`91` ~ `KU091`)
    ZeroPadded,
    /// Case-insensitive label match
    Name,
}

/// Digits of a code with any alphabetic prefix removed
fn code_digits(code: &str) -> Option<&str> {
    AREA_CODE
        .captures(code)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Digits padded to the municipality code width, leading zeros beyond it dropped
fn padded(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    format!("{:0>width$}", trimmed, width = CODE_WIDTH)
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Lookup structure over the rows of one decoded table
#[derive(Debug)]
pub struct AreaKeyIndex<'a> {
    table: &'a DecodedTable,
    exact: HashMap<&'a str, usize>,
    digits: HashMap<&'a str, usize>,
    padded: HashMap<String, usize>,
    names: HashMap<String, usize>,
}

impl<'a> AreaKeyIndex<'a> {
    /// Index a table's rows; the first row wins on duplicate keys
    pub fn from_table(table: &'a DecodedTable) -> Self {
        let mut exact = HashMap::new();
        let mut digits = HashMap::new();
        let mut padded_keys = HashMap::new();
        let mut names = HashMap::new();

        for (i, row) in table.rows.iter().enumerate() {
            exact.entry(row.key.as_str()).or_insert(i);
            if let Some(d) = code_digits(&row.key) {
                digits.entry(d).or_insert(i);
                padded_keys.entry(padded(d)).or_insert(i);
            }
            if let Some(label) = &row.label {
                names.entry(name_key(label)).or_insert(i);
            }
        }

        Self {
            table,
            exact,
            digits,
            padded: padded_keys,
            names,
        }
    }

    /// Find the row for a feature code and/or name
    pub fn lookup(&self, code: &str, name: Option<&str>) -> Option<(JoinStrategy, &'a DecodedRow)> {
        let rows = &self.table.rows;

        if let Some(&i) = self.exact.get(code) {
            return Some((JoinStrategy::Exact, &rows[i]));
        }

        if let Some(d) = code_digits(code) {
            if let Some(&i) = self.digits.get(d) {
                return Some((JoinStrategy::Normalized, &rows[i]));
            }
            if let Some(&i) = self.padded.get(&padded(d)) {
                return Some((JoinStrategy::ZeroPadded, &rows[i]));
            }
        }

        let name = name?;
        self.names
            .get(&name_key(name))
            .map(|&i| (JoinStrategy::Name, &rows[i]))
    }

    /// Join many features, keeping unmatched ones as `None`
    pub fn join<'f, I>(&self, features: I) -> Vec<(&'f str, Option<(JoinStrategy, &'a DecodedRow)>)>
    where
        I: IntoIterator<Item = (&'f str, Option<&'f str>)>,
    {
        features
            .into_iter()
            .map(|(code, name)| (code, self.lookup(code, name)))
            .collect()
    }
}
