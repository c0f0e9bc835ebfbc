//! Scale correction
//!
//! Some StatFin tables report thousands where similar tables report raw
//! counts. Decoding never guesses; a dataset opts into a [`ScalePolicy`] and
//! the multiplier is applied as a separate step.

use super::types::DecodedTable;
use serde::{Deserialize, Serialize};

/// Default bound below which `InferThousands` assumes values are in thousands
pub const DEFAULT_THOUSANDS_THRESHOLD: f64 = 1000.0;

/// Per-dataset scale policy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalePolicy {
    /// Values are used as reported
    #[default]
    None,
    /// Always multiply by a fixed factor
    Fixed { multiplier: f64 },
    /// Multiply by 1000 when every present value is below the threshold
    InferThousands {
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
}

fn default_threshold() -> f64 {
    DEFAULT_THOUSANDS_THRESHOLD
}

impl ScalePolicy {
    /// Multiplier this policy picks for a decoded table
    pub fn multiplier_for(&self, table: &DecodedTable) -> f64 {
        infer_scale(&table.values(), self)
    }
}

/// Multiplier for a set of cells under a policy
///
/// `InferThousands` returns 1000 only when at least one value is present and
/// every present value is strictly below the threshold in absolute value.
pub fn infer_scale(values: &[Option<f64>], policy: &ScalePolicy) -> f64 {
    match *policy {
        ScalePolicy::None => 1.0,
        ScalePolicy::Fixed { multiplier } => multiplier,
        ScalePolicy::InferThousands { threshold } => {
            let mut present = values.iter().flatten().peekable();
            if present.peek().is_none() {
                return 1.0;
            }
            if present.all(|v| v.abs() < threshold) {
                1000.0
            } else {
                1.0
            }
        }
    }
}

/// Apply a policy to a decoded table, returning the table and the multiplier used
pub fn apply_scale(table: DecodedTable, policy: &ScalePolicy) -> (DecodedTable, f64) {
    let multiplier = policy.multiplier_for(&table);
    (table.scaled(multiplier), multiplier)
}
