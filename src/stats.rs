//! Summary statistics over decoded tables
//!
//! Country-wide averages, per-channel means, the leading channel of a vector
//! (e.g. the party with the largest vote share) and a naive next-period
//! projection for time series.

use crate::decode::{Cell, DecodedTable, DecodedValue};

fn average(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Mean of the present scalar cells; vector rows are ignored
pub fn mean(table: &DecodedTable) -> Option<f64> {
    average(
        table
            .rows
            .iter()
            .filter_map(|r| r.value.scalar())
            .filter_map(|c| c.value()),
    )
}

/// Mean of each channel over the rows where it is present, in label order
pub fn channel_means(table: &DecodedTable) -> Vec<(String, Option<f64>)> {
    table
        .measures
        .iter()
        .map(|label| {
            let mean = average(
                table
                    .rows
                    .iter()
                    .filter_map(|r| r.value.channel(label))
                    .filter_map(|c| c.value()),
            );
            (label.clone(), mean)
        })
        .collect()
}

/// Label of the largest present channel; the first one wins a tie
pub fn leading_channel(value: &DecodedValue) -> Option<&str> {
    let DecodedValue::Vector(measures) = value else {
        return None;
    };

    let mut best: Option<(&str, f64)> = None;
    for m in measures {
        if let Cell::Present(v) = m.cell {
            if best.map_or(true, |(_, b)| v > b) {
                best = Some((m.label.as_str(), v));
            }
        }
    }
    best.map(|(label, _)| label)
}

/// Present values of a scalar column, or of one channel, in row order
pub fn series(table: &DecodedTable, channel: Option<&str>) -> Vec<f64> {
    table
        .rows
        .iter()
        .filter_map(|r| match channel {
            Some(label) => r.value.channel(label),
            None => r.value.scalar(),
        })
        .filter_map(|c| c.value())
        .collect()
}

/// Last value plus the mean of successive differences
pub fn extrapolate_next(values: &[f64]) -> Option<f64> {
    let last = *values.last()?;
    let mean_delta = average(values.windows(2).map(|w| w[1] - w[0]))?;
    Some(last + mean_delta)
}

/// The period after a numeric period key (`"2021"` → `"2022"`)
pub fn next_period(key: &str) -> Option<String> {
    key.trim().parse::<i64>().ok().map(|y| (y + 1).to_string())
}
