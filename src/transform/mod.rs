// src/transform/mod.rs
//! Data-side views a dashboard builds from a standardized table:
//! year/group filters, smoothing, yearly aggregates and unit conversion.
//! All of these take a `CanonicalTable` and return new values.

use crate::table::{CanonicalRow, CanonicalTable};
use chrono::Datelike;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Keep rows whose year lies in `from..=to`.
pub fn filter_years(table: &CanonicalTable, from: i32, to: i32) -> CanonicalTable {
    retain(table, |r| (from..=to).contains(&r.date.year()))
}

/// Keep rows whose group is listed. An empty list keeps everything.
pub fn filter_groups(table: &CanonicalTable, groups: &[String]) -> CanonicalTable {
    if groups.is_empty() {
        return table.clone();
    }
    retain(table, |r| {
        r.group
            .as_ref()
            .map(|g| groups.contains(g))
            .unwrap_or(false)
    })
}

fn retain(table: &CanonicalTable, keep: impl Fn(&CanonicalRow) -> bool) -> CanonicalTable {
    CanonicalTable {
        rows: table.rows.iter().filter(|r| keep(r)).cloned().collect(),
    }
}

/// Centered moving average that shrinks at the edges (`min_periods = 1`).
///
/// For an even window the extra element sits on the left, matching pandas'
/// `rolling(window, center=True)`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }
    let n = values.len();
    let right = (window - 1) / 2;
    let left = window - 1 - right;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(left);
            let hi = (i + right).min(n - 1);
            let slice = &values[lo..=hi];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Moving average of each row's value, computed per group in date order.
/// The result lines up with `table.rows`; the table itself is untouched.
pub fn smoothed_values(table: &CanonicalTable, window: usize) -> Vec<f64> {
    let mut out: Vec<f64> = table.rows.iter().map(|r| r.value).collect();
    if window <= 1 {
        return out;
    }
    let mut by_group: BTreeMap<Option<&str>, Vec<usize>> = BTreeMap::new();
    for (i, r) in table.rows.iter().enumerate() {
        by_group.entry(r.group.as_deref()).or_default().push(i);
    }
    for idxs in by_group.values() {
        let vals: Vec<f64> = idxs.iter().map(|&i| out[i]).collect();
        for (&i, v) in idxs.iter().zip(rolling_mean(&vals, window)) {
            out[i] = v;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearlyPoint {
    pub year: i32,
    pub group: Option<String>,
    pub mean: f64,
    pub count: usize,
}

/// Mean value per (group, year), ordered by group then year.
pub fn yearly_mean(table: &CanonicalTable) -> Vec<YearlyPoint> {
    let mut acc: BTreeMap<(Option<&str>, i32), (f64, usize)> = BTreeMap::new();
    for r in table {
        let e = acc.entry((r.group.as_deref(), r.date.year())).or_default();
        e.0 += r.value;
        e.1 += 1;
    }
    acc.into_iter()
        .map(|((group, year), (sum, count))| YearlyPoint {
            year,
            group: group.map(str::to_string),
            mean: sum / count as f64,
            count,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius reading into this unit.
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "℃",
            TemperatureUnit::Fahrenheit => "℉",
        }
    }
}

/// True when the row's group names a temperature: its label carries a
/// Celsius mark (`평균기온(℃)`) or it is listed in `temperature_groups`.
pub fn is_temperature(row: &CanonicalRow, temperature_groups: &[String]) -> bool {
    match row.group.as_deref() {
        Some(g) => g.contains('℃') || g.contains("°C") || temperature_groups.iter().any(|t| t == g),
        None => false,
    }
}

/// Convert temperature rows (stored in Celsius) into `unit`.
/// Counts, indices and ungrouped rows keep their values.
pub fn to_unit(
    table: &CanonicalTable,
    unit: TemperatureUnit,
    temperature_groups: &[String],
) -> CanonicalTable {
    let mut out = table.clone();
    for r in out.rows.iter_mut() {
        if is_temperature(r, temperature_groups) {
            r.value = unit.convert(r.value);
        }
    }
    out
}
