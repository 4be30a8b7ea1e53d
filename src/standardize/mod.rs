// src/standardize/mod.rs
pub mod columns;
pub mod parse;

use crate::table::{CanonicalRow, CanonicalTable, RawTable};
use chrono::{Datelike, Days, NaiveDate};
use columns::{ColumnVocabulary, DateSource, Resolution};
use std::collections::HashSet;
use tracing::{debug, trace};

pub use columns::{resolve, ValueSource};

/// Normalizes arbitrary tabular input into `date`, `value`, optional `group`.
///
/// Never fails: cells that don't parse become missing and their rows are
/// dropped, missing columns are covered by the resolution chain in
/// [`columns::resolve`], and an input with nothing usable gives an empty table.
#[derive(Debug, Clone, Default)]
pub struct Standardizer {
    vocab: ColumnVocabulary,
}

/// Full-row identity used for duplicate removal.
type RowKey = (NaiveDate, u64, Option<String>, Vec<(String, String)>);

impl Standardizer {
    pub fn new(vocab: ColumnVocabulary) -> Self {
        Self { vocab }
    }

    /// Standardize `raw` against the caller's notion of `today`.
    /// Rows dated after `today` are dropped.
    #[tracing::instrument(level = "debug", skip_all, fields(rows = raw.len(), today = %today))]
    pub fn standardize(&self, raw: &RawTable, today: NaiveDate) -> CanonicalTable {
        let res = columns::resolve(raw, &self.vocab);
        debug!(date = ?res.date, value = ?res.value, group = ?res.group, "resolved columns");

        let extras: Vec<usize> = (0..raw.headers.len())
            .filter(|&c| !res.is_consumed(c))
            .collect();

        let mut unparsed = 0usize;
        let mut future = 0usize;
        let mut seen: HashSet<RowKey> = HashSet::new();
        let mut rows: Vec<CanonicalRow> = Vec::with_capacity(raw.len());

        for i in 0..raw.len() {
            let (Some(date), Some(value)) = (row_date(raw, &res, i, today), row_value(raw, &res, i))
            else {
                unparsed += 1;
                continue;
            };
            if date > today {
                future += 1;
                continue;
            }
            // -0.0 and 0.0 are the same reading
            let value = if value == 0.0 { 0.0 } else { value };
            let row = CanonicalRow {
                date,
                value,
                group: res.group.and_then(|c| raw.cell(i, c).as_text()),
                extra: extras
                    .iter()
                    .filter_map(|&c| {
                        raw.cell(i, c)
                            .as_text()
                            .map(|v| (raw.headers[c].clone(), v))
                    })
                    .collect(),
            };
            let key: RowKey = (row.date, row.value.to_bits(), row.group.clone(), row.extra.clone());
            if !seen.insert(key) {
                trace!(row = i, "duplicate row");
                continue;
            }
            rows.push(row);
        }

        let kept = rows.len();
        // stable: ties keep input order
        rows.sort_by_key(|r| r.date);
        debug!(
            kept,
            unparsed,
            future,
            duplicates = raw.len() - kept - unparsed - future,
            "standardized"
        );
        CanonicalTable { rows }
    }
}

/// Standardize with the default column vocabulary.
pub fn standardize(raw: &RawTable, today: NaiveDate) -> CanonicalTable {
    Standardizer::default().standardize(raw, today)
}

fn row_date(raw: &RawTable, res: &Resolution, i: usize, today: NaiveDate) -> Option<NaiveDate> {
    match res.date {
        DateSource::Named(c) | DateSource::Keyword(c) => parse::parse_date(raw.cell(i, c)),
        DateSource::Year(c) => {
            parse::parse_year(raw.cell(i, c)).and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        }
        DateSource::Fallback => today.checked_sub_days(Days::new(i as u64)),
    }
}

fn row_value(raw: &RawTable, res: &Resolution, i: usize) -> Option<f64> {
    parse::parse_number(raw.cell(i, res.value.column()?))
}

/// Years covered by a table, oldest first.
pub fn years(table: &CanonicalTable) -> Vec<i32> {
    let mut ys: Vec<i32> = table.iter().map(|r| r.date.year()).collect();
    ys.dedup();
    ys
}
