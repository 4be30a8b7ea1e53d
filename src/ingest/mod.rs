// src/ingest/mod.rs
use crate::table::{Cell, RawTable};
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde_json::Value;
use std::io::Read;
use tracing::debug;

const BOM: char = '\u{feff}';

/// Read delimited text with a header row into a `RawTable`.
///
/// Every field stays text (empty fields become `Missing`); typing is the
/// standardizer's job. Short or long records are accepted.
pub fn from_csv_reader<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches(BOM).to_string()
            } else {
                h.to_string()
            }
        })
        .collect();
    let width = headers.len();
    let mut table = RawTable::new(headers);

    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let mut row: Vec<Cell> = record
            .iter()
            .take(width)
            .map(|s| if s.trim().is_empty() { Cell::Missing } else { Cell::Text(s.to_string()) })
            .collect();
        row.resize(width, Cell::Missing);
        table.rows.push(row);
    }

    debug!(columns = width, rows = table.len(), "loaded CSV");
    Ok(table)
}

pub fn from_csv_str(s: &str) -> Result<RawTable> {
    from_csv_reader(s.as_bytes())
}

/// Read a JSON array of flat objects, keeping each object's key order.
pub fn from_json_records(s: &str) -> Result<RawTable> {
    let parsed: Value = serde_json::from_str(s).context("parsing JSON records")?;
    let Value::Array(items) = parsed else {
        bail!("expected a JSON array of records");
    };

    let mut table = RawTable::default();
    for (idx, item) in items.into_iter().enumerate() {
        let Value::Object(map) = item else {
            bail!("record {} is not a JSON object", idx);
        };
        table.push_record(map.into_iter().map(|(k, v)| (k, json_cell(v))));
    }

    debug!(columns = table.headers.len(), rows = table.len(), "loaded JSON records");
    Ok(table)
}

fn json_cell(v: Value) -> Cell {
    match v {
        Value::Null => Cell::Missing,
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
        Value::String(s) => Cell::Text(s),
        Value::Bool(b) => Cell::Text(b.to_string()),
        nested => Cell::Text(nested.to_string()),
    }
}
