// src/table/mod.rs

use chrono::NaiveDate;
use std::fmt;

/// One untyped scalar from a source record.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Text form used for incidental columns and group labels.
    /// `None` for a missing cell.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Missing => Ok(()),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Number(v as f64)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

/// Tabular input of unknown layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names in first-seen order.
    pub headers: Vec<String>,
    /// One Vec per record, always `headers.len()` wide.
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a record given as `(column, cell)` pairs.
    ///
    /// Unknown columns are appended to `headers` and earlier rows are padded
    /// with `Missing`; columns the record doesn't mention are `Missing` too.
    pub fn push_record<I, K, C>(&mut self, record: I)
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<Cell>,
    {
        let mut row = vec![Cell::Missing; self.headers.len()];
        for (name, cell) in record {
            let name = name.into();
            let idx = match self.column_index(&name) {
                Some(i) => i,
                None => {
                    self.headers.push(name);
                    for r in &mut self.rows {
                        r.push(Cell::Missing);
                    }
                    row.push(Cell::Missing);
                    self.headers.len() - 1
                }
            };
            row[idx] = cell.into();
        }
        self.rows.push(row);
    }

    /// Build a table from an ordered list of records.
    pub fn from_records<R, I, K, C>(records: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<Cell>,
    {
        let mut table = Self::default();
        for rec in records {
            table.push_record(rec);
        }
        table
    }

    /// Index of the first column called exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (`row`, `col`), `Missing` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows[row].get(col).unwrap_or(&Cell::Missing)
    }

    /// Iterate one column top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        (0..self.rows.len()).map(move |r| self.cell(r, col))
    }
}

/// A standardized observation.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub date: NaiveDate,
    pub value: f64,
    pub group: Option<String>,
    /// Incidental source columns carried through as text, in source order.
    pub extra: Vec<(String, String)>,
}

/// Output of the standardizer: sorted by date, deduplicated, never future-dated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    pub rows: Vec<CanonicalRow>,
}

impl CanonicalTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalRow> {
        self.rows.iter()
    }

    pub fn has_groups(&self) -> bool {
        self.rows.iter().any(|r| r.group.is_some())
    }

    /// Distinct group labels in first-seen order.
    pub fn groups(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for g in self.rows.iter().filter_map(|r| r.group.as_deref()) {
            if !out.contains(&g) {
                out.push(g);
            }
        }
        out
    }

    /// First and last date; rows are sorted so these are the ends.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.rows.first()?.date, self.rows.last()?.date))
    }

    /// Names of the incidental columns, in the order they first appear.
    pub fn extra_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (name, _) in self.rows.iter().flat_map(|r| r.extra.iter()) {
            if !out.contains(&name.as_str()) {
                out.push(name);
            }
        }
        out
    }

    /// Turn the table back into raw input: `date`, `value`, `group`, then extras.
    pub fn to_raw(&self) -> RawTable {
        let mut headers = vec!["date".to_string(), "value".to_string()];
        if self.has_groups() {
            headers.push("group".to_string());
        }
        let mut raw = RawTable::new(headers);
        for row in &self.rows {
            let mut rec: Vec<(String, Cell)> = vec![
                ("date".into(), Cell::Text(row.date.format("%Y-%m-%d").to_string())),
                ("value".into(), Cell::Number(row.value)),
            ];
            if let Some(g) = &row.group {
                rec.push(("group".into(), Cell::Text(g.clone())));
            }
            for (k, v) in &row.extra {
                rec.push((k.clone(), Cell::Text(v.clone())));
            }
            raw.push_record(rec);
        }
        raw
    }
}

impl<'a> IntoIterator for &'a CanonicalTable {
    type Item = &'a CanonicalRow;
    type IntoIter = std::slice::Iter<'a, CanonicalRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
