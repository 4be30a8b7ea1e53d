// src/standardize/columns.rs

use super::parse;
use crate::table::RawTable;

/// Column names the resolution chain looks for.
#[derive(Debug, Clone)]
pub struct ColumnVocabulary {
    /// Exact name of a ready-made date column.
    pub date: String,
    /// Lowercase substrings that mark a date-like column.
    pub date_keywords: Vec<String>,
    /// Lowercase names of a year column used to synthesize Jan 1 dates.
    pub year_names: Vec<String>,
    /// Exact name of a ready-made value column.
    pub value: String,
    /// Exact name of a ready-made group column.
    pub group: String,
    /// Lowercase names accepted as a grouping dimension when `group` is absent,
    /// highest priority first.
    pub group_names: Vec<String>,
}

impl Default for ColumnVocabulary {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            date: "date".into(),
            date_keywords: owned(&["date", "day", "time", "날짜", "일자", "일시"]),
            year_names: owned(&["year", "연도"]),
            value: "value".into(),
            group: "group".into(),
            group_names: owned(&["metric", "region", "지역", "season"]),
        }
    }
}

/// Where each row's date comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// Column literally named `date`.
    Named(usize),
    /// First column whose name contains a date keyword.
    Keyword(usize),
    /// Jan 1 of the year held in this column.
    Year(usize),
    /// Placeholder dates counting back from `today`.
    Fallback,
}

/// Where each row's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Column literally named `value`.
    Named(usize),
    /// First column whose cells all parse as numbers.
    Numeric(usize),
    /// Last unclaimed column, coerced regardless of content.
    LastColumn(usize),
    /// Nothing left to read a value from.
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub date: DateSource,
    pub value: ValueSource,
    pub group: Option<usize>,
}

impl DateSource {
    pub fn column(&self) -> Option<usize> {
        match *self {
            DateSource::Named(c) | DateSource::Keyword(c) | DateSource::Year(c) => Some(c),
            DateSource::Fallback => None,
        }
    }
}

impl ValueSource {
    pub fn column(&self) -> Option<usize> {
        match *self {
            ValueSource::Named(c) | ValueSource::Numeric(c) | ValueSource::LastColumn(c) => Some(c),
            ValueSource::Absent => None,
        }
    }
}

impl Resolution {
    /// True when column `c` feeds date, value or group.
    pub fn is_consumed(&self, c: usize) -> bool {
        self.date.column() == Some(c) || self.value.column() == Some(c) || self.group == Some(c)
    }
}

/// Run the resolution chain over `raw`'s headers (and, for values, its cells).
/// Date first, then group, then value; a column claimed earlier is never reused.
pub fn resolve(raw: &RawTable, vocab: &ColumnVocabulary) -> Resolution {
    let date = resolve_date(raw, vocab);
    let date_col = date.column();
    let value_named = raw.column_index(&vocab.value).filter(|&c| Some(c) != date_col);

    let group = raw
        .column_index(&vocab.group)
        .filter(|&c| Some(c) != date_col && Some(c) != value_named)
        // vocabulary order is the priority, so `metric` beats an earlier `season`
        .or_else(|| {
            vocab.group_names.iter().find_map(|name| {
                (0..raw.headers.len()).find(|&c| {
                    Some(c) != date_col
                        && Some(c) != value_named
                        && raw.headers[c].to_lowercase() == *name
                })
            })
        });

    let claimed = |c: usize| Some(c) == date_col || Some(c) == group;
    let value = if let Some(c) = value_named {
        ValueSource::Named(c)
    } else if let Some(c) = (0..raw.headers.len())
        .filter(|&c| !claimed(c))
        .find(|&c| all_numeric(raw, c))
    {
        ValueSource::Numeric(c)
    } else if let Some(c) = (0..raw.headers.len()).rev().find(|&c| !claimed(c)) {
        ValueSource::LastColumn(c)
    } else {
        ValueSource::Absent
    };

    Resolution { date, value, group }
}

fn resolve_date(raw: &RawTable, vocab: &ColumnVocabulary) -> DateSource {
    if let Some(c) = raw.column_index(&vocab.date) {
        return DateSource::Named(c);
    }
    let lowered: Vec<String> = raw.headers.iter().map(|h| h.to_lowercase()).collect();
    if let Some(c) = lowered
        .iter()
        .position(|h| vocab.date_keywords.iter().any(|k| h.contains(k.as_str())))
    {
        return DateSource::Keyword(c);
    }
    if let Some(c) = lowered.iter().position(|h| vocab.year_names.contains(h)) {
        return DateSource::Year(c);
    }
    DateSource::Fallback
}

/// At least one present cell, and every present cell parses as a number.
fn all_numeric(raw: &RawTable, col: usize) -> bool {
    let mut seen = false;
    for cell in raw.column(col).filter(|c| !c.is_missing()) {
        if !parse::is_numeric(cell) {
            return false;
        }
        seen = true;
    }
    seen
}
