use crate::table::Cell;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// `YYYY-MM-DD`, `YYYY/MM/DD` or `YYYY.MM.DD` (KMA style, spaces allowed),
/// optionally followed by an `HH:MM...` time part we don't care about.
static YMD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})\s*[-/.]\s*(\d{1,2})\s*[-/.]\s*(\d{1,2})\.?(?:[ T]\d{1,2}:\d{2}.*)?$")
        .expect("static date regex")
});

/// `YYYY-MM`, `YYYY/MM` or `YYYY.MM`
static YM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})\s*[-/.]\s*(\d{1,2})\.?$").expect("static month regex"));

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Parse a textual number: optional sign, digits, optional point and exponent.
/// Anything that isn't finite is rejected.
pub fn parse_number_str(s: &str) -> Option<f64> {
    let s = clean_str(s);
    if s.is_empty() {
        return None;
    }
    // f64::from_str also takes "inf"/"NaN"; only digit-led forms are numbers here
    let body = s.trim_start_matches(&['+', '-'][..]);
    if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Soft numeric coercion of a cell.
pub fn parse_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Number(_) | Cell::Missing => None,
        Cell::Text(s) => parse_number_str(s),
    }
}

/// True when the cell holds something `parse_number` accepts.
pub fn is_numeric(cell: &Cell) -> bool {
    parse_number(cell).is_some()
}

/// Integral year in 1..=9999.
pub fn parse_year(cell: &Cell) -> Option<i32> {
    let n = parse_number(cell)?;
    if n.fract() != 0.0 || !(1.0..=9999.0).contains(&n) {
        return None;
    }
    Some(n as i32)
}

/// Parse a date string at day granularity. Returns None if parsing fails.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = clean_str(s);

    if let Some(c) = YMD.captures(s) {
        return ymd(&c[1], &c[2], &c[3]);
    }
    // compact YYYYMMDD
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return ymd(&s[0..4], &s[4..6], &s[6..8]);
    }
    if let Some(c) = YM.captures(s) {
        return ymd(&c[1], &c[2], "1");
    }
    // bare year
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        return ymd(s, "1", "1");
    }
    None
}

/// Soft date coercion of a cell. Numbers are read as a year (`2010`)
/// or a compact date (`20100315`).
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Text(s) => parse_date_str(s),
        Cell::Number(n) if n.is_finite() && n.fract() == 0.0 => {
            let n = *n as i64;
            match n {
                1000..=9999 => NaiveDate::from_ymd_opt(n as i32, 1, 1),
                10000101..=99991231 => NaiveDate::from_ymd_opt(
                    (n / 10000) as i32,
                    ((n / 100) % 100) as u32,
                    (n % 100) as u32,
                ),
                _ => None,
            }
        }
        _ => None,
    }
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_common_date_layouts() {
        assert_eq!(parse_date_str("2020-01-05"), Some(d(2020, 1, 5)));
        assert_eq!(parse_date_str("2020/1/5"), Some(d(2020, 1, 5)));
        assert_eq!(parse_date_str("2020. 01. 05."), Some(d(2020, 1, 5)));
        assert_eq!(parse_date_str("2020-01-05 13:45:00"), Some(d(2020, 1, 5)));
        assert_eq!(parse_date_str("2020-01-05T13:45:00+09:00"), Some(d(2020, 1, 5)));
        assert_eq!(parse_date_str("20200105"), Some(d(2020, 1, 5)));
        assert_eq!(parse_date_str("2020-07"), Some(d(2020, 7, 1)));
        assert_eq!(parse_date_str("\"2010\""), Some(d(2010, 1, 1)));
    }

    #[test]
    fn rejects_bad_dates() {
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("2020-02-30"), None);
        assert_eq!(parse_date_str("yesterday"), None);
        assert_eq!(parse_date_str("2020-01-05 not a time"), None);
        assert_eq!(parse_date_str("2020-01-05Tuesday"), None);
        assert_eq!(parse_date(&Cell::Number(12.5)), None);
        assert_eq!(parse_date(&Cell::Missing), None);
    }

    #[test]
    fn numeric_dates() {
        assert_eq!(parse_date(&Cell::Number(2015.0)), Some(d(2015, 1, 1)));
        assert_eq!(parse_date(&Cell::Number(20150301.0)), Some(d(2015, 3, 1)));
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number_str("5"), Some(5.0));
        assert_eq!(parse_number_str(" -3.25 "), Some(-3.25));
        assert_eq!(parse_number_str("+.5"), Some(0.5));
        assert_eq!(parse_number_str("1e3"), Some(1000.0));
        assert_eq!(parse_number_str("abc"), None);
        assert_eq!(parse_number_str("NaN"), None);
        assert_eq!(parse_number_str("-inf"), None);
        assert_eq!(parse_number_str("1,234"), None);
        assert_eq!(parse_number(&Cell::Number(f64::NAN)), None);
    }

    #[test]
    fn years() {
        assert_eq!(parse_year(&Cell::Number(2010.0)), Some(2010));
        assert_eq!(parse_year(&Cell::Text("2010".into())), Some(2010));
        assert_eq!(parse_year(&Cell::Number(2010.5)), None);
        assert_eq!(parse_year(&Cell::Text("twenty".into())), None);
    }
}
