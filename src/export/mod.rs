use crate::table::CanonicalTable;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::{fs, path::Path};
use tracing::info;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize `table` as CSV: `date,value[,smoothed][,group][,extra...]`.
///
/// `value` is always the observed number; a moving average, when given,
/// goes to its own `smoothed` column, one entry per row.
/// Output starts with a UTF-8 BOM so spreadsheet tools pick up Korean labels.
pub fn to_csv_bytes(table: &CanonicalTable, smoothed: Option<&[f64]>) -> Result<Vec<u8>> {
    let with_group = table.has_groups();
    let extras = table.extra_columns();

    let mut buf = UTF8_BOM.to_vec();
    {
        let mut wtr = WriterBuilder::new().from_writer(&mut buf);

        let mut header = vec!["date", "value"];
        if smoothed.is_some() {
            header.push("smoothed");
        }
        if with_group {
            header.push("group");
        }
        header.extend(extras.iter().copied());
        wtr.write_record(&header).context("writing CSV header")?;

        for (i, row) in table.rows.iter().enumerate() {
            let mut rec = vec![row.date.format("%Y-%m-%d").to_string(), row.value.to_string()];
            if let Some(s) = smoothed {
                rec.push(s.get(i).map(f64::to_string).unwrap_or_default());
            }
            if with_group {
                rec.push(row.group.clone().unwrap_or_default());
            }
            for name in &extras {
                let v = row
                    .extra
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                rec.push(v);
            }
            wtr.write_record(&rec).context("writing CSV row")?;
        }
        wtr.flush().context("flushing CSV writer")?;
    }
    Ok(buf)
}

/// Write the CSV export to `path`, creating parent directories.
pub fn write_csv(
    table: &CanonicalTable,
    smoothed: Option<&[f64]>,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let bytes = to_csv_bytes(table, smoothed)?;
    fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = table.len(),
        smoothed = smoothed.is_some(),
        bytes = bytes.len(),
        "exported CSV"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ingest, standardize::standardize, table::RawTable};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample() -> CanonicalTable {
        let raw = RawTable::from_records([
            [("date", "2020-07-01"), ("value", "25.2"), ("metric", "평균기온(℃)"), ("note", "a,b")],
            [("date", "2020-01-01"), ("value", "1.8"), ("metric", "평균기온(℃)"), ("note", "-")],
        ]);
        standardize(&raw, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn csv_has_bom_header_and_quoting() -> Result<()> {
        let bytes = to_csv_bytes(&sample(), None)?;
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec())?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,value,group,note");
        assert_eq!(lines[1], "2020-01-01,1.8,평균기온(℃),-");
        assert_eq!(lines[2], "2020-07-01,25.2,평균기온(℃),\"a,b\"");
        Ok(())
    }

    #[test]
    fn export_reads_back_to_the_same_table() -> Result<()> {
        let table = sample();
        let dir = tempdir()?;
        let path = dir.path().join("out/official.csv");
        write_csv(&table, None, &path)?;

        let raw = ingest::from_csv_reader(fs::File::open(&path)?)?;
        let again = standardize(&raw, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(again, table);
        Ok(())
    }

    #[test]
    fn smoothed_column_sits_beside_the_observed_value() -> Result<()> {
        let table = sample();
        let bytes = to_csv_bytes(&table, Some(&[13.5, 13.5][..]))?;
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec())?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,value,smoothed,group,note");
        assert_eq!(lines[1], "2020-01-01,1.8,13.5,평균기온(℃),-");
        assert_eq!(lines[2], "2020-07-01,25.2,13.5,평균기온(℃),\"a,b\"");
        Ok(())
    }
}
