// src/fetch/mod.rs
use crate::ingest;
use crate::table::RawTable;
use anyhow::{Context, Result};
use reqwest::Client;
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tokio::fs;
use tracing::{error, info, warn};
use url::Url;

/// Where a raw table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    Path(PathBuf),
}

impl FromStr for Source {
    type Err = anyhow::Error;

    /// `http://` and `https://` strings are URLs, anything else is a local path.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            let url = Url::parse(s).with_context(|| format!("invalid source URL {}", s))?;
            Ok(Source::Url(url))
        } else {
            Ok(Source::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(u) => write!(f, "{}", u),
            Source::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
}

impl Source {
    /// `.json` means a JSON array of records, everything else is CSV.
    fn format(&self) -> Format {
        let name = match self {
            Source::Url(u) => u
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or("")
                .to_string(),
            Source::Path(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        };
        if name.to_lowercase().ends_with(".json") {
            Format::Json
        } else {
            Format::Csv
        }
    }
}

/// Which source ended up supplying the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Primary,
    Fallback,
    /// Neither source loaded; the table is empty.
    Empty,
}

#[derive(Debug)]
pub struct Loaded {
    pub table: RawTable,
    pub origin: Origin,
}

impl Loaded {
    pub fn is_fallback(&self) -> bool {
        self.origin != Origin::Primary
    }
}

/// Build the HTTP client used for URL sources.
pub fn client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .gzip(true)
        .build()
        .context("building HTTP client")
}

/// Load a raw table from `source`. One attempt; non-2xx responses are errors.
#[tracing::instrument(level = "info", skip_all, fields(source = %source))]
pub async fn load(client: &Client, source: &Source) -> Result<RawTable> {
    let body = match source {
        Source::Url(url) => client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {}", url))?
            .error_for_status()?
            .text()
            .await
            .with_context(|| format!("reading body from {}", url))?,
        Source::Path(path) => read_file(path).await?,
    };
    parse(source.format(), &body).with_context(|| format!("parsing {}", source))
}

async fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

fn parse(format: Format, body: &str) -> Result<RawTable> {
    match format {
        Format::Csv => ingest::from_csv_str(body),
        Format::Json => ingest::from_json_records(body),
    }
}

/// Load `primary`; on failure substitute `fallback`, and if that fails too,
/// an empty table so downstream stages still run.
pub async fn load_with_fallback(
    client: &Client,
    primary: Option<&Source>,
    fallback: Option<&Source>,
) -> Loaded {
    if let Some(src) = primary {
        match load(client, src).await {
            Ok(table) => {
                info!(source = %src, rows = table.len(), "loaded primary source");
                return Loaded {
                    table,
                    origin: Origin::Primary,
                };
            }
            Err(e) => warn!(source = %src, "primary source failed, using fallback: {:#}", e),
        }
    }

    if let Some(src) = fallback {
        match load(client, src).await {
            Ok(table) => {
                info!(source = %src, rows = table.len(), "loaded fallback source");
                return Loaded {
                    table,
                    origin: Origin::Fallback,
                };
            }
            Err(e) => error!(source = %src, "fallback source failed: {:#}", e),
        }
    }

    warn!("no source could be loaded; continuing with an empty table");
    Loaded {
        table: RawTable::default(),
        origin: Origin::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn source_parsing() -> Result<()> {
        let s: Source = "https://datahub.io/core/global-temp/r/annual.csv".parse()?;
        assert!(matches!(s, Source::Url(_)));
        assert_eq!(s.format(), Format::Csv);

        let p: Source = "data/fallback.json".parse()?;
        assert_eq!(p, Source::Path(PathBuf::from("data/fallback.json")));
        assert_eq!(p.format(), Format::Json);

        assert!("https://".parse::<Source>().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn loads_csv_file() -> Result<()> {
        let mut tmp = NamedTempFile::with_suffix(".csv")?;
        write!(tmp, "date,value\n2020-01-01,1.5\n")?;
        let src = Source::Path(tmp.path().to_path_buf());

        let table = load(&Client::new(), &src).await?;
        assert_eq!(table.headers, vec!["date", "value"]);
        assert_eq!(table.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_primary_uses_fallback() -> Result<()> {
        let mut tmp = NamedTempFile::with_suffix(".json")?;
        write!(tmp, r#"[{{"year": 2010, "value": 9.0}}]"#)?;
        let primary = Source::Path(PathBuf::from("/definitely/not/here.csv"));
        let fallback = Source::Path(tmp.path().to_path_buf());

        let loaded = load_with_fallback(&Client::new(), Some(&primary), Some(&fallback)).await;
        assert_eq!(loaded.origin, Origin::Fallback);
        assert!(loaded.is_fallback());
        assert_eq!(loaded.table.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn nothing_loads_gives_empty_table() {
        let missing = Source::Path(PathBuf::from("/definitely/not/here.csv"));
        let loaded = load_with_fallback(&Client::new(), Some(&missing), None).await;
        assert_eq!(loaded.origin, Origin::Empty);
        assert!(loaded.table.is_empty());
    }
}
