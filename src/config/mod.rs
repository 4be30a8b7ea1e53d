// src/config/mod.rs
use crate::transform::TemperatureUnit;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};
use tracing::info;

pub const ENV_CONFIG: &str = "CLIMDASH_CONFIG";
pub const ENV_SOURCE: &str = "CLIMDASH_SOURCE";
pub const ENV_FALLBACK: &str = "CLIMDASH_FALLBACK";
pub const ENV_OUTPUT: &str = "CLIMDASH_OUTPUT";
pub const ENV_TODAY: &str = "CLIMDASH_TODAY";

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// URL or path of the official data.
    pub source: Option<String>,
    /// URL or path used when `source` can't be loaded.
    pub fallback: Option<String>,
    /// Where the cleaned CSV goes.
    pub output: PathBuf,
    /// Reference date for the future-row cut-off; the local date when unset.
    pub today: Option<NaiveDate>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    /// Groups to keep; empty keeps all.
    pub groups: Vec<String>,
    /// Window of the `smoothed` export column; 1 or less leaves it out.
    pub smoothing_window: usize,
    pub unit: TemperatureUnit,
    /// Groups converted by `unit` besides those whose label carries `℃`.
    pub temperature_groups: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: Some("https://datahub.io/core/global-temp/r/annual.csv".into()),
            fallback: None,
            output: PathBuf::from("output/climate.csv"),
            today: None,
            year_from: None,
            year_to: None,
            groups: Vec::new(),
            smoothing_window: 3,
            unit: TemperatureUnit::Celsius,
            temperature_groups: Vec::new(),
            timeout_secs: 15,
        }
    }
}

impl DashboardConfig {
    /// Parse a YAML config file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(s)?)
    }

    /// Config file named by `arg` or `CLIMDASH_CONFIG` (argument wins),
    /// then environment overrides.
    pub fn load(arg: Option<String>) -> Result<Self> {
        let file = arg.or_else(|| std::env::var(ENV_CONFIG).ok());
        let mut cfg = match file {
            Some(path) => {
                info!(path = %path, "loading config");
                Self::from_yaml_file(path)?
            }
            None => Self::default(),
        };
        cfg.apply_overrides(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Apply `CLIMDASH_*` overrides looked up through `get`.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = get(ENV_SOURCE) {
            self.source = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = get(ENV_FALLBACK) {
            self.fallback = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = get(ENV_OUTPUT) {
            self.output = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_TODAY) {
            let d = NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .with_context(|| format!("{} must be YYYY-MM-DD, got {:?}", ENV_TODAY, v))?;
            self.today = Some(d);
        }
        Ok(())
    }

    /// Inclusive year range; `None` when neither end is set.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        match (self.year_from, self.year_to) {
            (None, None) => None,
            (from, to) => Some((from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX))),
        }
    }
}
