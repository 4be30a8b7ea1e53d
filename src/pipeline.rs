// src/pipeline.rs

use crate::{
    config::DashboardConfig,
    export,
    fetch::{self, Origin, Source},
    standardize::{self, Standardizer},
    table::CanonicalTable,
    transform,
};
use anyhow::Result;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::{info, warn};

/// What a run produced.
#[derive(Debug)]
pub struct Report {
    pub origin: Origin,
    pub raw_rows: usize,
    /// Standardized table before any view filters.
    pub table: CanonicalTable,
    /// Year/group selection of `table` with observed values; this is what
    /// the CSV's `value` column holds.
    pub exported: CanonicalTable,
    /// Moving average per row of `exported`, when a window above 1 is set.
    pub smoothed: Option<Vec<f64>>,
    /// `exported` with temperature rows in the configured unit.
    pub display: CanonicalTable,
}

/// Load → standardize → filter → export, plus the smoothed column and the
/// unit-converted display view.
///
/// `today` is passed in by the caller; nothing below reads the clock.
#[tracing::instrument(level = "info", skip_all, fields(today = %today))]
pub async fn run(cfg: &DashboardConfig, client: &Client, today: NaiveDate) -> Result<Report> {
    let primary = cfg.source.as_deref().map(str::parse::<Source>).transpose()?;
    let fallback = cfg.fallback.as_deref().map(str::parse::<Source>).transpose()?;

    let loaded = fetch::load_with_fallback(client, primary.as_ref(), fallback.as_ref()).await;
    if loaded.is_fallback() {
        warn!(origin = ?loaded.origin, "official data unavailable, showing substitute data");
    }
    let raw_rows = loaded.table.len();

    let table = Standardizer::default().standardize(&loaded.table, today);
    info!(
        raw_rows,
        rows = table.len(),
        groups = table.groups().len(),
        years = standardize::years(&table).len(),
        "standardized"
    );

    let mut exported = table.clone();
    if let Some((from, to)) = cfg.year_range() {
        exported = transform::filter_years(&exported, from, to);
    }
    exported = transform::filter_groups(&exported, &cfg.groups);
    let smoothed = (cfg.smoothing_window > 1)
        .then(|| transform::smoothed_values(&exported, cfg.smoothing_window));
    let display = transform::to_unit(&exported, cfg.unit, &cfg.temperature_groups);

    for p in transform::yearly_mean(&display) {
        info!(
            year = p.year,
            group = p.group.as_deref().unwrap_or("-"),
            mean = p.mean,
            count = p.count,
            "yearly mean"
        );
    }

    export::write_csv(&exported, smoothed.as_deref(), &cfg.output)?;

    Ok(Report {
        origin: loaded.origin,
        raw_rows,
        table,
        exported,
        smoothed,
        display,
    })
}
