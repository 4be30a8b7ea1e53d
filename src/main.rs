use anyhow::Result;
use chrono::Local;
use climdash::{config::DashboardConfig, fetch, pipeline};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let cfg = DashboardConfig::load(std::env::args().nth(1))?;
    // the only clock read; everything downstream takes `today` as an argument
    let today = cfg.today.unwrap_or_else(|| Local::now().date_naive());
    info!(source = ?cfg.source, fallback = ?cfg.fallback, %today, "configured");

    // ─── 3) load, clean, export ──────────────────────────────────────
    let client = fetch::client(Duration::from_secs(cfg.timeout_secs))?;
    let report = pipeline::run(&cfg, &client, today).await?;

    info!(
        origin = ?report.origin,
        raw_rows = report.raw_rows,
        rows = report.table.len(),
        exported = report.exported.len(),
        unit = cfg.unit.symbol(),
        output = %cfg.output.display(),
        "all done"
    );
    Ok(())
}
