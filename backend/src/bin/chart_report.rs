//! Weight chart report binary.
//!
//! Decodes an entry log, rebuilds the week/month/year sections and prints
//! them as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Report on an exported log
//! cargo run --bin chart-report -- entries.json
//!
//! # Report on a generated two-year log, selecting a date
//! cargo run --bin chart-report -- --sample 730 --select 2024-03-01
//!
//! # Read the log from stdin
//! cat entries.json | cargo run --bin chart-report
//! ```
//!
//! # Environment Variables
//!
//! - `WEIGHT_CHART_CONFIG`: Path to a TOML config (used when `--config` is absent)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use weight_chart::sample::{generate_history_with, SampleOptions};
use weight_chart::services::parse_timestamp;
use weight_chart::{
    parse_entries_json, ChartConfig, Clock, RawEntry, SectionKind, SharedChartManager,
    SystemClock, WeightChartManager,
};

/// Print chart sections for a weight entry log as JSON.
#[derive(Parser, Debug)]
#[command(name = "chart-report", version, about)]
struct Cli {
    /// JSON array of entry operations; stdin when omitted
    entries: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generate a noisy sample log of this many days instead of reading one
    #[arg(long, value_name = "DAYS", conflicts_with = "entries")]
    sample: Option<usize>,

    /// Select the point nearest to this date in every section
    #[arg(long, value_name = "DATE")]
    select: Option<String>,

    /// Section reported as the active tab
    #[arg(long, default_value = "week")]
    tab: SectionKind,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ChartConfig::from_file(path)?,
        None => ChartConfig::from_env()?,
    };

    let clock = Arc::new(SystemClock);
    let entries = load_entries(&cli, clock.now())?;
    info!("Loaded {} log rows", entries.len());

    let shared = SharedChartManager::new(WeightChartManager::with_clock(config, clock));
    shared.rebuild_in_background(entries).await?;

    let selected = match cli.select.as_deref() {
        Some(text) => {
            Some(parse_timestamp(text).with_context(|| format!("unrecognised date '{}'", text))?)
        }
        None => None,
    };

    let snapshot = shared.write(|manager| {
        manager.set_active_tab(cli.tab);
        if let Some(date) = selected {
            for kind in SectionKind::ALL {
                manager.section_mut(kind).select_point_at_date(date);
                manager.section_mut(kind).scroll_to(date);
            }
        }
        let stats = manager.last_stats();
        info!(
            "Reduced to {} entries ({} tombstoned, {} duplicate creates)",
            stats.valid, stats.tombstoned, stats.duplicate_creates
        );
        manager.snapshot()
    });

    let output = if cli.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", output);
    Ok(())
}

fn load_entries(cli: &Cli, now: chrono::DateTime<chrono::Utc>) -> anyhow::Result<Vec<RawEntry>> {
    if let Some(days) = cli.sample {
        info!("Generating {} days of sample data", days);
        return Ok(generate_history_with(days, 82.0, now, &SampleOptions::noisy()));
    }

    let json = match &cli.entries {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(parse_entries_json(&json)?)
}
