//! Collector CLI - Fetches a published sales sheet and ingests it
//!
//! Usage:
//!   # Google Sheets share link (rewritten to its CSV export):
//!   cargo run --bin collector -- --url https://docs.google.com/spreadsheets/d/.../edit#gid=0
//!
//!   # Plain CSV URL, no proxy fallback, saving the raw text:
//!   cargo run --bin collector -- --url https://example.com/sales.csv --no-proxies --out ./data/sales.csv

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::fs;
use tracing_subscriber::EnvFilter;

use salesboard_collector::{FetchConfig, FetchedSource, Fetcher};
use salesboard_parser::IngestReport;

#[derive(Parser, Debug)]
#[command(name = "collector", about = "Fetches a published sales sheet and ingests it")]
struct Args {
    /// Sheet or CSV URL to fetch
    #[arg(long)]
    url: String,

    /// Zero-based row to use as the header instead of detecting it
    #[arg(long)]
    header_row: Option<usize>,

    /// Only try the URL itself, never a proxy
    #[arg(long, default_value = "false")]
    no_proxies: bool,

    /// Save the fetched text to this file
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long, default_value = "false")]
    json: bool,
}

#[derive(Serialize)]
struct CollectorOutput<'a> {
    fetch: &'a FetchedSource,
    #[serde(flatten)]
    report: &'a IngestReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = FetchConfig::from_env();
    if args.no_proxies {
        config.use_proxies = false;
    }

    if !args.json {
        println!("=== Salesboard Collector ===");
        println!("URL: {}", args.url);
        println!("Proxies: {}", if config.use_proxies { "enabled" } else { "disabled" });
        println!("Timeout: {}s", config.timeout.as_secs());
    }

    let fetcher = Fetcher::new(config).context("Failed to build HTTP client")?;
    let fetched = fetcher.fetch(&args.url).await.context("Fetch failed")?;

    if !args.json {
        println!("  Fetched from: {}", fetched.fetched_url);
        println!("  Downloaded: {} bytes, mime: {}", fetched.size_bytes, fetched.mime_type);
        println!("  Hash: {}", fetched.content_hash);
    }

    if let Some(path) = &args.out {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.context("Failed to create output directory")?;
        }
        fs::write(path, &fetched.text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !args.json {
            println!("  Saved to: {}", path.display());
        }
    }

    let sheet = fetched.clone().into_sheet().context("Ingestion failed")?;
    let report = sheet.report(args.header_row).context("Ingestion failed")?;

    if args.json {
        let output = CollectorOutput {
            fetch: &fetched,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "\nHeader: row {} (confidence {:.2}) [{}]",
        report.header.row_index,
        report.header.confidence,
        report.header.headers.join(", ")
    );
    println!("Parsed {} records", report.records.len());
    for (i, record) in report.records.iter().take(3).enumerate() {
        println!(
            "  [{}] {} | target {} | actual {} | achievement {}%",
            i + 1,
            record.product,
            record.target,
            record.actual,
            record.achievement_rate
        );
    }
    if report.records.len() > 3 {
        println!("  ... and {} more", report.records.len() - 3);
    }
    println!(
        "Totals: target {} | actual {} | achievement {}% | yoy {}%",
        report.totals.target, report.totals.actual, report.totals.achievement_rate, report.totals.yoy_growth
    );
    println!(
        "Validation: {} ({} warnings, score {:.1}%)",
        if report.validation.is_valid { "ok" } else { "errors" },
        report.validation.warnings.len(),
        report.validation.quality.score
    );

    Ok(())
}
