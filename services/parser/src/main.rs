//! Parser CLI - Reads a sales sheet into normalized product records
//!
//! Responsibilities:
//! - Read a CSV or workbook file (or the built-in demo sheet)
//! - Detect the header row, or use the one given with --header-row
//! - Print records, totals and the validation report
//! - Optionally export the records as CSV
//!
//! Same file + same header choice = same output

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::fs;
use tracing_subscriber::EnvFilter;

use salesboard_parser::sample::sample_grid;
use salesboard_parser::{
    header_candidates, is_workbook, IngestReport, LoadedSheet, SalesRecord, Source, SourceInfo, SourceKind,
};

#[derive(Parser, Debug)]
#[command(name = "parser", about = "Reads a sales sheet into normalized product records")]
struct Args {
    /// CSV or workbook file to read
    #[arg(long, required_unless_present = "sample")]
    file: Option<PathBuf>,

    /// Sheet to read from a workbook (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Zero-based row to use as the header instead of detecting it
    #[arg(long)]
    header_row: Option<usize>,

    /// Only list header candidates
    #[arg(long, default_value = "false")]
    candidates: bool,

    /// Print the full result as JSON
    #[arg(long, default_value = "false")]
    json: bool,

    /// Write records to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Use the built-in demo sheet
    #[arg(long, default_value = "false", conflicts_with = "file")]
    sample: bool,
}

/// Flat record row for CSV export; absent last-year figures stay empty.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    product: &'a str,
    last_year: Option<f64>,
    target: f64,
    actual: f64,
    yoy_growth: f64,
    achievement_rate: f64,
}

impl<'a> From<&'a SalesRecord> for CsvRow<'a> {
    fn from(record: &'a SalesRecord) -> Self {
        Self {
            product: &record.product,
            last_year: record.last_year,
            target: record.target,
            actual: record.actual,
            yoy_growth: record.yoy_growth,
            achievement_rate: record.achievement_rate,
        }
    }
}

async fn load(args: &Args) -> Result<LoadedSheet> {
    if args.sample {
        let grid = sample_grid();
        let info = SourceInfo::new("sample", SourceKind::Csv, 0, &grid);
        return Ok(LoadedSheet { grid, info });
    }

    let path = args.file.as_deref().context("--file is required")?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let loaded = if is_workbook(&name, "") {
        LoadedSheet::from_workbook_bytes(&name, bytes, args.sheet.as_deref())
    } else {
        LoadedSheet::from_csv_bytes(&name, &bytes)
    };

    loaded.with_context(|| format!("Failed to load {}", path.display()))
}

fn write_csv(path: &Path, records: &[SalesRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn print_report(report: &IngestReport) {
    let source = &report.source;
    println!(
        "Sheet: {} ({} rows x {} columns, sheets: {})",
        source.sheet,
        source.row_count,
        source.column_count,
        source.sheets.join(", ")
    );
    println!(
        "Header: row {} (confidence {:.2}) [{}]",
        report.header.row_index,
        report.header.confidence,
        report.header.headers.join(", ")
    );

    println!("\nParsed {} records", report.records.len());
    for (i, record) in report.records.iter().take(5).enumerate() {
        println!(
            "  [{}] {} | last year {} | target {} | actual {} | yoy {}% | achievement {}%",
            i + 1,
            record.product,
            record.last_year.map_or_else(|| "-".to_string(), |v| v.to_string()),
            record.target,
            record.actual,
            record.yoy_growth,
            record.achievement_rate
        );
    }
    if report.records.len() > 5 {
        println!("  ... and {} more", report.records.len() - 5);
    }

    let totals = &report.totals;
    println!("\n=== Totals ===");
    println!("Last year: {}", totals.last_year);
    println!("Target:    {}", totals.target);
    println!("Actual:    {}", totals.actual);
    println!("YoY:       {}%", totals.yoy_growth);
    println!("Achieved:  {}%", totals.achievement_rate);

    let validation = &report.validation;
    println!("\n=== Validation ===");
    println!(
        "Valid: {} (score {:.1}%, {} duplicates, {} missing values)",
        validation.is_valid, validation.quality.score, validation.quality.duplicates, validation.quality.missing_values
    );
    for error in &validation.errors {
        println!("  ERROR {}", error);
    }
    for warning in &validation.warnings {
        println!("  WARN  {}", warning);
    }
    for info in &validation.info {
        println!("  INFO  {}", info);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if !args.json {
        println!("=== Salesboard Parser ===");
        match &args.file {
            Some(path) => println!("File: {}", path.display()),
            None => println!("File: built-in sample"),
        }
        if let Some(row) = args.header_row {
            println!("Header row: {} (manual)", row);
        }
    }

    let loaded = load(&args).await?;
    if !args.json {
        println!("Content size: {} bytes ({:?})", loaded.info.size_bytes, loaded.info.kind);
    }

    if args.candidates {
        let candidates = header_candidates(Source::Grid(&loaded.grid))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&candidates)?);
        } else {
            println!("\n{} header candidates", candidates.len());
            for candidate in &candidates {
                println!(
                    "  row {:>2} | confidence {:.2} | {}",
                    candidate.row_index,
                    candidate.confidence,
                    candidate.headers.join(", ")
                );
            }
        }
        return Ok(());
    }

    let report = loaded.report(args.header_row).context("Ingestion failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(path) = &args.csv {
        write_csv(path, &report.records)?;
        if !args.json {
            println!("\nWrote {} records to {}", report.records.len(), path.display());
        }
    }

    Ok(())
}
