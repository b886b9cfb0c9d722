//! API Service - Sales sheet ingestion over HTTP
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /sample - Ingestion result for the built-in demo sheet
//! - POST /ingest/csv - Ingest an uploaded CSV body
//! - POST /ingest/workbook - Ingest an uploaded workbook body
//! - GET /ingest/url - Fetch a published sheet and ingest it

use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use salesboard_collector::{FetchConfig, FetchError, FetchedSource, Fetcher};
use salesboard_parser::sample::sample_grid;
use salesboard_parser::{IngestError, IngestReport, LoadedSheet, SourceInfo, SourceKind};

// ============================================================================
// Config & state
// ============================================================================

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
struct Config {
    bind: String,
    max_upload_bytes: usize,
    fetch: FetchConfig,
}

impl Config {
    fn from_env() -> Self {
        Self {
            bind: std::env::var("API_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            max_upload_bytes: std::env::var("API_MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            fetch: FetchConfig::from_env(),
        }
    }
}

struct AppState {
    fetcher: Fetcher,
}

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct CsvQuery {
    header_row: Option<usize>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkbookQuery {
    sheet: Option<String>,
    header_row: Option<usize>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlQuery {
    url: String,
    header_row: Option<usize>,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

#[derive(Serialize)]
struct IngestResponse {
    #[serde(flatten)]
    report: IngestReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    fetch: Option<FetchedSource>,
}

impl From<IngestReport> for IngestResponse {
    fn from(report: IngestReport) -> Self {
        Self { report, fetch: None }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
    detail: serde_json::Value,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
enum ApiError {
    Ingest(IngestError),
    Fetch(FetchError),
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        ApiError::Ingest(err)
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::Fetch(err)
    }
}

fn ingest_detail(err: &IngestError) -> serde_json::Value {
    match err {
        IngestError::InsufficientData { lines } => json!({ "lines": lines }),
        IngestError::MissingProductColumn { header_row, headers } => {
            json!({ "headerRow": header_row, "headers": headers })
        }
        IngestError::NoValidRows { header_row, confidence } => {
            json!({ "headerRow": header_row, "confidence": confidence })
        }
        IngestError::SheetNotFound(sheet) => json!({ "sheet": sheet }),
        _ => serde_json::Value::Null,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Ingest(err) => {
                let status = if err.is_decode_failure() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::UNPROCESSABLE_ENTITY
                };
                (
                    status,
                    ErrorResponse {
                        error: err.to_string(),
                        kind: err.kind(),
                        detail: ingest_detail(err),
                    },
                )
            }
            ApiError::Fetch(err) => {
                let (status, detail) = match err {
                    FetchError::InvalidUrl(url) => (StatusCode::BAD_REQUEST, json!({ "url": url })),
                    FetchError::AllCandidatesFailed { attempts, .. } => {
                        (StatusCode::BAD_GATEWAY, json!({ "attempts": attempts }))
                    }
                    FetchError::Client(_) => (StatusCode::BAD_GATEWAY, serde_json::Value::Null),
                };
                (
                    status,
                    ErrorResponse {
                        error: err.to_string(),
                        kind: err.kind(),
                        detail,
                    },
                )
            }
        };

        warn!(status = status.as_u16(), kind = body.kind, error = %body.error, "request failed");
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<IngestResponse>, ApiError>;

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn sample_handler() -> ApiResult {
    let grid = sample_grid();
    let info = SourceInfo::new("sample", SourceKind::Csv, 0, &grid);
    let report = IngestReport::build(&grid, info, None)?;
    Ok(Json(report.into()))
}

async fn ingest_csv_handler(Query(params): Query<CsvQuery>, body: Bytes) -> ApiResult {
    let name = params.name.as_deref().unwrap_or("upload.csv");
    let sheet = LoadedSheet::from_csv_bytes(name, &body)?;
    let report = sheet.report(params.header_row)?;
    info!(name, records = report.records.len(), "ingested CSV upload");
    Ok(Json(report.into()))
}

async fn ingest_workbook_handler(Query(params): Query<WorkbookQuery>, body: Bytes) -> ApiResult {
    let name = params.name.as_deref().unwrap_or("upload.xlsx");
    let sheet = LoadedSheet::from_workbook_bytes(name, body.to_vec(), params.sheet.as_deref())?;
    let report = sheet.report(params.header_row)?;
    info!(name, sheet = %report.source.sheet, records = report.records.len(), "ingested workbook upload");
    Ok(Json(report.into()))
}

async fn ingest_url_handler(State(state): State<Arc<AppState>>, Query(params): Query<UrlQuery>) -> ApiResult {
    let fetched = state.fetcher.fetch(&params.url).await?;
    let sheet = fetched.clone().into_sheet()?;
    let report = sheet.report(params.header_row)?;
    info!(url = %params.url, records = report.records.len(), "ingested fetched sheet");
    Ok(Json(IngestResponse {
        report,
        fetch: Some(fetched),
    }))
}

fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    // CORS for web frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/sample", get(sample_handler))
        .route("/ingest/csv", post(ingest_csv_handler))
        .route("/ingest/workbook", post(ingest_workbook_handler))
        .route("/ingest/url", get(ingest_url_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();

    println!("=== Salesboard API ===");
    println!(
        "Fetch: timeout {}s, proxies {}",
        config.fetch.timeout.as_secs(),
        if config.fetch.use_proxies { "enabled" } else { "disabled" }
    );

    let fetcher = Fetcher::new(config.fetch.clone()).context("Failed to build HTTP client")?;
    let state = Arc::new(AppState { fetcher });
    let app = router(state, config.max_upload_bytes);

    println!("API listening on http://{}", config.bind);
    println!("\nEndpoints:");
    println!("  GET  /health");
    println!("  GET  /sample");
    println!("  POST /ingest/csv?header_row=&name=");
    println!("  POST /ingest/workbook?sheet=&header_row=&name=");
    println!("  GET  /ingest/url?url=&header_row=");

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    axum::serve(listener, app).await?;

    Ok(())
}
