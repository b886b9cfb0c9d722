//! Collector - Fetches sales sheets published on the web
//!
//! Responsibilities:
//! - Rewrite Google Sheets share links to their CSV export URL
//! - Fetch directly, then through public CORS proxies when the direct fetch fails
//! - Hash and describe what was fetched
//!
//! The fetched text goes through the same ingestion pipeline as uploads.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use salesboard_parser::text_grid::decode_bytes;
use salesboard_parser::{LoadedSheet, SourceKind};

// =============================================================================
// Configuration
// =============================================================================

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "salesboard-collector/0.1";
const ACCEPT: &str = "text/csv,text/plain,*/*";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Fall back to public proxies when the direct fetch fails.
    pub use_proxies: bool,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_proxies: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// FETCH_TIMEOUT_SECS, FETCH_USE_PROXIES, FETCH_USER_AGENT. Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            timeout: lookup("FETCH_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            use_proxies: lookup("FETCH_USE_PROXIES")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.use_proxies),
            user_agent: lookup("FETCH_USER_AGENT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL '{0}': expected an http(s) address")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("all {attempts} fetch attempt(s) failed; last error: {last}. Check that the sheet is published and the URL is correct")]
    AllCandidatesFailed { attempts: usize, last: String },
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::Client(_) => "client",
            FetchError::AllCandidatesFailed { .. } => "fetch_failed",
        }
    }
}

// =============================================================================
// URL handling
// =============================================================================

fn sheets_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https://docs\.google\.com/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("static pattern"))
}

fn gid_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[#&]gid=([0-9]+)").expect("static pattern"))
}

/// CSV export URL for a Google Sheets link; any other URL is returned unchanged.
/// The sheet tab comes from `#gid=` / `&gid=`, defaulting to the first tab.
pub fn google_sheets_csv_url(url: &str) -> String {
    let Some(id) = sheets_pattern().captures(url).map(|c| c[1].to_string()) else {
        return url.to_string();
    };
    let gid = gid_pattern()
        .captures(url)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "0".to_string());

    format!("https://docs.google.com/spreadsheets/d/{id}/export?format=csv&gid={gid}")
}

/// URLs to try, in order: the export URL itself, then each proxy wrapping it.
pub fn candidate_urls(csv_url: &str, use_proxies: bool) -> Vec<String> {
    let mut candidates = vec![csv_url.to_string()];
    if !use_proxies {
        return candidates;
    }

    let mut allorigins = Url::parse("https://api.allorigins.win/raw").expect("static URL");
    allorigins.query_pairs_mut().append_pair("url", csv_url);
    candidates.push(allorigins.into());

    candidates.push(format!("https://thingproxy.freeboard.io/fetch/{csv_url}"));

    let without_scheme = csv_url
        .strip_prefix("https://")
        .or_else(|| csv_url.strip_prefix("http://"))
        .unwrap_or(csv_url);
    candidates.push(format!("https://r.jina.ai/http://{without_scheme}"));

    candidates
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

// =============================================================================
// Fetching
// =============================================================================

/// A fetched sheet with its provenance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedSource {
    pub requested_url: String,
    /// The candidate URL that answered, possibly a proxy.
    pub fetched_url: String,
    pub fetched_at: DateTime<Utc>,
    pub content_hash: String,
    pub mime_type: String,
    pub size_bytes: usize,
    #[serde(skip)]
    pub text: String,
}

impl FetchedSource {
    pub fn into_sheet(self) -> salesboard_parser::Result<LoadedSheet> {
        let mut loaded = LoadedSheet::from_text(&self.requested_url, SourceKind::Url, &self.text)?;
        loaded.info.size_bytes = self.size_bytes;
        Ok(loaded)
    }
}

pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url` as text, trying each candidate until one returns a non-blank body.
    pub async fn fetch(&self, url: &str) -> Result<FetchedSource, FetchError> {
        let url = url.trim();
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(FetchError::InvalidUrl(url.to_string())),
        }

        let csv_url = google_sheets_csv_url(url);
        if csv_url != url {
            debug!(from = url, to = %csv_url, "rewrote Google Sheets link");
        }

        let candidates = candidate_urls(&csv_url, self.config.use_proxies);
        let mut last = String::new();

        for (attempt, candidate) in candidates.iter().enumerate() {
            match self.try_candidate(candidate).await {
                Ok((mime_type, bytes)) => {
                    let source = FetchedSource {
                        requested_url: url.to_string(),
                        fetched_url: candidate.clone(),
                        fetched_at: Utc::now(),
                        content_hash: content_hash(&bytes),
                        mime_type,
                        size_bytes: bytes.len(),
                        text: decode_bytes(&bytes),
                    };
                    info!(
                        url = %candidate,
                        attempt = attempt + 1,
                        bytes = source.size_bytes,
                        hash = %source.content_hash,
                        "fetched sheet"
                    );
                    return Ok(source);
                }
                Err(reason) => {
                    warn!(url = %candidate, attempt = attempt + 1, %reason, "fetch attempt failed");
                    last = reason;
                }
            }
        }

        Err(FetchError::AllCandidatesFailed {
            attempts: candidates.len(),
            last,
        })
    }

    async fn try_candidate(&self, url: &str) -> Result<(String, Vec<u8>), String> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        let mime = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/plain")
            .to_string();

        let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
        if decode_bytes(&bytes).trim().is_empty() {
            return Err("empty response body".to_string());
        }

        Ok((mime, bytes.to_vec()))
    }
}
