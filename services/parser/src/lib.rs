//! Sales sheet ingestion
//!
//! Turns an uploaded spreadsheet or fetched CSV text into normalized
//! per-product sales records:
//! - Decode text or workbook bytes into a grid of cells
//! - Locate the header row among noisy leading rows
//! - Map free-text column labels to product / last year / target / actual
//! - Coerce cell values into numbers and derive growth and achievement
//!
//! Same grid + same header choice = same records. Nothing is persisted.

pub mod cell;
pub mod columns;
pub mod error;
pub mod header;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod rows;
pub mod sample;
pub mod summary;
pub mod text_grid;
pub mod validate;
pub mod workbook;

pub use cell::{Cell, Grid};
pub use columns::{ColumnMap, SemanticField};
pub use error::{IngestError, Result};
pub use header::HeaderCandidate;
pub use loader::{is_workbook, LoadedSheet};
pub use pipeline::{header_candidates, ingest, ingest_detailed, Ingested, Source, SourceInfo, SourceKind};
pub use report::IngestReport;
pub use rows::SalesRecord;
pub use summary::{summarize, SalesTotals};
pub use validate::{validate, ValidationReport};
pub use workbook::Workbook;
