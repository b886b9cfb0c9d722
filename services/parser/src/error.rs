use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Every way an ingestion can fail. Row-level skips are not errors.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("insufficient data: found {lines} usable line(s), need a header and at least one data row")]
    InsufficientData { lines: usize },

    #[error("no header row found in the first rows of the sheet")]
    NoHeaderFound,

    #[error("no product column found in header row {header_row}; detected headers: {}", .headers.join(", "))]
    MissingProductColumn {
        header_row: usize,
        headers: Vec<String>,
    },

    #[error("no valid rows below header row {header_row} (confidence {confidence:.2})")]
    NoValidRows { header_row: usize, confidence: f64 },

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
}

impl IngestError {
    /// Stable identifier for API clients that render their own remediation text.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::InsufficientData { .. } => "insufficient_data",
            IngestError::NoHeaderFound => "no_header_found",
            IngestError::MissingProductColumn { .. } => "missing_product_column",
            IngestError::NoValidRows { .. } => "no_valid_rows",
            IngestError::NoSheets => "no_sheets",
            IngestError::SheetNotFound(_) => "sheet_not_found",
            IngestError::Workbook(_) => "unreadable_workbook",
        }
    }

    /// True for failures caused by the bytes not being a workbook at all,
    /// as opposed to a workbook whose contents could not be ingested.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, IngestError::Workbook(_) | IngestError::NoSheets)
    }
}
