//! Errors raised by the import pipeline and the store.
//!
//! Normalization problems never show up here: unparseable dates and amounts
//! degrade to best-effort values, and duplicate fingerprints are counted in
//! the [`IngestSummary`](crate::ingest::IngestSummary), not raised.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// The CSV has data rows but no resolvable date and/or amount header.
    #[error("CSV must contain at least \"Date\" and \"Amount\" columns (found: {})", .headers.join(", "))]
    MissingRequiredColumns { headers: Vec<String> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Import timed out after {processed} rows; batch rolled back")]
    Timeout { processed: usize },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Transaction {0} not found")]
    NotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    /// True for errors caused by the uploaded file or query rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TrackerError::MissingRequiredColumns { .. }
                | TrackerError::Csv(_)
                | TrackerError::InvalidFilter(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
