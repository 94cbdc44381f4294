//! Error types for Waypoint

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Extraction unavailable: {0}")]
    ExtractionUnavailable(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Extraction errors are recovered per-file by substituting a fallback
    /// record; everything else aborts the operation.
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            Error::ExtractionUnavailable(_) | Error::ExtractionFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
