//! Error types for Northstar

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Dataset payload is {size} bytes, over the {limit} byte limit; split the files and retry")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("{0}")]
    ValidationFailed(String),

    #[error("No import available to export")]
    NothingToExport,

    #[error("Export generation failed: {0}")]
    ExportGenerationFailed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::ExportGenerationFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
