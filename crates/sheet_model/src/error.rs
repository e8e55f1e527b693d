//! Error types for model loading

use thiserror::Error;

/// Errors that can occur while loading templates or datasets
#[derive(Debug, Error)]
pub enum ModelError {
    /// IO error reading files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing CSV data
    #[error("CSV parse error: {0}")]
    CsvParse(#[from] csv::Error),

    /// Error parsing JSON data
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Dataset shape is not usable
    #[error("Invalid dataset: {0}")]
    InvalidDataSet(String),

    /// Duplicate header names
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
