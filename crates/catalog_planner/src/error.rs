//! Error types for catalog planning

use thiserror::Error;

/// Errors that can occur while planning a catalog
#[derive(Debug, Error)]
pub enum PlanError {
    /// Grouping column missing from the dataset headers
    #[error("Group field '{0}' is not a dataset column")]
    UnknownGroupField(String),

    /// No section produced a page
    #[error("Catalog has no pages to build")]
    NoPages,
}

pub type Result<T> = std::result::Result<T, PlanError>;
