//! Error types for the reflow engine

use thiserror::Error;

/// Errors that can occur while reflowing a page
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Height function failed for a driver table
    #[error("Height calculation failed for element '{element_id}' on page {page_index}: {message}")]
    HeightCalculation {
        element_id: String,
        page_index: usize,
        message: String,
    },

    /// Table settings cannot be laid out
    #[error("Malformed table '{element_id}' on page {page_index}: {message}")]
    MalformedTable {
        element_id: String,
        page_index: usize,
        message: String,
    },
}

impl LayoutError {
    /// Page index the failure belongs to
    pub fn page_index(&self) -> usize {
        match self {
            LayoutError::HeightCalculation { page_index, .. }
            | LayoutError::MalformedTable { page_index, .. } => *page_index,
        }
    }

    /// Element that caused the failure
    pub fn element_id(&self) -> &str {
        match self {
            LayoutError::HeightCalculation { element_id, .. }
            | LayoutError::MalformedTable { element_id, .. } => element_id,
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
