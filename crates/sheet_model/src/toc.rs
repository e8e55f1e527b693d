//! Table-of-contents element settings

use serde::{Deserialize, Serialize};

use crate::style::TextStyle;

/// Settings carried by a `toc-list` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TocSettings {
    pub title: String,
    pub show_title: bool,
    /// Number of balanced columns, at least one
    pub columns: usize,
    /// Group entries under a header per distinct value
    pub group_by_field: Option<String>,
    pub title_height: f64,
    pub header_height: f64,
    pub entry_height: f64,
    pub column_gap: f64,
    /// Dotted leader between title and page number
    pub leader: bool,
    pub title_style: TextStyle,
    pub header_style: TextStyle,
    pub entry_style: TextStyle,
}

impl Default for TocSettings {
    fn default() -> Self {
        Self {
            title: "Contents".to_string(),
            show_title: true,
            columns: 1,
            group_by_field: None,
            title_height: 40.0,
            header_height: 24.0,
            entry_height: 18.0,
            column_gap: 24.0,
            leader: true,
            title_style: TextStyle::default().with_size(20.0).bold(),
            header_style: TextStyle::default().with_size(13.0).bold(),
            entry_style: TextStyle::default(),
        }
    }
}

impl TocSettings {
    /// Column count clamped to at least one
    pub fn column_count(&self) -> usize {
        self.columns.max(1)
    }
}
