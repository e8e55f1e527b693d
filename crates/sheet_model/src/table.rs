//! Table element settings

use serde::{Deserialize, Serialize};

use crate::style::{TextAlign, TextStyle};

/// Where a table takes its rows from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableVariant {
    /// One row per dataset record
    #[default]
    Data,
    /// Static label/value rows whose values may contain tokens
    Properties,
}

/// A column of a data-bound table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub header: String,
    /// Dataset column this table column reads
    pub field: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub align: TextAlign,
}

impl TableColumn {
    pub fn new(header: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            field: field.into(),
            width: None,
            align: TextAlign::Left,
        }
    }
}

/// A static row of a properties table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRow {
    pub label: String,
    /// Value template, e.g. `"{{Weight}} kg"`
    pub value: String,
}

impl PropertyRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }
}

fn default_header_height() -> f64 {
    20.0
}

fn default_row_height() -> f64 {
    20.0
}

fn default_true() -> bool {
    true
}

/// Settings carried by a table element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSettings {
    #[serde(default)]
    pub variant: TableVariant,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
    #[serde(default)]
    pub properties: Vec<PropertyRow>,
    #[serde(default = "default_header_height")]
    pub header_height: f64,
    #[serde(default = "default_row_height")]
    pub row_height: f64,
    #[serde(default = "default_true")]
    pub show_header: bool,
    /// Upper bound on rendered data rows
    #[serde(default)]
    pub max_rows: Option<usize>,
    /// Height follows the bound row count instead of the design height
    #[serde(default)]
    pub auto_height_adaptation: bool,
    /// Restrict rows to those sharing the current record's value of this column
    #[serde(default)]
    pub group_by_field: Option<String>,
    #[serde(default)]
    pub stripe_color: Option<String>,
    #[serde(default)]
    pub border_color: Option<String>,
    #[serde(default)]
    pub header_style: TextStyle,
    #[serde(default)]
    pub body_style: TextStyle,
}

impl TableSettings {
    /// Data-bound table over the given columns
    pub fn data(columns: Vec<TableColumn>) -> Self {
        Self {
            variant: TableVariant::Data,
            columns,
            properties: Vec::new(),
            header_height: default_header_height(),
            row_height: default_row_height(),
            show_header: true,
            max_rows: None,
            auto_height_adaptation: false,
            group_by_field: None,
            stripe_color: None,
            border_color: None,
            header_style: TextStyle::default().bold(),
            body_style: TextStyle::default(),
        }
    }

    /// Static properties table
    pub fn properties(rows: Vec<PropertyRow>) -> Self {
        Self {
            variant: TableVariant::Properties,
            properties: rows,
            show_header: false,
            ..Self::data(Vec::new())
        }
    }

    pub fn auto_height(mut self) -> Self {
        self.auto_height_adaptation = true;
        self
    }

    pub fn grouped_by(mut self, field: impl Into<String>) -> Self {
        self.group_by_field = Some(field.into());
        self
    }

    pub fn with_row_height(mut self, header_height: f64, row_height: f64) -> Self {
        self.header_height = header_height;
        self.row_height = row_height;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Header height when the header is shown, otherwise zero
    pub fn effective_header_height(&self) -> f64 {
        if self.show_header && self.variant == TableVariant::Data {
            self.header_height
        } else {
            0.0
        }
    }
}
