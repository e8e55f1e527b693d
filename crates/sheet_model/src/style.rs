//! Text and shape styling

use serde::{Deserialize, Serialize};

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

/// Vertical alignment inside the element box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VerticalAlign {
    /// Flexbox `justify-content` keyword for a column layout
    pub fn as_flex(&self) -> &'static str {
        match self {
            VerticalAlign::Top => "flex-start",
            VerticalAlign::Middle => "center",
            VerticalAlign::Bottom => "flex-end",
        }
    }
}

/// Case transform applied after token substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseTransform {
    Upper,
    Lower,
    Title,
}

/// Value formatting applied to resolved text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextFormat {
    pub transform: Option<CaseTransform>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    /// Fixed number of decimals for numeric values
    pub decimals: Option<u8>,
    /// Group thousands with commas for numeric values
    pub thousands_separator: bool,
}

impl TextFormat {
    /// Whether this format changes anything
    pub fn is_identity(&self) -> bool {
        self.transform.is_none()
            && self.prefix.is_none()
            && self.suffix.is_none()
            && self.decimals.is_none()
            && !self.thousands_separator
    }
}

/// Text styling for text, data field, table and TOC content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: String,
    pub align: TextAlign,
    pub vertical_align: VerticalAlign,
    /// Line height as a multiple of the font size
    pub line_height: f64,
    pub format: TextFormat,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            font_size: 12.0,
            bold: false,
            italic: false,
            underline: false,
            color: "#000000".to_string(),
            align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_height: 1.2,
            format: TextFormat::default(),
        }
    }
}

impl TextStyle {
    pub fn with_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }
}

/// Shape primitive kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Line,
}

/// Fill and stroke for shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeStyle {
    pub shape: ShapeKind,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub corner_radius: f64,
    /// SVG dash pattern, e.g. `"4 2"`
    pub dash: Option<String>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Rectangle,
            fill: Some("#e5e7eb".to_string()),
            stroke: None,
            stroke_width: 1.0,
            corner_radius: 0.0,
            dash: None,
        }
    }
}
