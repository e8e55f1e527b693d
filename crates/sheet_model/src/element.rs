//! Template elements placed on a page by the editor

use serde::{Deserialize, Serialize};

use crate::style::{ShapeStyle, TextStyle};
use crate::table::TableSettings;
use crate::toc::TocSettings;

/// Top-left corner of an element in page pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Design-time size of an element in page pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

/// How an image fills its box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    #[default]
    Contain,
    Cover,
    Fill,
}

impl ImageFit {
    /// CSS `object-fit` keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFit::Contain => "contain",
            ImageFit::Cover => "cover",
            ImageFit::Fill => "fill",
        }
    }
}

fn default_foreground() -> String {
    "#000000".to_string()
}

fn default_background() -> String {
    "#ffffff".to_string()
}

/// Type-specific element payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    /// Static text, may contain `{{Field}}` tokens
    Text {
        content: String,
        #[serde(default)]
        style: TextStyle,
    },
    /// A bound dataset column, optionally wrapped in a template
    #[serde(rename_all = "camelCase")]
    DataField {
        field: String,
        /// Template such as `"Price: {{Price}}"`; defaults to the bare field
        #[serde(default)]
        template: Option<String>,
        #[serde(default)]
        style: TextStyle,
    },
    /// Raster image referenced by URL, path or `data:` URI
    Image {
        src: String,
        #[serde(default)]
        fit: ImageFit,
        #[serde(default)]
        alt: Option<String>,
    },
    /// Vector primitive
    Shape {
        #[serde(default)]
        style: ShapeStyle,
    },
    /// QR code built from a token-substituted payload
    Qrcode {
        payload: String,
        #[serde(default = "default_foreground")]
        foreground: String,
        #[serde(default = "default_background")]
        background: String,
    },
    /// Static or data-bound table
    Table { settings: TableSettings },
    /// Table-of-contents listing fed by the catalog page map
    #[serde(rename = "toc-list")]
    TocList { settings: TocSettings },
}

/// Discriminant of [`ElementKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Text,
    DataField,
    Image,
    Shape,
    Qrcode,
    Table,
    TocList,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Text => "text",
            ElementType::DataField => "dataField",
            ElementType::Image => "image",
            ElementType::Shape => "shape",
            ElementType::Qrcode => "qrcode",
            ElementType::Table => "table",
            ElementType::TocList => "toc-list",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_visible() -> bool {
    true
}

/// A positioned element on a template page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    #[serde(flatten)]
    pub kind: ElementKind,
    pub position: Position,
    pub dimension: Dimension,
    /// Rotation in degrees (clockwise)
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub page_index: usize,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

impl Element {
    /// Create a visible, unlocked element at the given rectangle
    pub fn new(id: impl Into<String>, kind: ElementKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            position: Position { x, y },
            dimension: Dimension { width, height },
            rotation: 0.0,
            z_index: 0,
            page_index: 0,
            visible: true,
            locked: false,
        }
    }

    /// Create a text element
    pub fn text(id: impl Into<String>, content: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(
            id,
            ElementKind::Text { content: content.into(), style: TextStyle::default() },
            x,
            y,
            width,
            height,
        )
    }

    /// Create a table element
    pub fn table(id: impl Into<String>, settings: TableSettings, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(id, ElementKind::Table { settings }, x, y, width, height)
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn on_page(mut self, page_index: usize) -> Self {
        self.page_index = page_index;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Get the element type
    pub fn element_type(&self) -> ElementType {
        match self.kind {
            ElementKind::Text { .. } => ElementType::Text,
            ElementKind::DataField { .. } => ElementType::DataField,
            ElementKind::Image { .. } => ElementType::Image,
            ElementKind::Shape { .. } => ElementType::Shape,
            ElementKind::Qrcode { .. } => ElementType::Qrcode,
            ElementKind::Table { .. } => ElementType::Table,
            ElementKind::TocList { .. } => ElementType::TocList,
        }
    }

    /// Table settings, if this is a table
    pub fn table_settings(&self) -> Option<&TableSettings> {
        match &self.kind {
            ElementKind::Table { settings } => Some(settings),
            _ => None,
        }
    }

    /// Whether this is a table whose height follows its bound data
    pub fn is_driver_table(&self) -> bool {
        self.table_settings()
            .map(|settings| settings.auto_height_adaptation)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableVariant;

    #[test]
    fn test_deserialize_editor_json() {
        let json = r#"{
            "id": "title",
            "type": "dataField",
            "field": "Name",
            "position": {"x": 10, "y": 20},
            "dimension": {"width": 200, "height": 30},
            "zIndex": 3
        }"#;

        let element: Element = serde_json::from_str(json).unwrap();
        assert_eq!(element.id, "title");
        assert_eq!(element.element_type(), ElementType::DataField);
        assert_eq!(element.z_index, 3);
        assert!(element.visible);
        assert!(!element.locked);
        assert_eq!(element.position.y, 20.0);
    }

    #[test]
    fn test_toc_list_tag() {
        let json = r#"{
            "id": "toc",
            "type": "toc-list",
            "settings": {"title": "Contents"},
            "position": {"x": 0, "y": 0},
            "dimension": {"width": 500, "height": 800}
        }"#;

        let element: Element = serde_json::from_str(json).unwrap();
        assert_eq!(element.element_type(), ElementType::TocList);

        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["type"], "toc-list");
    }

    #[test]
    fn test_driver_table_detection() {
        let mut settings = TableSettings::data(vec![]);
        assert!(!Element::table("t", settings.clone(), 0.0, 0.0, 10.0, 10.0).is_driver_table());

        settings.auto_height_adaptation = true;
        let table = Element::table("t", settings, 0.0, 0.0, 10.0, 10.0);
        assert!(table.is_driver_table());
        assert_eq!(table.table_settings().unwrap().variant, TableVariant::Data);

        let text = Element::text("x", "hello", 0.0, 0.0, 10.0, 10.0);
        assert!(!text.is_driver_table());
    }

    #[test]
    fn test_builders() {
        let element = Element::text("x", "hi", 1.0, 2.0, 3.0, 4.0)
            .with_z_index(5)
            .with_rotation(90.0)
            .on_page(2)
            .locked()
            .hidden();

        assert_eq!(element.z_index, 5);
        assert_eq!(element.rotation, 90.0);
        assert_eq!(element.page_index, 2);
        assert!(element.locked);
        assert!(!element.visible);
    }
}
