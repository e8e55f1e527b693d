//! Page document types

use reflow_engine::Rect;
use serde::{Deserialize, Serialize};
use sheet_model::{ImageFit, PageSize, ShapeStyle, TextStyle};

use crate::table::TableContent;
use crate::toc::TocContent;
use crate::watermark::Watermark;

/// One fully resolved page, ready for serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    pub page_index: usize,
    pub width: f64,
    pub height: f64,
    pub background: String,
    /// Items in paint order (ascending z-index)
    pub items: Vec<RenderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Watermark>,
    /// Stand-in for a page whose build failed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

impl PageDocument {
    pub fn new(page_index: usize, page: PageSize, background: impl Into<String>) -> Self {
        Self {
            page_index,
            width: page.width,
            height: page.height,
            background: background.into(),
            items: Vec::new(),
            watermark: None,
            placeholder: false,
        }
    }

    /// An empty page standing in for one that failed to build
    pub fn placeholder(page_index: usize, page: PageSize) -> Self {
        Self { placeholder: true, ..Self::new(page_index, page, "#ffffff") }
    }

    pub fn item(&self, element_id: &str) -> Option<&RenderItem> {
        self.items.iter().find(|item| item.element_id == element_id)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A positioned, resolved element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderItem {
    pub element_id: String,
    pub bounds: Rect,
    pub rotation: f64,
    pub z_index: i32,
    pub content: ItemContent,
}

/// Resolved payload of a render item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ItemContent {
    /// Text and data fields after substitution and formatting
    Text { text: String, style: TextStyle },
    Image {
        src: String,
        fit: ImageFit,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    Shape { style: ShapeStyle },
    /// Self-contained SVG markup
    QrCode { svg: String },
    Table(TableContent),
    TocList(TocContent),
}

impl ItemContent {
    /// Text of a text item
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ItemContent::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}
