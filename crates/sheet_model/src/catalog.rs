//! Catalog structure entries and the TOC page map

use serde::{Deserialize, Serialize};

/// Which design a chapter divider uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterDesign {
    /// The shared chapter section
    Default,
    /// The group's dedicated override section
    Dedicated,
}

/// One page-producing entry of a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CatalogStructureItem {
    Cover,
    Toc,
    Chapter { group: String, design: ChapterDesign },
    Product { row_index: usize },
    Back,
}

impl CatalogStructureItem {
    pub fn is_product(&self) -> bool {
        matches!(self, CatalogStructureItem::Product { .. })
    }

    pub fn is_chapter(&self) -> bool {
        matches!(self, CatalogStructureItem::Chapter { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            CatalogStructureItem::Cover => "cover",
            CatalogStructureItem::Toc => "toc",
            CatalogStructureItem::Chapter { .. } => "chapter",
            CatalogStructureItem::Product { .. } => "product",
            CatalogStructureItem::Back => "back",
        }
    }
}

/// A product's title and page number, used to fill the TOC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMapEntry {
    pub title: String,
    /// 1-based page number
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl PageMapEntry {
    pub fn new(title: impl Into<String>, page: usize, group: Option<String>) -> Self {
        Self { title: title.into(), page, group }
    }
}
