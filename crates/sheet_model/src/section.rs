//! Single-page templates and catalog sections

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Page size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// A4 portrait at 96 dpi
    pub const A4: PageSize = PageSize { width: 794.0, height: 1123.0 };
    /// US Letter portrait at 96 dpi
    pub const LETTER: PageSize = PageSize { width: 816.0, height: 1056.0 };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

fn default_background() -> String {
    "#ffffff".to_string()
}

/// A designed page: elements plus background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default = "default_background")]
    pub background: String,
}

impl Default for Section {
    fn default() -> Self {
        Self { elements: Vec::new(), background: default_background() }
    }
}

impl Section {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements, ..Default::default() }
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    /// A section has content when at least one element is visible
    pub fn has_content(&self) -> bool {
        self.elements.iter().any(|e| e.visible)
    }
}

/// The named sections of a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Cover,
    Toc,
    Chapter,
    Product,
    Back,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Cover => "cover",
            SectionKind::Toc => "toc",
            SectionKind::Chapter => "chapter",
            SectionKind::Product => "product",
            SectionKind::Back => "back",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input of a single-page export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub page: PageSize,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Template {
    pub fn new(page: PageSize, elements: Vec<Element>) -> Self {
        Self { page, background: default_background(), elements }
    }

    /// Elements scheduled for one page of the template
    pub fn page_elements(&self, page_index: usize) -> Vec<Element> {
        self.elements
            .iter()
            .filter(|e| e.page_index == page_index)
            .cloned()
            .collect()
    }

    /// Number of template pages implied by element page indices
    pub fn page_count(&self) -> usize {
        self.elements.iter().map(|e| e.page_index + 1).max().unwrap_or(1)
    }
}

/// Input of a catalog export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSections {
    #[serde(default)]
    pub page: PageSize,
    #[serde(default)]
    pub cover: Option<Section>,
    #[serde(default)]
    pub toc: Option<Section>,
    #[serde(default)]
    pub chapter: Option<Section>,
    #[serde(default)]
    pub product: Option<Section>,
    #[serde(default)]
    pub back: Option<Section>,
    /// Dedicated chapter designs keyed by group value
    #[serde(default)]
    pub chapter_overrides: HashMap<String, Section>,
    #[serde(default)]
    pub group_by_field: Option<String>,
}

impl CatalogSections {
    /// Look up a named section
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        match kind {
            SectionKind::Cover => self.cover.as_ref(),
            SectionKind::Toc => self.toc.as_ref(),
            SectionKind::Chapter => self.chapter.as_ref(),
            SectionKind::Product => self.product.as_ref(),
            SectionKind::Back => self.back.as_ref(),
        }
    }

    /// Whether the named section exists and has visible content
    pub fn has_content(&self, kind: SectionKind) -> bool {
        self.section(kind).map(Section::has_content).unwrap_or(false)
    }

    /// Chapter design for a group, falling back to the default chapter
    pub fn chapter_for(&self, group: &str) -> Option<&Section> {
        self.chapter_overrides.get(group).or(self.chapter.as_ref())
    }

    /// Grouping column, ignoring blank names
    pub fn grouping(&self) -> Option<&str> {
        self.group_by_field.as_deref().filter(|f| !f.trim().is_empty())
    }
}
