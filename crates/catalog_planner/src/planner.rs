//! Catalog structure planning

use serde::{Deserialize, Serialize};
use sheet_model::{
    CatalogSections, CatalogStructureItem, ChapterDesign, DataSet, PageMapEntry, SectionKind,
};

use crate::title::resolve_title_column;
use crate::{PlanError, Result};

/// One page of the plan with its 1-based page number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedPage {
    pub page: usize,
    pub item: CatalogStructureItem,
}

/// Ordered pages of a catalog plus the TOC page map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPlan {
    pub entries: Vec<PlannedPage>,
    pub page_map: Vec<PageMapEntry>,
    /// Column the page map titles were read from
    pub title_column: Option<String>,
}

impl CatalogPlan {
    pub fn total_pages(&self) -> usize {
        self.entries.len()
    }

    pub fn product_count(&self) -> usize {
        self.entries.iter().filter(|e| e.item.is_product()).count()
    }

    pub fn chapter_count(&self) -> usize {
        self.entries.iter().filter(|e| e.item.is_chapter()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Structure items in page order
    pub fn items(&self) -> impl Iterator<Item = &CatalogStructureItem> {
        self.entries.iter().map(|e| &e.item)
    }
}

/// Accumulates entries while handing out sequential page numbers
struct PlanBuilder {
    next_page: usize,
    plan: CatalogPlan,
}

impl PlanBuilder {
    fn new() -> Self {
        Self { next_page: 1, plan: CatalogPlan::default() }
    }

    fn emit(&mut self, item: CatalogStructureItem) -> usize {
        let page = self.next_page;
        self.plan.entries.push(PlannedPage { page, item });
        self.next_page += 1;
        page
    }
}

/// Plan the page sequence of a catalog
///
/// Cover, TOC and back pages are emitted only when their section has
/// visible content. With a grouping column, a chapter divider precedes
/// each run of rows sharing a group value and takes its own page number.
pub fn plan_catalog(sections: &CatalogSections, data: &DataSet) -> Result<CatalogPlan> {
    let grouping = sections.grouping();
    if let Some(field) = grouping {
        if !data.has_header(field) {
            return Err(PlanError::UnknownGroupField(field.to_string()));
        }
    }

    let mut builder = PlanBuilder::new();

    if sections.has_content(SectionKind::Cover) {
        builder.emit(CatalogStructureItem::Cover);
    }
    if sections.has_content(SectionKind::Toc) {
        builder.emit(CatalogStructureItem::Toc);
    }

    let title_column = resolve_title_column(data.headers(), grouping).map(str::to_string);
    builder.plan.title_column = title_column.clone();

    let mut current_group: Option<String> = None;
    for (row_index, row) in data.rows().iter().enumerate() {
        if let Some(field) = grouping {
            let group = row.get(field).unwrap_or("");
            if current_group.as_deref() != Some(group) {
                let design = if sections.chapter_overrides.contains_key(group) {
                    ChapterDesign::Dedicated
                } else {
                    ChapterDesign::Default
                };
                builder.emit(CatalogStructureItem::Chapter { group: group.to_string(), design });
                current_group = Some(group.to_string());
            }
        }

        let title = title_column
            .as_deref()
            .and_then(|column| row.non_empty(column))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Item {}", row_index + 1));

        let page = builder.emit(CatalogStructureItem::Product { row_index });
        builder
            .plan
            .page_map
            .push(PageMapEntry::new(title, page, current_group.clone()));
    }

    if sections.has_content(SectionKind::Back) {
        builder.emit(CatalogStructureItem::Back);
    }

    let plan = builder.plan;
    if plan.is_empty() {
        return Err(PlanError::NoPages);
    }

    tracing::debug!(
        pages = plan.total_pages(),
        products = plan.product_count(),
        chapters = plan.chapter_count(),
        "Catalog planned"
    );

    Ok(plan)
}
