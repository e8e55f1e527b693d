//! Planning, reflow and rendering of whole exports

use catalog_planner::{plan_catalog, CatalogPlan};
use page_render::{PageContext, PageDocument, PageRenderer, RenderOptions};
use reflow_engine::{ReflowEngine, RowHeightCalculator, TableHeightFn};
use serde::{Deserialize, Serialize};
use sheet_model::{
    CatalogSections, CatalogStructureItem, DataSet, Element, PageMapEntry, PageSize, Row, Section, Template,
};

use crate::{ExportError, Result};

/// What to do when one page of a multi-page build fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Put a blank placeholder in the failed page's slot and keep going
    #[default]
    ContinueAndReport,
    /// Fail the whole build on the first page error
    Abort,
}

/// A page that was replaced by a placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    /// Output page index
    pub page: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub total_pages: usize,
    pub failures: Vec<PageFailure>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pages of a single-template export
#[derive(Debug, Clone)]
pub struct Build {
    pub pages: Vec<PageDocument>,
    pub report: BuildReport,
}

/// Pages of a catalog export together with the plan they follow
#[derive(Debug, Clone)]
pub struct CatalogBuild {
    pub pages: Vec<PageDocument>,
    pub plan: CatalogPlan,
    /// Product page numbers as printed in the built pages
    pub page_map: Vec<PageMapEntry>,
    pub report: BuildReport,
}

/// Runs reflow and rendering for every page of an export
#[derive(Debug, Clone, Default)]
pub struct CatalogAssembler<H = RowHeightCalculator> {
    reflow: ReflowEngine<H>,
    renderer: PageRenderer,
    policy: FailurePolicy,
}

impl CatalogAssembler<RowHeightCalculator> {
    pub fn new(options: RenderOptions, policy: FailurePolicy) -> Self {
        Self { reflow: ReflowEngine::new(), renderer: PageRenderer::new(options), policy }
    }
}

impl<H: TableHeightFn> CatalogAssembler<H> {
    /// Use a custom height function for driver tables
    pub fn with_height_fn(height_fn: H, options: RenderOptions, policy: FailurePolicy) -> Self {
        Self {
            reflow: ReflowEngine::with_height_fn(height_fn),
            renderer: PageRenderer::new(options),
            policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Build every page of a template bound to one record
    pub fn build_single(&self, template: &Template, data: &DataSet, record: Option<&Row>) -> Result<Build> {
        let mut collector = PageCollector::new(self.policy, template.page);

        for page_index in 0..template.page_count() {
            let elements = template.page_elements(page_index);
            let ctx = PageContext::new(page_index, template.page, &template.background, data).with_record(record);
            collector.push(self.render_page(&elements, &ctx))?;
        }

        let (pages, report) = collector.finish()?;
        tracing::debug!(pages = pages.len(), failures = report.failures.len(), "Single export built");
        Ok(Build { pages, report })
    }

    /// Plan and build a catalog
    ///
    /// TOC sections may spill over several pages. Every page after the TOC
    /// moves back by the number of extra TOC pages, and the TOC lists the
    /// moved numbers. The returned plan keeps the planned numbering.
    pub fn build_catalog(&self, sections: &CatalogSections, data: &DataSet) -> Result<CatalogBuild> {
        let plan = plan_catalog(sections, data)?;
        let empty = Section::default();
        let page_map = self.printed_page_map(sections, &plan, &empty);
        let mut collector = PageCollector::new(self.policy, sections.page);

        for (position, planned) in plan.entries.iter().enumerate() {
            let (section, record) = match &planned.item {
                CatalogStructureItem::Cover => (sections.cover.as_ref(), None),
                CatalogStructureItem::Toc => (sections.toc.as_ref(), None),
                CatalogStructureItem::Chapter { group, .. } => {
                    // bound to the first product of its run
                    let record = plan.entries.get(position + 1).and_then(|next| match next.item {
                        CatalogStructureItem::Product { row_index } => data.row(row_index),
                        _ => None,
                    });
                    (sections.chapter_for(group), record)
                }
                CatalogStructureItem::Product { row_index } => (sections.product.as_ref(), data.row(*row_index)),
                CatalogStructureItem::Back => (sections.back.as_ref(), None),
            };
            let section = section.unwrap_or(&empty);

            let toc_pages = match planned.item {
                CatalogStructureItem::Toc => self.renderer.toc_page_count(&section.elements, &page_map),
                _ => 1,
            };

            for toc_page in 0..toc_pages {
                let ctx = PageContext::new(collector.next_index(), sections.page, &section.background, data)
                    .with_record(record)
                    .with_page_map(&page_map)
                    .with_toc_page(toc_page);
                collector.push(self.render_page(&section.elements, &ctx))?;
            }
        }

        let (pages, report) = collector.finish()?;
        tracing::info!(
            pages = pages.len(),
            products = plan.product_count(),
            chapters = plan.chapter_count(),
            failures = report.failures.len(),
            "Catalog built"
        );
        Ok(CatalogBuild { pages, plan, page_map, report })
    }

    /// Page map shifted past the extra pages an overflowing TOC takes
    fn printed_page_map(&self, sections: &CatalogSections, plan: &CatalogPlan, empty: &Section) -> Vec<PageMapEntry> {
        let mut page_map = plan.page_map.clone();
        let Some(toc) = plan.entries.iter().find(|e| matches!(e.item, CatalogStructureItem::Toc)) else {
            return page_map;
        };
        let elements = &sections.toc.as_ref().unwrap_or(empty).elements;
        // entry count is unchanged by shifting, so the TOC length is stable
        let extra = self.renderer.toc_page_count(elements, &plan.page_map).saturating_sub(1);
        if extra > 0 {
            tracing::debug!(extra, "TOC overflows, shifting later page numbers");
            for entry in page_map.iter_mut().filter(|entry| entry.page > toc.page) {
                entry.page += extra;
            }
        }
        page_map
    }

    fn render_page(&self, elements: &[Element], ctx: &PageContext<'_>) -> Result<PageDocument> {
        let reflowed = self.reflow.reflow(elements, ctx.data, ctx.record, ctx.page_index)?;
        let elements = reflowed.apply_to(elements);
        Ok(self.renderer.render(&elements, ctx)?)
    }
}

/// Collects page results and applies the failure policy
struct PageCollector {
    policy: FailurePolicy,
    page: PageSize,
    pages: Vec<PageDocument>,
    report: BuildReport,
}

impl PageCollector {
    fn new(policy: FailurePolicy, page: PageSize) -> Self {
        Self { policy, page, pages: Vec::new(), report: BuildReport::default() }
    }

    fn next_index(&self) -> usize {
        self.pages.len()
    }

    fn push(&mut self, result: Result<PageDocument>) -> Result<()> {
        let page_index = self.next_index();
        match result {
            Ok(document) => self.pages.push(document),
            Err(e) => match self.policy {
                FailurePolicy::Abort => {
                    tracing::error!(page_index, "Page build failed: {}", e);
                    return Err(ExportError::PageBuild { page: page_index, message: e.to_string() });
                }
                FailurePolicy::ContinueAndReport => {
                    tracing::error!(page_index, "Page build failed, using placeholder: {}", e);
                    self.report.failures.push(PageFailure { page: page_index, message: e.to_string() });
                    self.pages.push(PageDocument::placeholder(page_index, self.page));
                }
            },
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(Vec<PageDocument>, BuildReport)> {
        self.report.total_pages = self.pages.len();
        if !self.pages.is_empty() && self.report.failures.len() == self.pages.len() {
            let first = &self.report.failures[0];
            return Err(ExportError::PageBuild {
                page: first.page,
                message: format!("all {} pages failed, first error: {}", self.pages.len(), first.message),
            });
        }
        Ok((self.pages, self.report))
    }
}
