//! Element resolution into page documents

use reflow_engine::Rect;
use serde::{Deserialize, Serialize};
use sheet_model::{DataSet, Element, ElementKind, PageMapEntry, PageSize, Row};

use crate::document::{ItemContent, PageDocument, RenderItem};
use crate::format::format_value;
use crate::media::{prepare_image, OutputMode};
use crate::qr::render_qr_svg;
use crate::table::fill_table;
use crate::toc::{paginate_toc, TocContent, TocPage};
use crate::tokens::substitute_tokens;
use crate::watermark::{Watermark, DEFAULT_WATERMARK_TEXT};
use crate::Result;

/// Caller-level render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub mode: OutputMode,
    /// Unlicensed callers get a watermark on every page
    pub licensed: bool,
    pub watermark_text: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: OutputMode::Digital,
            licensed: false,
            watermark_text: DEFAULT_WATERMARK_TEXT.to_string(),
        }
    }
}

impl RenderOptions {
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn licensed(mut self) -> Self {
        self.licensed = true;
        self
    }
}

/// Everything a page needs besides its elements
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub page_index: usize,
    pub page: PageSize,
    pub background: &'a str,
    pub data: &'a DataSet,
    /// Record bound to this page, if any
    pub record: Option<&'a Row>,
    /// Global page map, used by TOC lists
    pub page_map: &'a [PageMapEntry],
    /// Which page of a paginated TOC this is
    pub toc_page: usize,
}

impl<'a> PageContext<'a> {
    pub fn new(page_index: usize, page: PageSize, background: &'a str, data: &'a DataSet) -> Self {
        Self {
            page_index,
            page,
            background,
            data,
            record: None,
            page_map: &[],
            toc_page: 0,
        }
    }

    pub fn with_record(mut self, record: Option<&'a Row>) -> Self {
        self.record = record;
        self
    }

    pub fn with_page_map(mut self, page_map: &'a [PageMapEntry]) -> Self {
        self.page_map = page_map;
        self
    }

    pub fn with_toc_page(mut self, toc_page: usize) -> Self {
        self.toc_page = toc_page;
        self
    }
}

/// Turns reflowed elements into page documents
#[derive(Debug, Clone, Default)]
pub struct PageRenderer {
    options: RenderOptions,
}

impl PageRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render one page
    ///
    /// Hidden elements are skipped. Items keep declaration order among
    /// equal z-indices.
    pub fn render(&self, elements: &[Element], ctx: &PageContext<'_>) -> Result<PageDocument> {
        let mut document = PageDocument::new(ctx.page_index, ctx.page, ctx.background);

        for element in elements.iter().filter(|e| e.visible) {
            if let Some(content) = self.render_content(element, ctx)? {
                document.items.push(RenderItem {
                    element_id: element.id.clone(),
                    bounds: Rect::of(element),
                    rotation: element.rotation,
                    z_index: element.z_index,
                    content,
                });
            }
        }
        document.items.sort_by_key(|item| item.z_index);

        if !self.options.licensed {
            document.watermark = Some(Watermark::for_page(&self.options.watermark_text, ctx.page.width));
        }

        Ok(document)
    }

    /// Number of pages the TOC lists on this page need
    pub fn toc_page_count(&self, elements: &[Element], page_map: &[PageMapEntry]) -> usize {
        elements
            .iter()
            .filter(|e| e.visible)
            .filter_map(|element| match &element.kind {
                ElementKind::TocList { settings } => {
                    Some(paginate_toc(settings, page_map, element.dimension.height).len())
                }
                _ => None,
            })
            .max()
            .unwrap_or(1)
    }

    fn render_content(&self, element: &Element, ctx: &PageContext<'_>) -> Result<Option<ItemContent>> {
        let content = match &element.kind {
            ElementKind::Text { content, style } => ItemContent::Text {
                text: format_value(&substitute_tokens(content, ctx.record), &style.format),
                style: style.clone(),
            },
            ElementKind::DataField { field, template, style } => {
                let template = template.clone().unwrap_or_else(|| format!("{{{{{}}}}}", field));
                ItemContent::Text {
                    text: format_value(&substitute_tokens(&template, ctx.record), &style.format),
                    style: style.clone(),
                }
            }
            ElementKind::Image { src, fit, alt } => {
                let src = substitute_tokens(src, ctx.record);
                let prepared = match prepare_image(&src, element.dimension.width, element.dimension.height, self.options.mode) {
                    Ok(prepared) => prepared,
                    Err(e) => {
                        tracing::warn!(element_id = %element.id, page_index = ctx.page_index, "Image left unprocessed: {}", e);
                        src
                    }
                };
                ItemContent::Image {
                    src: prepared,
                    fit: *fit,
                    alt: alt.as_deref().map(|a| substitute_tokens(a, ctx.record)),
                }
            }
            ElementKind::Shape { style } => ItemContent::Shape { style: style.clone() },
            ElementKind::Qrcode { payload, foreground, background } => {
                let payload = substitute_tokens(payload, ctx.record);
                match render_qr_svg(
                    &element.id,
                    &payload,
                    foreground,
                    background,
                    element.dimension.width,
                    element.dimension.height,
                )? {
                    Some(svg) => ItemContent::QrCode { svg },
                    None => return Ok(None),
                }
            }
            ElementKind::Table { settings } => ItemContent::Table(fill_table(settings, ctx.data, ctx.record)),
            ElementKind::TocList { settings } => {
                let page = paginate_toc(settings, ctx.page_map, element.dimension.height)
                    .into_iter()
                    .nth(ctx.toc_page)
                    .unwrap_or_else(TocPage::default);
                ItemContent::TocList(TocContent { page, settings: settings.clone() })
            }
        };

        Ok(Some(content))
    }
}
