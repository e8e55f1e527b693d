//! HTML serialization of page documents
//!
//! Every page becomes a fixed-size `<section>` with absolutely positioned
//! children. All user text is escaped; the only raw markup embedded is the
//! SVG produced for QR codes.

use sheet_model::{ShapeKind, ShapeStyle, TextStyle};

use crate::document::{ItemContent, PageDocument, RenderItem};
use crate::table::TableContent;
use crate::toc::{TocContent, TocLine};
use crate::watermark::Watermark;

const BASE_CSS: &str = "*{box-sizing:border-box;margin:0;padding:0}\
body{background:#ffffff}\
.page{position:relative;overflow:hidden;page-break-after:always;break-after:page}\
.item{position:absolute;overflow:hidden}\
.item table{width:100%;border-collapse:collapse;table-layout:fixed}\
.item td,.item th{padding:0 4px;overflow:hidden;white-space:nowrap;text-overflow:ellipsis}\
.toc-columns{display:flex}\
.toc-entry{display:flex;align-items:baseline}\
.toc-leader{flex:1;border-bottom:1px dotted currentColor;margin:0 4px}";

/// Escape text for use in element content or a quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A complete HTML document with one section per page
pub fn document_to_html(title: &str, pages: &[PageDocument]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str(&format!("<title>{}</title>", escape_html(title)));
    if let Some(first) = pages.first() {
        html.push_str(&format!(
            "<style>@page{{size:{}px {}px;margin:0}}{}</style>",
            first.width, first.height, BASE_CSS
        ));
    } else {
        html.push_str(&format!("<style>{}</style>", BASE_CSS));
    }
    html.push_str("</head><body>");
    for page in pages {
        html.push_str(&page_to_html(page));
    }
    html.push_str("</body></html>");
    html
}

/// A single page as a `<section>` fragment
pub fn page_to_html(page: &PageDocument) -> String {
    let mut html = format!(
        "<section class=\"page\" data-page=\"{}\"{} style=\"width:{}px;height:{}px;background:{}\">",
        page.page_index,
        if page.placeholder { " data-placeholder=\"true\"" } else { "" },
        page.width,
        page.height,
        escape_html(&page.background)
    );

    for item in &page.items {
        html.push_str(&item_to_html(item));
    }
    if let Some(watermark) = &page.watermark {
        html.push_str(&watermark_to_html(watermark));
    }

    html.push_str("</section>");
    html
}

fn box_style(item: &RenderItem) -> String {
    let mut style = format!(
        "left:{}px;top:{}px;width:{}px;height:{}px;z-index:{}",
        item.bounds.x, item.bounds.y, item.bounds.width, item.bounds.height, item.z_index
    );
    if item.rotation != 0.0 {
        style.push_str(&format!(";transform:rotate({}deg)", item.rotation));
    }
    style
}

fn text_style(style: &TextStyle) -> String {
    format!(
        "font-family:{};font-size:{}px;font-weight:{};font-style:{};text-decoration:{};color:{};text-align:{};line-height:{}",
        escape_html(&style.font_family),
        style.font_size,
        if style.bold { "bold" } else { "normal" },
        if style.italic { "italic" } else { "normal" },
        if style.underline { "underline" } else { "none" },
        escape_html(&style.color),
        style.align.as_str(),
        style.line_height
    )
}

fn multiline(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

fn item_to_html(item: &RenderItem) -> String {
    let frame = box_style(item);
    let id = escape_html(&item.element_id);

    match &item.content {
        ItemContent::Text { text, style: font } => format!(
            "<div class=\"item text\" data-id=\"{}\" style=\"{};{};display:flex;flex-direction:column;justify-content:{}\"><div>{}</div></div>",
            id,
            frame,
            text_style(font),
            font.vertical_align.as_flex(),
            multiline(text)
        ),
        ItemContent::Image { src, fit, alt } => format!(
            "<img class=\"item image\" data-id=\"{}\" src=\"{}\" alt=\"{}\" style=\"{};object-fit:{}\">",
            id,
            escape_html(src),
            escape_html(alt.as_deref().unwrap_or("")),
            frame,
            fit.as_str()
        ),
        ItemContent::Shape { style: shape } => format!(
            "<svg class=\"item shape\" data-id=\"{}\" style=\"{}\" viewBox=\"0 0 {} {}\" preserveAspectRatio=\"none\">{}</svg>",
            id,
            frame,
            item.bounds.width,
            item.bounds.height,
            shape_to_svg(shape, item.bounds.width, item.bounds.height)
        ),
        ItemContent::QrCode { svg } => format!(
            "<div class=\"item qrcode\" data-id=\"{}\" style=\"{}\">{}</div>",
            id,
            frame,
            strip_xml_declaration(svg)
        ),
        ItemContent::Table(table) => format!(
            "<div class=\"item table\" data-id=\"{}\" style=\"{}\">{}</div>",
            id,
            frame,
            table_to_html(table)
        ),
        ItemContent::TocList(toc) => format!(
            "<div class=\"item toc\" data-id=\"{}\" style=\"{}\">{}</div>",
            id,
            frame,
            toc_to_html(toc)
        ),
    }
}

fn shape_to_svg(style: &ShapeStyle, width: f64, height: f64) -> String {
    let fill = escape_html(style.fill.as_deref().unwrap_or("none"));
    let stroke = escape_html(style.stroke.as_deref().unwrap_or("none"));
    let dash = style
        .dash
        .as_deref()
        .map(|d| format!(" stroke-dasharray=\"{}\"", escape_html(d)))
        .unwrap_or_default();
    let paint = format!("fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"{}", fill, stroke, style.stroke_width, dash);
    let inset = style.stroke_width / 2.0;

    match style.shape {
        ShapeKind::Rectangle => format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" {}/>",
            inset,
            inset,
            (width - style.stroke_width).max(0.0),
            (height - style.stroke_width).max(0.0),
            style.corner_radius,
            paint
        ),
        ShapeKind::Circle => format!(
            "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {}/>",
            width / 2.0,
            height / 2.0,
            (width / 2.0 - inset).max(0.0),
            (height / 2.0 - inset).max(0.0),
            paint
        ),
        // A line runs along the vertical middle; lines have no fill
        ShapeKind::Line => format!(
            "<line x1=\"0\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"{}/>",
            height / 2.0,
            width,
            height / 2.0,
            escape_html(style.stroke.as_deref().or(style.fill.as_deref()).unwrap_or("#000000")),
            style.stroke_width,
            dash
        ),
    }
}

fn strip_xml_declaration(svg: &str) -> &str {
    match svg.find("<svg") {
        Some(start) => &svg[start..],
        None => svg,
    }
}

fn table_to_html(table: &TableContent) -> String {
    let border = table
        .border_color
        .as_deref()
        .map(|c| format!("border:1px solid {};", escape_html(c)))
        .unwrap_or_default();

    let mut html = String::from("<table>");
    if !table.columns.iter().all(|c| c.width.is_none()) {
        html.push_str("<colgroup>");
        for column in &table.columns {
            match column.width {
                Some(width) => html.push_str(&format!("<col style=\"width:{}px\">", width)),
                None => html.push_str("<col>"),
            }
        }
        html.push_str("</colgroup>");
    }

    if table.show_header {
        html.push_str(&format!("<thead><tr style=\"height:{}px\">", table.header_height));
        for column in &table.columns {
            html.push_str(&format!(
                "<th style=\"{}{};text-align:{}\">{}</th>",
                border,
                text_style(&table.header_style),
                column.align.as_str(),
                escape_html(&column.header)
            ));
        }
        html.push_str("</tr></thead>");
    }

    html.push_str("<tbody>");
    for (index, row) in table.rows.iter().enumerate() {
        let stripe = match (&table.stripe_color, index % 2 == 1) {
            (Some(color), true) => format!(";background:{}", escape_html(color)),
            _ => String::new(),
        };
        html.push_str(&format!("<tr style=\"height:{}px{}\">", table.row_height, stripe));
        for (column, cell) in row.iter().enumerate() {
            let align = table.columns.get(column).map(|c| c.align.as_str()).unwrap_or("left");
            html.push_str(&format!(
                "<td style=\"{}{};text-align:{}\">{}</td>",
                border,
                text_style(&table.body_style),
                align,
                escape_html(cell)
            ));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn toc_to_html(toc: &TocContent) -> String {
    let settings = &toc.settings;
    let mut html = String::new();

    if let Some(title) = &toc.page.title {
        html.push_str(&format!(
            "<div class=\"toc-title\" style=\"height:{}px;{}\">{}</div>",
            settings.title_height,
            text_style(&settings.title_style),
            escape_html(title)
        ));
    }

    html.push_str(&format!("<div class=\"toc-columns\" style=\"gap:{}px\">", settings.column_gap));
    for column in &toc.page.columns {
        html.push_str("<div class=\"toc-column\" style=\"flex:1\">");
        for line in column {
            match line {
                TocLine::GroupHeader { title } => html.push_str(&format!(
                    "<div class=\"toc-group\" style=\"height:{}px;{}\">{}</div>",
                    settings.header_height,
                    text_style(&settings.header_style),
                    escape_html(title)
                )),
                TocLine::Entry { title, page } => html.push_str(&format!(
                    "<div class=\"toc-entry\" style=\"height:{}px;{}\"><span>{}</span>{}<span>{}</span></div>",
                    settings.entry_height,
                    text_style(&settings.entry_style),
                    escape_html(title),
                    if settings.leader { "<span class=\"toc-leader\"></span>" } else { " " },
                    page
                )),
            }
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

fn watermark_to_html(watermark: &Watermark) -> String {
    format!(
        "<div class=\"watermark\" style=\"position:absolute;left:0;top:0;right:0;bottom:0;display:flex;align-items:center;justify-content:center;pointer-events:none;user-select:none;z-index:2147483647\"><span style=\"transform:rotate({}deg);opacity:{};font-size:{}px;color:{};font-family:sans-serif;font-weight:bold;white-space:nowrap\">{}</span></div>",
        watermark.rotation,
        watermark.opacity,
        watermark.font_size,
        escape_html(&watermark.color),
        escape_html(&watermark.text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{PageContext, PageRenderer, RenderOptions};
    use sheet_model::{DataSet, Element, ElementKind, PageSize, Row, TableColumn, TableSettings};

    fn render(elements: &[Element], licensed: bool) -> PageDocument {
        let data = DataSet::with_rows(
            vec!["Name".into()],
            vec![Row::from_pairs([("Name", "<b>Chair</b> & \"co\"")])],
        );
        let options = if licensed { RenderOptions::default().licensed() } else { RenderOptions::default() };
        let ctx = PageContext::new(0, PageSize::A4, "#ffffff", &data).with_record(data.row(0));
        PageRenderer::new(options).render(elements, &ctx).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href='x'>&\"</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&quot;&lt;/a&gt;");
    }

    #[test]
    fn test_text_is_escaped() {
        let page = render(&[Element::text("t", "{{Name}}\nline two", 10.0, 20.0, 100.0, 40.0)], true);
        let html = page_to_html(&page);

        assert!(html.contains("&lt;b&gt;Chair&lt;/b&gt; &amp; &quot;co&quot;<br>line two"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("left:10px;top:20px;width:100px;height:40px"));
    }

    #[test]
    fn test_watermark_is_last_and_inert() {
        let page = render(&[Element::text("t", "x", 0.0, 0.0, 1.0, 1.0)], false);
        let html = page_to_html(&page);

        let watermark_at = html.find("class=\"watermark\"").unwrap();
        let item_at = html.find("data-id=\"t\"").unwrap();
        assert!(watermark_at > item_at);
        assert!(html.contains("pointer-events:none"));
    }

    #[test]
    fn test_table_and_qr_markup() {
        let settings = TableSettings::data(vec![TableColumn::new("Model", "Name")]);
        let qr = Element::new(
            "qr",
            ElementKind::Qrcode { payload: "hello".into(), foreground: "#000000".into(), background: "#ffffff".into() },
            0.0,
            0.0,
            60.0,
            60.0,
        );
        let page = render(&[Element::table("tbl", settings, 0.0, 0.0, 200.0, 60.0), qr], true);
        let html = page_to_html(&page);

        assert!(html.contains("<th"));
        assert!(html.contains(">Model</th>"));
        assert!(html.contains("<div class=\"item qrcode\" data-id=\"qr\""));
        assert!(!html.contains("<?xml"));
    }

    #[test]
    fn test_document_wraps_pages() {
        let pages = vec![render(&[], true), PageDocument::placeholder(1, PageSize::A4)];
        let html = document_to_html("Spring <Catalog>", &pages);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Spring &lt;Catalog&gt;</title>"));
        assert!(html.contains("@page{size:794px 1123px;margin:0}"));
        assert_eq!(html.matches("<section class=\"page\"").count(), 2);
        assert!(html.contains("data-placeholder=\"true\""));
    }
}
