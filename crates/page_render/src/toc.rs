//! Table-of-contents layout: grouping, pagination and balanced columns

use serde::{Deserialize, Serialize};
use sheet_model::{PageMapEntry, TocSettings};

/// One line of the TOC listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TocLine {
    GroupHeader { title: String },
    Entry { title: String, page: usize },
}

impl TocLine {
    pub fn height(&self, settings: &TocSettings) -> f64 {
        match self {
            TocLine::GroupHeader { .. } => settings.header_height,
            TocLine::Entry { .. } => settings.entry_height,
        }
    }
}

/// One page of a paginated TOC
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocPage {
    /// Only the first page carries the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub columns: Vec<Vec<TocLine>>,
}

impl TocPage {
    pub fn line_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }
}

/// Resolved TOC item content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocContent {
    #[serde(flatten)]
    pub page: TocPage,
    pub settings: TocSettings,
}

/// Flatten the page map into lines, inserting group headers when grouping
pub fn toc_lines(settings: &TocSettings, page_map: &[PageMapEntry]) -> Vec<TocLine> {
    let grouped = settings.group_by_field.is_some();
    let mut lines = Vec::with_capacity(page_map.len());
    let mut current_group: Option<&str> = None;

    for entry in page_map {
        if grouped {
            let group = entry.group.as_deref();
            if group.is_some() && group != current_group {
                lines.push(TocLine::GroupHeader { title: group.unwrap_or_default().to_string() });
            }
            current_group = group;
        }
        lines.push(TocLine::Entry { title: entry.title.clone(), page: entry.page });
    }

    lines
}

/// Split the TOC into pages of `height` pixels
///
/// The title takes `title_height` on the first page only. Each page holds
/// up to `columns` columns; the lines of every page are balanced across
/// its columns. Always returns at least one page.
pub fn paginate_toc(settings: &TocSettings, page_map: &[PageMapEntry], height: f64) -> Vec<TocPage> {
    let columns = settings.column_count();
    let title = settings.show_title.then(|| settings.title.clone());
    let first_available = match title {
        Some(_) => height - settings.title_height,
        None => height,
    };

    let mut pages: Vec<(f64, Vec<TocLine>)> = Vec::new();
    let mut available = first_available;
    let mut page_lines: Vec<TocLine> = Vec::new();
    let mut column = 0;
    let mut column_height = 0.0;

    for line in toc_lines(settings, page_map) {
        let line_height = line.height(settings);
        if column_height > 0.0 && column_height + line_height > available {
            column += 1;
            column_height = 0.0;
            if column == columns {
                pages.push((available, std::mem::take(&mut page_lines)));
                available = height;
                column = 0;
            }
        }
        column_height += line_height;
        page_lines.push(line);
    }
    pages.push((available, page_lines));

    pages
        .into_iter()
        .enumerate()
        .map(|(index, (available, lines))| TocPage {
            title: if index == 0 { title.clone() } else { None },
            columns: balance_columns(lines, columns, available, settings),
        })
        .collect()
}

/// Spread lines over at most `columns` columns of similar height
///
/// Finds the smallest column height for which filling top to bottom uses
/// no more than `columns` columns, bounded by `max_height`.
pub fn balance_columns(
    lines: Vec<TocLine>,
    columns: usize,
    max_height: f64,
    settings: &TocSettings,
) -> Vec<Vec<TocLine>> {
    let columns = columns.max(1);
    if lines.is_empty() {
        return vec![Vec::new(); columns];
    }

    let heights: Vec<f64> = lines.iter().map(|l| l.height(settings)).collect();
    let total: f64 = heights.iter().sum();
    let tallest = heights.iter().cloned().fold(0.0, f64::max);

    let mut limit = (total / columns as f64).max(tallest);
    let breaks = loop {
        let (breaks, next_limit) = column_breaks(&heights, limit);
        if breaks.len() < columns || limit >= max_height {
            break breaks;
        }
        match next_limit {
            Some(next) if next > limit => limit = next,
            _ => break breaks,
        }
    };

    let mut result: Vec<Vec<TocLine>> = vec![Vec::new(); columns];
    let mut column = 0;
    for (index, line) in lines.into_iter().enumerate() {
        while column < breaks.len() && index >= breaks[column] {
            column += 1;
        }
        result[column.min(columns - 1)].push(line);
    }
    result
}

/// Indices starting a new column when filling to `limit`, plus the
/// smallest limit that would move any break
fn column_breaks(heights: &[f64], limit: f64) -> (Vec<usize>, Option<f64>) {
    let mut breaks = Vec::new();
    let mut next_limit: Option<f64> = None;
    let mut current = 0.0;

    for (index, height) in heights.iter().enumerate() {
        if current > 0.0 && current + height > limit {
            let needed = current + height;
            next_limit = Some(next_limit.map_or(needed, |n: f64| n.min(needed)));
            breaks.push(index);
            current = 0.0;
        }
        current += height;
    }

    (breaks, next_limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_map(n: usize) -> Vec<PageMapEntry> {
        (0..n)
            .map(|i| {
                let group = if i < n / 2 { "Chairs" } else { "Tables" };
                PageMapEntry::new(format!("Item {}", i + 1), i + 3, Some(group.to_string()))
            })
            .collect()
    }

    fn settings() -> TocSettings {
        TocSettings {
            title_height: 40.0,
            header_height: 20.0,
            entry_height: 20.0,
            ..Default::default()
        }
    }

    fn entries(page: &TocPage) -> usize {
        page.columns
            .iter()
            .flatten()
            .filter(|l| matches!(l, TocLine::Entry { .. }))
            .count()
    }

    #[test]
    fn test_group_headers() {
        let settings = TocSettings { group_by_field: Some("Category".into()), ..settings() };
        let lines = toc_lines(&settings, &page_map(4));

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], TocLine::GroupHeader { title: "Chairs".into() });
        assert_eq!(lines[3], TocLine::GroupHeader { title: "Tables".into() });

        let ungrouped = toc_lines(&self::settings(), &page_map(4));
        assert_eq!(ungrouped.len(), 4);
    }

    #[test]
    fn test_single_page() {
        let pages = paginate_toc(&settings(), &page_map(5), 400.0);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title.as_deref(), Some("Contents"));
        assert_eq!(entries(&pages[0]), 5);
    }

    #[test]
    fn test_title_only_on_first_page() {
        // 140px: first page fits (140 - 40) / 20 = 5 entries, then 7 per page
        let pages = paginate_toc(&settings(), &page_map(15), 140.0);
        assert_eq!(pages.len(), 3);
        assert_eq!(entries(&pages[0]), 5);
        assert_eq!(entries(&pages[1]), 7);
        assert_eq!(entries(&pages[2]), 3);
        assert!(pages[0].title.is_some());
        assert!(pages[1].title.is_none());
        assert!(pages[2].title.is_none());
    }

    #[test]
    fn test_entries_keep_order_across_pages() {
        let pages = paginate_toc(&settings(), &page_map(15), 140.0);
        let numbers: Vec<usize> = pages
            .iter()
            .flat_map(|p| p.columns.iter().flatten())
            .filter_map(|l| match l {
                TocLine::Entry { page, .. } => Some(*page),
                _ => None,
            })
            .collect();
        assert_eq!(numbers, (3..18).collect::<Vec<_>>());
    }

    #[test]
    fn test_balanced_columns() {
        let settings = TocSettings { columns: 3, ..settings() };
        let pages = paginate_toc(&settings, &page_map(7), 1000.0);

        assert_eq!(pages.len(), 1);
        let lengths: Vec<usize> = pages[0].columns.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![3, 3, 1]);
    }

    #[test]
    fn test_multi_column_capacity() {
        // 2 columns of 5 entries each on the first page
        let settings = TocSettings { columns: 2, ..settings() };
        let pages = paginate_toc(&settings, &page_map(12), 140.0);
        assert_eq!(pages.len(), 2);
        assert_eq!(entries(&pages[0]), 10);
        assert_eq!(entries(&pages[1]), 2);
    }

    #[test]
    fn test_empty_page_map() {
        let pages = paginate_toc(&settings(), &[], 500.0);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].line_count(), 0);
        assert_eq!(pages[0].title.as_deref(), Some("Contents"));
    }

    #[test]
    fn test_oversized_line_still_placed() {
        let pages = paginate_toc(&settings(), &page_map(2), 10.0);
        let total: usize = pages.iter().map(entries).sum();
        assert_eq!(total, 2);
    }
}
