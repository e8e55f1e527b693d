//! Title column resolution

/// Header names recognised as a product title, in priority order
pub const TITLE_SYNONYMS: &[&str] = &[
    "name",
    "title",
    "model",
    "product",
    "description",
    "item name",
    "product name",
];

/// Pick the column used as each product's TOC title
///
/// The first header matching a title synonym wins (case-insensitive,
/// surrounding whitespace ignored). Otherwise the first header, unless it
/// is the grouping column, in which case the second.
pub fn resolve_title_column<'a>(headers: &'a [String], group_by_field: Option<&str>) -> Option<&'a str> {
    let synonym = headers.iter().find(|header| {
        let normalized = header.trim().to_lowercase();
        TITLE_SYNONYMS.contains(&normalized.as_str())
    });
    if let Some(header) = synonym {
        return Some(header.as_str());
    }

    match (headers.first(), group_by_field) {
        (Some(first), Some(group)) if first == group => headers.get(1).or(Some(first)).map(String::as_str),
        (first, _) => first.map(String::as_str),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_synonym_match() {
        assert_eq!(resolve_title_column(&headers(&["SKU", "Name", "Price"]), None), Some("Name"));
    }

    #[test]
    fn test_synonym_case_insensitive() {
        assert_eq!(
            resolve_title_column(&headers(&["Code", " Product Name ", "Price"]), None),
            Some(" Product Name ")
        );
        assert_eq!(resolve_title_column(&headers(&["id", "MODEL"]), None), Some("MODEL"));
    }

    #[test]
    fn test_skips_group_column() {
        let headers = headers(&["GroupCode", "Value"]);
        assert_eq!(resolve_title_column(&headers, Some("GroupCode")), Some("Value"));
        assert_eq!(resolve_title_column(&headers, None), Some("GroupCode"));
    }

    #[test]
    fn test_single_group_column() {
        let headers = headers(&["Group"]);
        assert_eq!(resolve_title_column(&headers, Some("Group")), Some("Group"));
    }

    #[test]
    fn test_no_headers() {
        assert_eq!(resolve_title_column(&[], None), None);
    }
}
