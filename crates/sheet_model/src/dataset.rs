//! Tabular dataset bound to template elements

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single record, keyed by header name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(HashMap<String, String>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    /// Get the value of a column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    /// Get a column value, treating blank strings as missing
    pub fn non_empty(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|v| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered headers plus ordered rows; immutable for the duration of a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSet {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl DataSet {
    /// Create an empty dataset with the given headers
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    pub fn with_rows(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Cell value by row index and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.row(row).and_then(|r| r.get(column))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Rows whose `field` equals `value`, in dataset order
    pub fn rows_in_group<'a>(&'a self, field: &'a str, value: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows.iter().filter(move |row| row.get(field) == Some(value))
    }

    /// Number of rows whose `field` equals `value`
    pub fn group_count(&self, field: &str, value: &str) -> usize {
        self.rows_in_group(field, value).count()
    }

    /// Distinct values of `field` in first-seen order
    pub fn group_values(&self, field: &str) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if let Some(value) = row.get(field) {
                if !seen.contains(&value) {
                    seen.push(value);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataSet {
        DataSet::with_rows(
            vec!["Category".into(), "Name".into()],
            vec![
                Row::from_pairs([("Category", "Chairs"), ("Name", "Oslo")]),
                Row::from_pairs([("Category", "Chairs"), ("Name", "Bergen")]),
                Row::from_pairs([("Category", "Tables"), ("Name", "Fjord")]),
                Row::from_pairs([("Category", "Chairs"), ("Name", "Lund")]),
            ],
        )
    }

    #[test]
    fn test_group_count() {
        let data = sample();
        assert_eq!(data.group_count("Category", "Chairs"), 3);
        assert_eq!(data.group_count("Category", "Tables"), 1);
        assert_eq!(data.group_count("Category", "Lamps"), 0);
    }

    #[test]
    fn test_group_values_first_seen_order() {
        let data = sample();
        assert_eq!(data.group_values("Category"), vec!["Chairs", "Tables"]);
    }

    #[test]
    fn test_value_lookup() {
        let data = DataSet::with_rows(vec!["Name".into()], vec![Row::from_pairs([("Name", "Desk")])]);
        assert_eq!(data.value(0, "Name"), Some("Desk"));
        assert_eq!(data.value(0, "Price"), None);
        assert_eq!(data.value(3, "Name"), None);
    }

    #[test]
    fn test_row_non_empty() {
        let row = Row::from_pairs([("A", "  "), ("B", "x")]);
        assert_eq!(row.non_empty("A"), None);
        assert_eq!(row.non_empty("B"), Some("x"));
        assert_eq!(row.get("A"), Some("  "));
        assert_eq!(row.get("C"), None);
    }

    #[test]
    fn test_row_serializes_as_map() {
        let row = Row::from_pairs([("Price", "19.99")]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"Price":"19.99"}"#);
    }
}
