//! CSV and JSON dataset loaders

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value as JsonValue;

use crate::dataset::{DataSet, Row};
use crate::error::{ModelError, Result};

/// Pick the most frequent delimiter on the header line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_delimiter = ',';
    let mut best_count = 0;

    for delim in [',', ';', '\t'] {
        let count = first_line.matches(delim).count();
        if count > best_count {
            best_count = count;
            best_delimiter = delim;
        }
    }

    best_delimiter
}

/// Parse CSV text with a header row
///
/// Short records are padded with empty values so every row carries
/// every header.
pub fn parse_csv(content: &str) -> Result<DataSet> {
    let delimiter = detect_delimiter(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ModelError::InvalidDataSet("missing header row".to_string()));
    }

    let mut seen = HashSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) {
            return Err(ModelError::DuplicateColumn(header.clone()));
        }
    }

    let mut data = DataSet::new(headers.clone());
    for record in reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (index, header) in headers.iter().enumerate() {
            row.insert(header.as_str(), record.get(index).unwrap_or(""));
        }
        data.push_row(row);
    }

    Ok(data)
}

/// Parse a JSON array of flat objects
///
/// Headers follow first-seen key order across all objects. Scalars are
/// stringified; `null` becomes an empty string and nested values keep
/// their JSON text.
pub fn parse_json(content: &str) -> Result<DataSet> {
    let json: JsonValue = serde_json::from_str(content)?;
    let items = json
        .as_array()
        .ok_or_else(|| ModelError::InvalidDataSet("expected a JSON array of objects".to_string()))?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            ModelError::InvalidDataSet(format!("item {} is not an object", index))
        })?;

        let mut row = Row::new();
        for (key, value) in object {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
            row.insert(key.as_str(), json_to_string(value));
        }
        rows.push(row);
    }

    Ok(DataSet::with_rows(headers, rows))
}

fn json_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Load a dataset from a file, choosing the parser by extension
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataSet> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ModelError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "tsv" | "txt" => parse_csv(&std::fs::read_to_string(path)?),
        "json" => parse_json(&std::fs::read_to_string(path)?),
        _ => Err(ModelError::UnsupportedFormat(format!(
            "Unknown file extension for: {}",
            path.display()
        ))),
    }
}
