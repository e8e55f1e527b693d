//! Required height of data-bound tables

use sheet_model::{DataSet, Row, TableSettings, TableVariant};

/// A pure function from (table config, dataset, group value) to height
///
/// Implementations must be deterministic; the reflow engine relies on it
/// for idempotence. Errors are reported as plain messages and wrapped in
/// a [`crate::LayoutError`] with page context by the caller.
pub trait TableHeightFn {
    fn required_height(
        &self,
        table: &TableSettings,
        data: &DataSet,
        group_value: Option<&str>,
    ) -> Result<f64, String>;
}

impl<F> TableHeightFn for F
where
    F: Fn(&TableSettings, &DataSet, Option<&str>) -> Result<f64, String>,
{
    fn required_height(
        &self,
        table: &TableSettings,
        data: &DataSet,
        group_value: Option<&str>,
    ) -> Result<f64, String> {
        self(table, data, group_value)
    }
}

/// Rows a data table binds to
///
/// When the table groups by a field and a group value is known, only the
/// rows sharing that value are returned; otherwise the whole dataset.
/// `maxRows` caps the result.
pub fn bound_rows<'a>(table: &TableSettings, data: &'a DataSet, group_value: Option<&str>) -> Vec<&'a Row> {
    let rows: Vec<&Row> = match (table.group_by_field.as_deref(), group_value) {
        (Some(field), Some(value)) => data
            .rows()
            .iter()
            .filter(|row| row.get(field) == Some(value))
            .collect(),
        _ => data.rows().iter().collect(),
    };

    match table.max_rows {
        Some(max) => rows.into_iter().take(max).collect(),
        None => rows,
    }
}

/// Number of body rows a table renders
pub fn bound_row_count(table: &TableSettings, data: &DataSet, group_value: Option<&str>) -> usize {
    match table.variant {
        TableVariant::Properties => table.properties.len(),
        TableVariant::Data => bound_rows(table, data, group_value).len(),
    }
}

/// Default height function: header plus one fixed-height line per row
#[derive(Debug, Clone, Copy, Default)]
pub struct RowHeightCalculator;

impl TableHeightFn for RowHeightCalculator {
    fn required_height(
        &self,
        table: &TableSettings,
        data: &DataSet,
        group_value: Option<&str>,
    ) -> Result<f64, String> {
        if !table.row_height.is_finite() || table.row_height < 0.0 {
            return Err(format!("invalid row height {}", table.row_height));
        }
        if !table.header_height.is_finite() || table.header_height < 0.0 {
            return Err(format!("invalid header height {}", table.header_height));
        }

        let rows = bound_row_count(table, data, group_value);
        Ok(table.effective_header_height() + rows as f64 * table.row_height)
    }
}
