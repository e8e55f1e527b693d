//! Table filling for static and data-bound tables

use reflow_engine::bound_rows;
use serde::{Deserialize, Serialize};
use sheet_model::{DataSet, Row, TableSettings, TableVariant, TextAlign, TextStyle};

use crate::format::format_value;
use crate::tokens::{has_tokens, substitute_tokens};

/// A resolved table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnContent {
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    pub align: TextAlign,
}

/// A resolved table, cell text final
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableContent {
    pub variant: TableVariant,
    pub columns: Vec<ColumnContent>,
    pub show_header: bool,
    pub header_height: f64,
    pub row_height: f64,
    pub rows: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    pub header_style: TextStyle,
    pub body_style: TextStyle,
}

/// Fill a table for the page's record
///
/// Properties tables keep their static rows, dropping a row whose value
/// contains tokens that all resolve to nothing. Data tables bind to the
/// dataset, narrowed to the record's group when the table groups by a
/// column, and capped by `maxRows`.
pub fn fill_table(settings: &TableSettings, data: &DataSet, record: Option<&Row>) -> TableContent {
    let (columns, rows) = match settings.variant {
        TableVariant::Properties => property_rows(settings, record),
        TableVariant::Data => data_rows(settings, data, record),
    };

    TableContent {
        variant: settings.variant,
        columns,
        show_header: settings.show_header,
        header_height: settings.header_height,
        row_height: settings.row_height,
        rows,
        stripe_color: settings.stripe_color.clone(),
        border_color: settings.border_color.clone(),
        header_style: settings.header_style.clone(),
        body_style: settings.body_style.clone(),
    }
}

fn property_rows(settings: &TableSettings, record: Option<&Row>) -> (Vec<ColumnContent>, Vec<Vec<String>>) {
    let columns = vec![
        ColumnContent { header: String::new(), width: None, align: TextAlign::Left },
        ColumnContent { header: String::new(), width: None, align: TextAlign::Left },
    ];

    let rows = settings
        .properties
        .iter()
        .filter_map(|property| {
            let value = substitute_tokens(&property.value, record);
            if has_tokens(&property.value) && value.trim().is_empty() {
                return None;
            }
            Some(vec![
                substitute_tokens(&property.label, record),
                format_value(&value, &settings.body_style.format),
            ])
        })
        .collect();

    (columns, rows)
}

fn data_rows(
    settings: &TableSettings,
    data: &DataSet,
    record: Option<&Row>,
) -> (Vec<ColumnContent>, Vec<Vec<String>>) {
    let columns = settings
        .columns
        .iter()
        .map(|column| ColumnContent {
            header: column.header.clone(),
            width: column.width,
            align: column.align,
        })
        .collect();

    let group_value = settings
        .group_by_field
        .as_deref()
        .and_then(|field| record.and_then(|row| row.get(field)));

    let rows = bound_rows(settings, data, group_value)
        .into_iter()
        .map(|row| {
            settings
                .columns
                .iter()
                .map(|column| format_value(row.get(&column.field).unwrap_or(""), &settings.body_style.format))
                .collect()
        })
        .collect();

    (columns, rows)
}
