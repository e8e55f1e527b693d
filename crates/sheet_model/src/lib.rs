//! Sheet Model - Elements, datasets and catalog sections
//!
//! This crate defines the read-only inputs of a spec sheet export:
//! positioned template elements produced by the editor, the tabular
//! dataset they bind to, and the section layout of a multi-page catalog.
//!
//! # Example
//!
//! ```rust
//! use sheet_model::{DataSet, Row};
//!
//! let mut data = DataSet::new(vec!["Name".into(), "Price".into()]);
//! data.push_row(Row::from_pairs([("Name", "Chair"), ("Price", "19.99")]));
//!
//! assert_eq!(data.row_count(), 1);
//! assert_eq!(data.rows()[0].get("Price"), Some("19.99"));
//! ```

mod catalog;
mod dataset;
mod element;
mod error;
mod loader;
mod section;
mod style;
mod table;
mod toc;

pub use catalog::{CatalogStructureItem, ChapterDesign, PageMapEntry};
pub use dataset::{DataSet, Row};
pub use element::{Dimension, Element, ElementKind, ElementType, ImageFit, Position};
pub use error::{ModelError, Result};
pub use loader::{detect_delimiter, load_dataset, parse_csv, parse_json};
pub use section::{CatalogSections, PageSize, Section, SectionKind, Template};
pub use style::{
    CaseTransform, ShapeKind, ShapeStyle, TextAlign, TextFormat, TextStyle, VerticalAlign,
};
pub use table::{PropertyRow, TableColumn, TableSettings, TableVariant};
pub use toc::TocSettings;
