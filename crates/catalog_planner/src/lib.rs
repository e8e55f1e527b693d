//! Catalog Planner - Page sequence and table-of-contents page map
//!
//! Turns the named sections of a catalog and its dataset into the ordered
//! list of pages to build: cover, table of contents, one divider per
//! contiguous group, one page per record and the back cover. Every
//! product page is recorded in the page map that later fills the TOC.

mod error;
mod planner;
mod title;

pub use error::*;
pub use planner::*;
pub use title::*;
