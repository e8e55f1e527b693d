//! Page Render - Data-resolved page documents
//!
//! Takes the reflowed elements of one page and the record it is bound to
//! and produces a serializable [`PageDocument`]: tokens substituted,
//! values formatted, tables filled, images prepared for the output mode,
//! QR codes drawn and the table of contents laid out. The [`markup`]
//! module turns documents into the HTML handed to the rendering worker.

mod document;
mod error;
mod format;
pub mod markup;
mod media;
mod qr;
mod renderer;
mod table;
mod toc;
mod tokens;
mod watermark;

pub use document::*;
pub use error::*;
pub use format::*;
pub use media::*;
pub use qr::*;
pub use renderer::*;
pub use table::*;
pub use toc::*;
pub use tokens::*;
pub use watermark::*;
