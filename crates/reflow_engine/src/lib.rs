//! Reflow Engine - Data-driven table heights and cascading reflow
//!
//! Tables flagged with `autoHeightAdaptation` take their height from the
//! bound data. When such a "driver" table grows or shrinks, every element
//! sitting below it in its horizontal shadow moves by the same amount,
//! transitively. The engine computes the final rectangle of every element
//! on one page without touching the input elements.

mod error;
mod geometry;
mod height;
mod reflow;

pub use error::*;
pub use geometry::*;
pub use height::*;
pub use reflow::*;
