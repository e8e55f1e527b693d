//! Rectangles in page coordinates

use serde::{Deserialize, Serialize};
use sheet_model::Element;

/// A rectangle in page pixels, y growing downwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Design-time rectangle of an element
    pub fn of(element: &Element) -> Self {
        Self {
            x: element.position.x,
            y: element.position.y,
            width: element.dimension.width,
            height: element.dimension.height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the x-extents share more than an edge
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
    }

    #[test]
    fn test_horizontal_overlap() {
        let a = Rect::new(0.0, 0.0, 100.0, 10.0);
        assert!(a.overlaps_horizontally(&Rect::new(50.0, 500.0, 100.0, 10.0)));
        assert!(a.overlaps_horizontally(&Rect::new(-20.0, 0.0, 30.0, 10.0)));
        // touching edges do not overlap
        assert!(!a.overlaps_horizontally(&Rect::new(100.0, 0.0, 50.0, 10.0)));
        assert!(!a.overlaps_horizontally(&Rect::new(300.0, 0.0, 50.0, 10.0)));
    }
}
