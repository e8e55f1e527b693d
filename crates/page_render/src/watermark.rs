//! Overlay for unlicensed exports

use serde::{Deserialize, Serialize};

pub const DEFAULT_WATERMARK_TEXT: &str = "UNLICENSED PREVIEW";

/// Diagonal text drawn over the whole page, above every item
///
/// The overlay never intercepts pointer events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watermark {
    pub text: String,
    /// Degrees, counter-clockwise negative
    pub rotation: f64,
    pub opacity: f64,
    pub font_size: f64,
    pub color: String,
}

impl Watermark {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }

    /// Font size scaled to the page width so the text spans the diagonal
    pub fn for_page(text: impl Into<String>, width: f64) -> Self {
        let text = text.into();
        let chars = text.chars().count().max(1) as f64;
        let font_size = (width * 1.2 / chars).clamp(24.0, 96.0);
        Self { text, font_size, ..Default::default() }
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            text: DEFAULT_WATERMARK_TEXT.to_string(),
            rotation: -45.0,
            opacity: 0.15,
            font_size: 64.0,
            color: "#000000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_clamped() {
        assert_eq!(Watermark::for_page("X", 794.0).font_size, 96.0);
        assert_eq!(Watermark::for_page("a very long watermark text indeed, really long", 200.0).font_size, 24.0);
        assert_eq!(Watermark::new("Draft").rotation, -45.0);
    }
}
