//! QR code generation

use qrcode::render::svg;
use qrcode::QrCode;

use crate::{RenderError, Result};

/// Render a QR code as SVG sized to its box
///
/// A blank payload yields `None`; the element is omitted rather than
/// drawing a code for an empty string.
pub fn render_qr_svg(
    element_id: &str,
    payload: &str,
    foreground: &str,
    background: &str,
    width: f64,
    height: f64,
) -> Result<Option<String>> {
    if payload.trim().is_empty() {
        return Ok(None);
    }

    let code = QrCode::new(payload.as_bytes()).map_err(|e| RenderError::QrCode {
        element_id: element_id.to_string(),
        message: e.to_string(),
    })?;

    let size = width.min(height).max(1.0).floor() as u32;
    let svg = code
        .render::<svg::Color>()
        .min_dimensions(size, size)
        .dark_color(svg::Color(foreground))
        .light_color(svg::Color(background))
        .build();

    Ok(Some(svg))
}
