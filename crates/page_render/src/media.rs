//! Image preparation for digital and print output

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{RenderError, Result};

/// JPEG quality used for digital output
pub const DIGITAL_JPEG_QUALITY: u8 = 82;

/// Largest pixel density kept for digital output, relative to the displayed size
pub const MAX_DISPLAY_SCALE: f64 = 2.0;

/// Target medium of an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Screen-sized output: images are downscaled and recompressed
    #[default]
    Digital,
    /// Print output: images are passed through untouched
    Print,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Digital => write!(f, "digital"),
            OutputMode::Print => write!(f, "print"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "digital" => Ok(OutputMode::Digital),
            "print" => Ok(OutputMode::Print),
            other => Err(format!("unknown output mode '{}'", other)),
        }
    }
}

/// Where an image's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline `data:<mime>;base64,<payload>` image
    DataUri { mime: String, bytes: Vec<u8> },
    /// URL or path resolved by the rendering worker
    Reference(String),
}

impl ImageSource {
    pub fn parse(src: &str) -> Result<Self> {
        let Some(rest) = src.strip_prefix("data:") else {
            return Ok(ImageSource::Reference(src.to_string()));
        };

        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| RenderError::InvalidDataUri("missing payload separator".to_string()))?;
        let mime = meta
            .strip_suffix(";base64")
            .ok_or_else(|| RenderError::InvalidDataUri("only base64 payloads are supported".to_string()))?;

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::InvalidDataUri(e.to_string()))?;

        Ok(ImageSource::DataUri { mime: mime.to_string(), bytes })
    }
}

/// Prepare an image `src` displayed at `width` x `height` pixels
///
/// Print output and referenced images are returned unchanged. Inline
/// images in digital output are capped at twice the displayed size and
/// always recompressed to JPEG, including lossless sources.
pub fn prepare_image(src: &str, width: f64, height: f64, mode: OutputMode) -> Result<String> {
    if mode == OutputMode::Print {
        return Ok(src.to_string());
    }

    match ImageSource::parse(src)? {
        ImageSource::Reference(reference) => Ok(reference),
        ImageSource::DataUri { bytes, .. } => {
            let jpeg = optimize_for_digital(&bytes, width, height)?;
            Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg)))
        }
    }
}

/// Downscale to the display cap and re-encode as JPEG
pub fn optimize_for_digital(bytes: &[u8], width: f64, height: f64) -> Result<Vec<u8>> {
    let image = image::load_from_memory(bytes).map_err(|e| RenderError::Image(e.to_string()))?;

    let max_width = display_cap(width);
    let max_height = display_cap(height);
    let (source_width, source_height) = image.dimensions();

    let image = if source_width > max_width || source_height > max_height {
        tracing::debug!(
            source_width,
            source_height,
            max_width,
            max_height,
            "Downscaling image for digital output"
        );
        image.resize(max_width, max_height, FilterType::Triangle)
    } else {
        image
    };

    let flattened = flatten_onto_white(&image);
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, DIGITAL_JPEG_QUALITY)
        .encode_image(&flattened)
        .map_err(|e| RenderError::Image(e.to_string()))?;

    Ok(encoded)
}

fn display_cap(displayed: f64) -> u32 {
    let cap = (displayed.max(0.0) * MAX_DISPLAY_SCALE).ceil();
    if cap.is_finite() && cap >= 1.0 {
        cap.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// JPEG has no alpha channel; composite transparent pixels over white
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_data_uri(width: u32, height: u32) -> String {
        let image = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 0]));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    fn decode(uri: &str) -> DynamicImage {
        match ImageSource::parse(uri).unwrap() {
            ImageSource::DataUri { mime, bytes } => {
                assert_eq!(mime, "image/jpeg");
                image::load_from_memory(&bytes).unwrap()
            }
            ImageSource::Reference(_) => panic!("expected data URI"),
        }
    }

    #[test]
    fn test_digital_downscales_to_twice_display_size() {
        let src = png_data_uri(400, 200);
        let out = prepare_image(&src, 50.0, 25.0, OutputMode::Digital).unwrap();

        let image = decode(&out);
        assert_eq!(image.dimensions(), (100, 50));
    }

    #[test]
    fn test_digital_reencodes_small_lossless_images() {
        let src = png_data_uri(10, 10);
        let out = prepare_image(&src, 100.0, 100.0, OutputMode::Digital).unwrap();

        assert!(out.starts_with("data:image/jpeg;base64,"));
        let image = decode(&out);
        assert_eq!(image.dimensions(), (10, 10));
        // fully transparent pixels end up white
        let pixel = image.to_rgb8().get_pixel(5, 5).0;
        assert!(pixel.iter().all(|c| *c > 240));
    }

    #[test]
    fn test_print_passes_through() {
        let src = png_data_uri(400, 200);
        assert_eq!(prepare_image(&src, 50.0, 25.0, OutputMode::Print).unwrap(), src);
    }

    #[test]
    fn test_reference_passes_through() {
        let out = prepare_image("https://cdn.example.com/chair.png", 50.0, 50.0, OutputMode::Digital).unwrap();
        assert_eq!(out, "https://cdn.example.com/chair.png");
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(matches!(
            ImageSource::parse("data:image/png,raw"),
            Err(RenderError::InvalidDataUri(_))
        ));
        assert!(matches!(
            prepare_image("data:image/png;base64,AAAA", 10.0, 10.0, OutputMode::Digital),
            Err(RenderError::Image(_))
        ));
    }

    #[test]
    fn test_output_mode_parse() {
        assert_eq!("Print".parse::<OutputMode>().unwrap(), OutputMode::Print);
        assert!("fax".parse::<OutputMode>().is_err());
        assert_eq!(OutputMode::Digital.to_string(), "digital");
    }
}
