//! Conversions between base64 text, encoded image bytes and in-memory rasters.
//!
//! Decoding never fails outright: malformed input degrades into an empty byte
//! sequence or an empty [`RasterImage`], and the pipeline's size check is what
//! rejects it.

use crate::{Result, config::OutputFormat};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::RgbImage;
use std::io::Cursor;
use tracing::debug;

/// Decoded 8-bit RGB image owned by a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbImage,
}

impl RasterImage {
    pub fn empty() -> Self {
        Self {
            pixels: RgbImage::new(0, 0),
        }
    }

    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn as_rgb_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }

    pub fn into_rgb(self) -> RgbImage {
        self.pixels
    }
}

impl Default for RasterImage {
    fn default() -> Self {
        Self::empty()
    }
}

pub fn decode_base64(text: &[u8]) -> Vec<u8> {
    match STANDARD.decode(text.trim_ascii()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Discarding malformed base64 payload: {}", e);
            Vec::new()
        }
    }
}

pub fn decode_image(bytes: &[u8]) -> RasterImage {
    if bytes.is_empty() {
        return RasterImage::empty();
    }

    match image::load_from_memory(bytes) {
        Ok(decoded) => RasterImage::from_rgb(decoded.into_rgb8()),
        Err(e) => {
            debug!("Image decode failed ({} bytes): {}", bytes.len(), e);
            RasterImage::empty()
        }
    }
}

/// An empty raster encodes to an empty body.
pub fn encode_image(image: &RasterImage, format: OutputFormat) -> Result<Vec<u8>> {
    if image.is_empty() {
        return Ok(Vec::new());
    }

    let mut buffer = Cursor::new(Vec::new());
    image
        .as_rgb()
        .write_to(&mut buffer, format.image_format())?;
    Ok(buffer.into_inner())
}
