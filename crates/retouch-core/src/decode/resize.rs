//! Thumbnail downscaling.

use image::imageops::FilterType;

use super::DecodeError;
use crate::pixels::PixelBuffer;

/// Scale `buffer` to exactly `width`x`height`.
pub fn resize(
    buffer: &PixelBuffer,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<PixelBuffer, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidSize { width, height });
    }
    if (buffer.width, buffer.height) == (width, height) {
        return Ok(buffer.clone());
    }
    let rgba = buffer
        .to_rgba_image()
        .ok_or_else(|| DecodeError::CorruptedFile("buffer length does not match size".into()))?;
    Ok(PixelBuffer::from_rgba_image(image::imageops::resize(
        &rgba, width, height, filter,
    )))
}

/// Thumbnail whose longest edge is at most `max_edge`. Never upscales.
pub fn generate_thumbnail(buffer: &PixelBuffer, max_edge: u32) -> Result<PixelBuffer, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidSize {
            width: 0,
            height: 0,
        });
    }
    let (width, height) = thumbnail_size(buffer.width, buffer.height, max_edge);
    resize(buffer, width, height, FilterType::Triangle)
}

fn thumbnail_size(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge {
        return (width, height);
    }
    let scale = max_edge as f64 / longest as f64;
    let shrink = |v: u32| ((v as f64 * scale).round() as u32).max(1);
    (shrink(width), shrink(height))
}
