//! Decode encoded image bytes into an upright RGBA buffer.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use tracing::debug;

use super::{DecodeError, ExifOrientation};
use crate::pixels::PixelBuffer;

/// Decode any supported format, applying EXIF orientation.
///
/// # Arguments
///
/// * `bytes` - Encoded file contents (JPEG or PNG)
///
/// # Returns
///
/// An upright RGBA [`PixelBuffer`], rows top to bottom.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be guessed,
/// `DecodeError::CorruptedFile` if decoding fails and `DecodeError::Empty`
/// for a zero-sized image.
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
    let orientation = read_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let upright = apply_orientation(img, orientation);
    let buffer = PixelBuffer::from_rgba_image(upright.into_rgba8());
    if buffer.is_empty() {
        return Err(DecodeError::Empty);
    }

    debug!(
        width = buffer.width,
        height = buffer.height,
        orientation = ?orientation,
        "decoded source image"
    );
    Ok(buffer)
}

/// Read `path` and decode it.
pub fn decode_file(path: &Path) -> Result<PixelBuffer, DecodeError> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}

/// EXIF orientation of `bytes`, upright when absent or unreadable.
pub fn read_orientation(bytes: &[u8]) -> ExifOrientation {
    Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(ExifOrientation::from_tag)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: ExifOrientation) -> DynamicImage {
    let turned = match orientation.quarter_turns % 4 {
        1 => img.rotate90(),
        2 => img.rotate180(),
        3 => img.rotate270(),
        _ => img,
    };
    if orientation.mirrored {
        turned.fliph()
    } else {
        turned
    }
}
