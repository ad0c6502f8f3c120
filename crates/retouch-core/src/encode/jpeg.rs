//! JPEG encoding for export.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{check_buffer, EncodeError, ExportFormat};
use crate::pixels::PixelBuffer;

/// Encode an RGBA buffer as JPEG, discarding alpha.
///
/// # Arguments
///
/// * `buffer` - RGBA pixels, rows top to bottom
/// * `quality` - 1-100, clamped
///
/// # Quality Guidelines
///
/// * 90-100: archival or further editing
/// * 80-90: recommended for most uses
/// * Below 60: visible artifacts
pub fn encode_jpeg(buffer: &PixelBuffer, quality: u8) -> Result<Vec<u8>, EncodeError> {
    check_buffer(buffer)?;
    let quality = quality.clamp(1, 100);

    let rgb: Vec<u8> = buffer
        .pixels
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(&rgb, buffer.width, buffer.height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: ExportFormat::Jpeg,
            message: e.to_string(),
        })?;

    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg_markers() {
        let buffer = PixelBuffer::filled(64, 32, [128, 64, 32, 255]);
        let bytes = encode_jpeg(&buffer, 90).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_quality_clamped() {
        let buffer = PixelBuffer::filled(8, 8, [10, 10, 10, 255]);
        assert!(encode_jpeg(&buffer, 0).is_ok());
        assert!(encode_jpeg(&buffer, 255).is_ok());
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let buffer = PixelBuffer::filled(8, 8, [200, 100, 50, 0]);
        let bytes = encode_jpeg(&buffer, 95).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_encode_jpeg_rejects_bad_length() {
        let buffer = PixelBuffer {
            width: 4,
            height: 4,
            pixels: vec![0; 10],
        };
        assert!(matches!(
            encode_jpeg(&buffer, 90),
            Err(EncodeError::InvalidPixelData { expected: 64, actual: 10 })
        ));
    }
}
