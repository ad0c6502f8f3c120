//! Export encoding.
//!
//! Rendered exports are RGBA; PNG keeps alpha and JPEG drops it.

mod jpeg;
mod png;
mod types;

use std::path::Path;

use tracing::info;

pub use jpeg::encode_jpeg;
pub use png::encode_png;
pub use types::{EncodeError, ExportFormat, DEFAULT_JPEG_QUALITY};

use crate::pixels::PixelBuffer;

/// Encode `buffer` in `format`. `quality` only affects JPEG.
pub fn encode(buffer: &PixelBuffer, format: ExportFormat, quality: u8) -> Result<Vec<u8>, EncodeError> {
    match format {
        ExportFormat::Png => encode_png(buffer),
        ExportFormat::Jpeg => encode_jpeg(buffer, quality),
    }
}

/// Encode and write to `path`.
pub fn write_export(
    buffer: &PixelBuffer,
    path: &Path,
    format: ExportFormat,
    quality: u8,
) -> Result<(), EncodeError> {
    let bytes = encode(buffer, format, quality)?;
    std::fs::write(path, &bytes)?;
    info!(
        path = %path.display(),
        %format,
        width = buffer.width,
        height = buffer.height,
        bytes = bytes.len(),
        "wrote export"
    );
    Ok(())
}

pub(crate) fn check_buffer(buffer: &PixelBuffer) -> Result<(), EncodeError> {
    if buffer.width == 0 || buffer.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: buffer.width,
            height: buffer.height,
        });
    }
    let expected = buffer.width as usize * buffer.height as usize * 4;
    if buffer.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: buffer.pixels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_dispatch() {
        let buffer = PixelBuffer::filled(4, 4, [1, 2, 3, 255]);
        let png = encode(&buffer, ExportFormat::Png, 90).unwrap();
        let jpg = encode(&buffer, ExportFormat::Jpeg, 90).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(&jpg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let buffer = PixelBuffer::filled(3, 2, [9, 9, 9, 255]);
        write_export(&buffer, &path, ExportFormat::Png, 90).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }
}
