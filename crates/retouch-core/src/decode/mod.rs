//! Source image decoding.
//!
//! Sources are decoded to upright RGBA buffers with EXIF orientation applied.
//! Thumbnails for drafts are downscaled from rendered buffers.

mod resize;
mod source;
mod types;

pub use resize::{generate_thumbnail, resize};
pub use source::{decode_file, decode_image, read_orientation};
pub use types::{DecodeError, ExifOrientation};
