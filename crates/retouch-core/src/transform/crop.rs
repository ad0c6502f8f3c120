//! Crop rectangles and destructive pixel cropping.
//!
//! A crop is chosen on screen, in the rotated display frame, then mapped
//! back into the unrotated source frame before any pixel is touched.
//!
//! # Coordinate System
//!
//! - All rectangles are normalized: (0.0, 0.0) is top-left, (1.0, 1.0) bottom-right
//! - [`DisplayCropRect`] is relative to the image as shown (rotation applied)
//! - [`SourceCropRect`] is relative to the unrotated source pixels

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Rotation;
use crate::pixels::PixelBuffer;

/// Errors for crop validation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CropError {
    /// A coordinate is NaN or infinite.
    #[error("Crop rectangle contains a non-finite coordinate")]
    NonFinite,

    /// The rectangle has no area after clamping to [0, 1].
    #[error("Crop rectangle is empty")]
    Degenerate,

    /// The on-screen image rectangle has no area.
    #[error("Displayed image has no area")]
    EmptyDisplay,
}

/// Normalized crop in the displayed (rotated) frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayCropRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Normalized crop in the unrotated source frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceCropRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl SourceCropRect {
    pub const FULL: SourceCropRect = SourceCropRect {
        left: 0.0,
        top: 0.0,
        right: 1.0,
        bottom: 1.0,
    };

    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Map a display-frame crop into the source frame.
    ///
    /// Both corners are mapped through the inverse rotation and re-sorted
    /// into left/top/right/bottom.
    pub fn from_display(rect: DisplayCropRect, rotation: Rotation) -> Self {
        let (x0, y0) = rotation.display_to_source(rect.left, rect.top);
        let (x1, y1) = rotation.display_to_source(rect.right, rect.bottom);
        Self {
            left: x0.min(x1),
            top: y0.min(y1),
            right: x0.max(x1),
            bottom: y0.max(y1),
        }
    }

    /// Describe `region` of a `width`x`height` buffer as a normalized rect.
    pub fn from_region(region: PixelRegion, width: u32, height: u32) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        Self {
            left: region.x as f32 / w,
            top: region.y as f32 / h,
            right: (region.x + region.width) as f32 / w,
            bottom: (region.y + region.height) as f32 / h,
        }
    }

    /// Reject non-finite or empty rectangles.
    pub fn validate(&self) -> Result<(), CropError> {
        let coords = [self.left, self.top, self.right, self.bottom];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(CropError::NonFinite);
        }
        let clamped = self.clamped();
        if clamped.right - clamped.left <= 0.0 || clamped.bottom - clamped.top <= 0.0 {
            return Err(CropError::Degenerate);
        }
        Ok(())
    }

    /// Every coordinate clamped into [0, 1].
    pub fn clamped(&self) -> Self {
        Self {
            left: self.left.clamp(0.0, 1.0),
            top: self.top.clamp(0.0, 1.0),
            right: self.right.clamp(0.0, 1.0),
            bottom: self.bottom.clamp(0.0, 1.0),
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }
}

/// Integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Convert a normalized rect to a pixel rectangle inside `width`x`height`.
///
/// Always returns a region with `x < width`, `y < height`, at least 1x1 and
/// fully inside the image, whatever the input (NaN collapses to 0).
/// `width` and `height` must be non-zero.
pub fn pixel_region(rect: &SourceCropRect, width: u32, height: u32) -> PixelRegion {
    let (x, w) = axis_span(rect.left, rect.right, width);
    let (y, h) = axis_span(rect.top, rect.bottom, height);
    PixelRegion {
        x,
        y,
        width: w,
        height: h,
    }
}

fn axis_span(start: f32, end: f32, extent: u32) -> (u32, u32) {
    let extent = i64::from(extent.max(1));
    let size = extent as f64;
    // `as` saturates and maps NaN to 0
    let first = ((start as f64) * size).round() as i64;
    let last = ((end as f64) * size).round() as i64;

    let first = first.clamp(0, extent - 1);
    let last = last.clamp(0, extent);
    let span = (last - first).clamp(1, extent - first);
    (first as u32, span as u32)
}

/// Copy `region` out of `buffer`. The region must lie inside the buffer.
pub fn crop_buffer(buffer: &PixelBuffer, region: PixelRegion) -> PixelBuffer {
    if region == PixelRegion::full(buffer.width, buffer.height) {
        return buffer.clone();
    }

    let stride = buffer.stride();
    let row_bytes = region.width as usize * 4;
    let mut output = Vec::with_capacity(row_bytes * region.height as usize);

    for y in region.y..region.y + region.height {
        let start = y as usize * stride + region.x as usize * 4;
        output.extend_from_slice(&buffer.pixels[start..start + row_bytes]);
    }

    PixelBuffer::new(region.width, region.height, output)
}

/// Validate `rect`, then crop `buffer` to it.
pub fn apply_crop(
    buffer: &PixelBuffer,
    rect: &SourceCropRect,
) -> Result<(PixelBuffer, PixelRegion), CropError> {
    rect.validate()?;
    let region = pixel_region(&rect.clamped(), buffer.width, buffer.height);
    Ok((crop_buffer(buffer, region), region))
}
