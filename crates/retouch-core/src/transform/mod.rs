//! Geometry of the edit: rotation, crop and on-screen placement.
//!
//! # Transform Order
//!
//! When rendering, geometry is applied in this order:
//! 1. Crop (already baked into the source pixels)
//! 2. Rotation (quad texture coordinates, quarter turns only)
//! 3. Letterbox fit into the viewport
//! 4. Zoom and pan (view matrix)
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise
//! - Crop coordinates are normalized (0.0 to 1.0)
//! - Texture origin is the top-left corner; NDC y points up

mod crop;
mod rotation;
mod view;

pub use crop::{
    apply_crop, crop_buffer, pixel_region, CropError, DisplayCropRect, PixelRegion,
    SourceCropRect,
};
pub use rotation::{rotate_buffer, Rotation};
pub use view::{
    full_quad, quad_between, quad_vertices, DisplayRect, QuadVertex, ScreenRect, ViewTransform,
    ZoomLimits, DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE,
};
