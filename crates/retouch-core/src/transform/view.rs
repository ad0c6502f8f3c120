//! On-screen placement: letterboxing, pan/zoom and the textured quad.
//!
//! Positions are in normalized device coordinates, x right and y up, with the
//! viewport spanning [-1, 1] on both axes. Texture coordinates use a top-left
//! origin. The view matrix is "scale then translate": `p' = s * (p + offset)`.

use serde::{Deserialize, Serialize};

use super::crop::{CropError, DisplayCropRect};
use super::Rotation;

/// Default zoom bounds.
pub const DEFAULT_MIN_SCALE: f32 = 0.1;
pub const DEFAULT_MAX_SCALE: f32 = 5.0;

/// Allowed zoom range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_SCALE,
            max: DEFAULT_MAX_SCALE,
        }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }
}

/// Non-destructive view state: zoom, pan and quarter-turn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub rotation: Rotation,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: Rotation::Deg0,
        }
    }
}

impl ViewTransform {
    /// Largest allowed offset magnitude at the current scale.
    pub fn max_offset(&self) -> f32 {
        2.0 / self.scale
    }

    /// Pan by a delta already expressed in offset units.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
        self.clamp_offsets();
    }

    /// Pan by a drag of `(dx, dy)` screen pixels (y down) in a
    /// `view_width`x`view_height` viewport.
    pub fn pan_pixels(&mut self, dx: f32, dy: f32, view_width: u32, view_height: u32) {
        if view_width == 0 || view_height == 0 {
            return;
        }
        let ndc_dx = dx * 2.0 / view_width as f32 / self.scale;
        let ndc_dy = -dy * 2.0 / view_height as f32 / self.scale;
        if !ndc_dx.is_finite() || !ndc_dy.is_finite() {
            return;
        }
        self.pan_by(ndc_dx, ndc_dy);
    }

    /// Multiply the scale by `factor`, keeping the image point under the
    /// screen-pixel focus `(focus_x, focus_y)` fixed.
    pub fn zoom_about(
        &mut self,
        factor: f32,
        focus_x: f32,
        focus_y: f32,
        view_width: u32,
        view_height: u32,
        limits: ZoomLimits,
    ) {
        if !factor.is_finite() || factor <= 0.0 || view_width == 0 || view_height == 0 {
            return;
        }
        let old = self.scale;
        let new = limits.clamp(old * factor);

        let focus_ndc_x = focus_x / view_width as f32 * 2.0 - 1.0;
        let focus_ndc_y = 1.0 - focus_y / view_height as f32 * 2.0;

        let image_x = (focus_ndc_x - self.offset_x * old) / old;
        let image_y = (focus_ndc_y - self.offset_y * old) / old;

        self.scale = new;
        self.offset_x = (focus_ndc_x - image_x * new) / new;
        self.offset_y = (focus_ndc_y - image_y * new) / new;
        self.clamp_offsets();
    }

    /// Clamp both offsets into `[-2/scale, 2/scale]`; non-finite values reset to 0.
    pub fn clamp_offsets(&mut self) {
        let max = self.max_offset();
        for offset in [&mut self.offset_x, &mut self.offset_y] {
            *offset = if offset.is_finite() {
                offset.clamp(-max, max)
            } else {
                0.0
            };
        }
    }

    /// Copy with scale inside `limits` and offsets inside their bounds.
    pub fn sanitized(&self, limits: ZoomLimits) -> Self {
        let mut out = *self;
        out.scale = if self.scale.is_finite() {
            limits.clamp(self.scale)
        } else {
            1.0
        };
        out.clamp_offsets();
        out
    }

    /// Back to scale 1 and no pan. Rotation is kept.
    pub fn reset_pan_zoom(&mut self) {
        self.scale = 1.0;
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    /// Copy with pan/zoom removed.
    pub fn without_pan_zoom(&self) -> Self {
        let mut out = *self;
        out.reset_pan_zoom();
        out
    }

    /// Column-major 4x4 matrix for `p' = s * (p + offset)`.
    pub fn matrix(&self) -> [[f32; 4]; 4] {
        let s = self.scale;
        [
            [s, 0.0, 0.0, 0.0],
            [0.0, s, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [s * self.offset_x, s * self.offset_y, 0.0, 1.0],
        ]
    }

    /// Apply the matrix to an NDC point.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.scale * (x + self.offset_x),
            self.scale * (y + self.offset_y),
        )
    }
}

/// A rectangle in screen pixels, y down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Where the letterboxed image lands inside the viewport, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    /// Fit an `image_width`x`image_height` image, rotated by `rotation`, into
    /// the viewport while preserving aspect ratio.
    pub fn fit(
        view_width: u32,
        view_height: u32,
        image_width: u32,
        image_height: u32,
        rotation: Rotation,
    ) -> Self {
        if view_width == 0 || view_height == 0 || image_width == 0 || image_height == 0 {
            return Self::default();
        }
        let (iw, ih) = rotation.oriented_dimensions(image_width, image_height);
        let (vw, vh) = (view_width as f32, view_height as f32);

        let image_aspect = iw as f32 / ih as f32;
        let view_aspect = vw / vh;

        let (width, height) = if image_aspect > view_aspect {
            (vw, vw / image_aspect)
        } else {
            (vh * image_aspect, vh)
        };

        Self {
            left: (vw - width) / 2.0,
            top: (vh - height) / 2.0,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Express an on-screen overlay rectangle relative to this rect,
    /// clamped to [0, 1].
    pub fn normalize(&self, overlay: &ScreenRect) -> Result<DisplayCropRect, CropError> {
        if self.is_empty() {
            return Err(CropError::EmptyDisplay);
        }
        let nx = |x: f32| ((x - self.left) / self.width).clamp(0.0, 1.0);
        let ny = |y: f32| ((y - self.top) / self.height).clamp(0.0, 1.0);
        Ok(DisplayCropRect {
            left: nx(overlay.left),
            top: ny(overlay.top),
            right: nx(overlay.right),
            bottom: ny(overlay.bottom),
        })
    }

    /// NDC bounds as `(left, right, bottom, top)`.
    pub fn ndc_bounds(&self, view_width: u32, view_height: u32) -> (f32, f32, f32, f32) {
        let vw = view_width.max(1) as f32;
        let vh = view_height.max(1) as f32;
        (
            self.left / vw * 2.0 - 1.0,
            (self.left + self.width) / vw * 2.0 - 1.0,
            1.0 - (self.top + self.height) / vh * 2.0,
            1.0 - self.top / vh * 2.0,
        )
    }
}

/// One corner of the textured quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

/// Triangle-strip quad spanning the given NDC bounds.
///
/// Corners are emitted bottom-left, bottom-right, top-left, top-right. Each
/// samples the source point that `rotation` places at that display corner.
pub fn quad_between(left: f32, right: f32, bottom: f32, top: f32, rotation: Rotation) -> [QuadVertex; 4] {
    // (position, display-space uv)
    let corners = [
        ([left, bottom], (0.0, 1.0)),
        ([right, bottom], (1.0, 1.0)),
        ([left, top], (0.0, 0.0)),
        ([right, top], (1.0, 0.0)),
    ];
    corners.map(|(position, (u, v))| {
        let (s, t) = rotation.display_to_source(u, v);
        QuadVertex {
            position,
            tex_coord: [s, t],
        }
    })
}

/// Quad covering `rect` inside a `view_width`x`view_height` viewport.
pub fn quad_vertices(
    rect: &DisplayRect,
    view_width: u32,
    view_height: u32,
    rotation: Rotation,
) -> [QuadVertex; 4] {
    let (left, right, bottom, top) = rect.ndc_bounds(view_width, view_height);
    quad_between(left, right, bottom, top, rotation)
}

/// Quad covering the entire target, used for export.
pub fn full_quad(rotation: Rotation) -> [QuadVertex; 4] {
    quad_between(-1.0, 1.0, -1.0, 1.0, rotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_default_matrix_is_identity() {
        let m = ViewTransform::default().matrix();
        for (i, col) in m.iter().enumerate() {
            for (j, v) in col.iter().enumerate() {
                assert_eq!(*v, if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_matrix_scale_then_translate() {
        let view = ViewTransform {
            scale: 2.0,
            offset_x: 0.25,
            offset_y: -0.5,
            rotation: Rotation::Deg0,
        };
        let m = view.matrix();
        assert_eq!(m[3][0], 0.5);
        assert_eq!(m[3][1], -1.0);
        assert_eq!(view.apply(0.0, 0.0), (0.5, -1.0));
    }

    #[test]
    fn test_pan_pixels_direction() {
        let mut view = ViewTransform::default();
        view.pan_pixels(100.0, 50.0, 1000, 500);
        assert!(close(view.offset_x, 0.2));
        assert!(close(view.offset_y, -0.2), "screen y down is NDC y up");
    }

    #[test]
    fn test_pan_clamped() {
        let mut view = ViewTransform::default();
        view.pan_pixels(100_000.0, -100_000.0, 100, 100);
        assert_eq!(view.offset_x, 2.0);
        assert_eq!(view.offset_y, 2.0);
    }

    #[test]
    fn test_pan_zero_viewport_is_noop() {
        let mut view = ViewTransform::default();
        view.pan_pixels(10.0, 10.0, 0, 100);
        assert_eq!(view, ViewTransform::default());
    }

    #[test]
    fn test_zoom_about_center_keeps_offsets() {
        let mut view = ViewTransform::default();
        view.zoom_about(2.0, 500.0, 250.0, 1000, 500, ZoomLimits::default());
        assert!(close(view.scale, 2.0));
        assert!(close(view.offset_x, 0.0));
        assert!(close(view.offset_y, 0.0));
    }

    #[test]
    fn test_zoom_about_keeps_focus_fixed() {
        let mut view = ViewTransform::default();
        let (fx, fy) = (750.0, 125.0);
        let focus_ndc = (fx / 1000.0 * 2.0 - 1.0, 1.0 - fy / 500.0 * 2.0);

        // At scale 1 with no pan, the image point under the focus is the focus itself
        view.zoom_about(1.5, fx, fy, 1000, 500, ZoomLimits::default());
        let mapped = view.apply(focus_ndc.0, focus_ndc.1);
        assert!(close(view.scale, 1.5));
        assert!(close(mapped.0, focus_ndc.0));
        assert!(close(mapped.1, focus_ndc.1));
    }

    #[test]
    fn test_zoom_clamped_to_limits() {
        let mut view = ViewTransform::default();
        view.zoom_about(100.0, 0.0, 0.0, 100, 100, ZoomLimits::default());
        assert_eq!(view.scale, DEFAULT_MAX_SCALE);
        view.zoom_about(0.0001, 0.0, 0.0, 100, 100, ZoomLimits::default());
        assert_eq!(view.scale, DEFAULT_MIN_SCALE);
    }

    #[test]
    fn test_zoom_rejects_bad_factor() {
        let mut view = ViewTransform::default();
        view.zoom_about(f32::NAN, 0.0, 0.0, 100, 100, ZoomLimits::default());
        view.zoom_about(-2.0, 0.0, 0.0, 100, 100, ZoomLimits::default());
        assert_eq!(view, ViewTransform::default());
    }

    #[test]
    fn test_reset_keeps_rotation() {
        let mut view = ViewTransform {
            scale: 3.0,
            offset_x: 0.1,
            offset_y: 0.2,
            rotation: Rotation::Deg270,
        };
        view.reset_pan_zoom();
        assert_eq!(view.scale, 1.0);
        assert_eq!(view.rotation, Rotation::Deg270);
    }

    #[test]
    fn test_fit_landscape_in_portrait() {
        let rect = DisplayRect::fit(1000, 2000, 400, 200, Rotation::Deg0);
        assert_eq!(rect.width, 1000.0);
        assert_eq!(rect.height, 500.0);
        assert_eq!(rect.top, 750.0);
        assert_eq!(rect.left, 0.0);
    }

    #[test]
    fn test_fit_swaps_for_quarter_turn() {
        let rect = DisplayRect::fit(1000, 2000, 400, 200, Rotation::Deg90);
        // Rotated image is 200x400, aspect 0.5 = viewport aspect
        assert_eq!(rect.width, 1000.0);
        assert_eq!(rect.height, 2000.0);
    }

    #[test]
    fn test_fit_empty_inputs() {
        assert!(DisplayRect::fit(0, 100, 10, 10, Rotation::Deg0).is_empty());
        assert!(DisplayRect::fit(100, 100, 0, 10, Rotation::Deg0).is_empty());
    }

    #[test]
    fn test_normalize_overlay() {
        let rect = DisplayRect {
            left: 100.0,
            top: 50.0,
            width: 200.0,
            height: 100.0,
        };
        let overlay = ScreenRect {
            left: 150.0,
            top: 0.0,
            right: 250.0,
            bottom: 100.0,
        };
        let crop = rect.normalize(&overlay).unwrap();
        assert_eq!(crop.left, 0.25);
        assert_eq!(crop.top, 0.0, "clamped");
        assert_eq!(crop.right, 0.75);
        assert_eq!(crop.bottom, 0.5);
    }

    #[test]
    fn test_normalize_empty_display() {
        let overlay = ScreenRect {
            left: 0.0,
            top: 0.0,
            right: 1.0,
            bottom: 1.0,
        };
        assert_eq!(
            DisplayRect::default().normalize(&overlay),
            Err(CropError::EmptyDisplay)
        );
    }

    #[test]
    fn test_full_quad_unrotated() {
        let quad = full_quad(Rotation::Deg0);
        assert_eq!(quad[2].position, [-1.0, 1.0]);
        assert_eq!(quad[2].tex_coord, [0.0, 0.0], "top-left samples top-left");
        assert_eq!(quad[1].position, [1.0, -1.0]);
        assert_eq!(quad[1].tex_coord, [1.0, 1.0]);
    }

    #[test]
    fn test_full_quad_rotated_90() {
        let quad = full_quad(Rotation::Deg90);
        // Top-left corner shows the source's bottom-left
        assert_eq!(quad[2].tex_coord, [0.0, 1.0]);
        // Top-right corner shows the source's top-left
        assert_eq!(quad[3].tex_coord, [0.0, 0.0]);
    }

    #[test]
    fn test_quad_vertices_letterboxed() {
        let rect = DisplayRect {
            left: 0.0,
            top: 250.0,
            width: 1000.0,
            height: 500.0,
        };
        let quad = quad_vertices(&rect, 1000, 1000, Rotation::Deg0);
        assert_eq!(quad[0].position, [-1.0, -0.5]);
        assert_eq!(quad[3].position, [1.0, 0.5]);
    }
}
