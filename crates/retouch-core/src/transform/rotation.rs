//! Quarter-turn display rotation.
//!
//! Rotation is non-destructive: it only changes which texture coordinate each
//! quad corner samples. Positive angles turn the image clockwise. Pixel
//! rotation ([`rotate_buffer`]) is used only by the CPU reference renderer.

use serde::{Deserialize, Serialize};

use crate::pixels::PixelBuffer;

/// One of the four right-angle orientations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Snap an arbitrary angle to the nearest quarter turn.
    ///
    /// The angle is normalized into [0, 360) first, then bucketed:
    /// [0,45) → 0, [45,135) → 90, [135,225) → 180, [225,315) → 270,
    /// [315,360) → 0. Non-finite input snaps to 0.
    pub fn snap(degrees: f32) -> Rotation {
        if !degrees.is_finite() {
            return Rotation::Deg0;
        }
        let normalized = degrees.rem_euclid(360.0);
        if normalized < 45.0 {
            Rotation::Deg0
        } else if normalized < 135.0 {
            Rotation::Deg90
        } else if normalized < 225.0 {
            Rotation::Deg180
        } else if normalized < 315.0 {
            Rotation::Deg270
        } else {
            Rotation::Deg0
        }
    }

    pub fn degrees(self) -> f32 {
        match self {
            Rotation::Deg0 => 0.0,
            Rotation::Deg90 => 90.0,
            Rotation::Deg180 => 180.0,
            Rotation::Deg270 => 270.0,
        }
    }

    /// Add `delta` degrees and snap the result.
    pub fn rotated_by(self, delta: f32) -> Rotation {
        Rotation::snap(self.degrees() + delta)
    }

    /// Number of clockwise quarter turns, 0..=3.
    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    /// True for 90 and 270.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Dimensions of a `width`x`height` image after this rotation.
    pub fn oriented_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Map a normalized point of the rotated (displayed) image back to the
    /// normalized source point it shows. Both use a top-left origin.
    #[inline]
    pub fn display_to_source(self, u: f32, v: f32) -> (f32, f32) {
        match self {
            Rotation::Deg0 => (u, v),
            Rotation::Deg90 => (v, 1.0 - u),
            Rotation::Deg180 => (1.0 - u, 1.0 - v),
            Rotation::Deg270 => (1.0 - v, u),
        }
    }
}

/// Rotate pixels clockwise by `rotation`.
pub fn rotate_buffer(buffer: &PixelBuffer, rotation: Rotation) -> PixelBuffer {
    if rotation == Rotation::Deg0 {
        return buffer.clone();
    }

    let (w, h) = (buffer.width, buffer.height);
    let (out_w, out_h) = rotation.oriented_dimensions(w, h);
    let mut out = Vec::with_capacity(buffer.pixels.len());

    for oy in 0..out_h {
        for ox in 0..out_w {
            let (sx, sy) = match rotation {
                Rotation::Deg0 => (ox, oy),
                Rotation::Deg90 => (oy, h - 1 - ox),
                Rotation::Deg180 => (w - 1 - ox, h - 1 - oy),
                Rotation::Deg270 => (w - 1 - oy, ox),
            };
            out.extend_from_slice(&buffer.pixel(sx, sy));
        }
    }

    PixelBuffer::new(out_w, out_h, out)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: snapping always yields a quarter turn in [0, 360).
        #[test]
        fn prop_snap_is_quarter_turn(degrees in -10_000.0f32..10_000.0) {
            let snapped = Rotation::snap(degrees).degrees();
            prop_assert!([0.0, 90.0, 180.0, 270.0].contains(&snapped));
        }

        /// Property: four clockwise turns return to the start.
        #[test]
        fn prop_four_turns_identity(turns in 0u8..4) {
            let mut rotation = Rotation::Deg0;
            for _ in 0..turns {
                rotation = rotation.rotated_by(90.0);
            }
            let start = rotation;
            for _ in 0..4 {
                rotation = rotation.rotated_by(90.0);
            }
            prop_assert_eq!(rotation, start);
        }

        /// Property: a quarter turn swaps dimensions; a full turn restores the source.
        #[test]
        fn prop_rotate_buffer_dimensions(w in 1u32..12, h in 1u32..12) {
            let pixels: Vec<u8> = (0..w * h * 4).map(|i| (i % 253) as u8).collect();
            let src = PixelBuffer::new(w, h, pixels);
            let once = rotate_buffer(&src, Rotation::Deg90);
            prop_assert_eq!((once.width, once.height), (h, w));
            let back = rotate_buffer(&rotate_buffer(&once, Rotation::Deg90), Rotation::Deg180);
            prop_assert_eq!((back.width, back.height), (w, h));
            prop_assert_eq!(back, src);
        }
    }
}
