//! CPU rendition of the filter programs.
//!
//! Produces the same pixels an export renders on the GPU: native resolution,
//! quarter-turn rotation applied, pan and zoom ignored. Neighborhood samples
//! clamp to the edge like the GPU sampler. The 3x3 blur and the 4-neighbor
//! sharpen kernels are symmetric under quarter turns, so filtering happens in
//! source space and the result is rotated afterwards.

use tracing::debug;

use crate::adjustments::{apply_clarity, apply_sharpen, apply_tonal, AdjustmentParams, Rgb};
use crate::filter::FilterType;
use crate::intent::RenderIntent;
use crate::pixels::PixelBuffer;
use crate::transform::rotate_buffer;

/// Render `intent` over `source` at export resolution.
pub fn render_reference(source: &PixelBuffer, intent: &RenderIntent) -> PixelBuffer {
    let intent = intent.for_export();
    let program = intent.program();
    let params = intent.effective_adjustments();

    debug!(
        %program,
        width = source.width,
        height = source.height,
        rotation = intent.view.rotation.degrees(),
        "cpu reference render"
    );

    let filtered = if program == FilterType::None && !params.has_any_adjustment() {
        source.clone()
    } else {
        filter_buffer(source, program, &params)
    };
    rotate_buffer(&filtered, intent.view.rotation)
}

fn filter_buffer(source: &PixelBuffer, program: FilterType, params: &AdjustmentParams) -> PixelBuffer {
    let sampler = Sampler { buffer: source };
    let mut out = Vec::with_capacity(source.pixels.len());

    for y in 0..source.height as i64 {
        for x in 0..source.width as i64 {
            let alpha = source.pixel(x as u32, y as u32)[3];
            let rgb = sampler.rgb(x, y);
            let shaded = match program {
                FilterType::None => shade_identity(&sampler, x, y, rgb, params),
                other => other.apply_rgb(rgb),
            };
            out.extend_from_slice(&quantize(shaded));
            out.push(alpha);
        }
    }

    PixelBuffer::new(source.width, source.height, out)
}

fn shade_identity(sampler: &Sampler<'_>, x: i64, y: i64, rgb: Rgb, params: &AdjustmentParams) -> Rgb {
    let mut out = apply_tonal(rgb, params);

    if params.clarity > crate::adjustments::DETAIL_EPSILON {
        let mut blurred = [0.0f32; 3];
        for dy in -1..=1 {
            for dx in -1..=1 {
                let s = sampler.rgb(x + dx, y + dy);
                for i in 0..3 {
                    blurred[i] += s[i];
                }
            }
        }
        out = apply_clarity(out, blurred.map(|c| c / 9.0), params.clarity);
    }

    if params.sharpen > crate::adjustments::DETAIL_EPSILON {
        let mut neighbors = [0.0f32; 3];
        for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let s = sampler.rgb(x + dx, y + dy);
            for i in 0..3 {
                neighbors[i] += s[i];
            }
        }
        out = apply_sharpen(out, neighbors, params.sharpen);
    }

    out
}

#[inline]
fn quantize(rgb: Rgb) -> [u8; 3] {
    rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Clamp-to-edge texel fetch in normalized RGB.
struct Sampler<'a> {
    buffer: &'a PixelBuffer,
}

impl Sampler<'_> {
    #[inline]
    fn rgb(&self, x: i64, y: i64) -> Rgb {
        let cx = x.clamp(0, self.buffer.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.buffer.height as i64 - 1) as u32;
        let p = self.buffer.pixel(cx, cy);
        [p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0]
    }
}
