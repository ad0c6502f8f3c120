//! Parametric adjustment sliders.
//!
//! Nine bounded sliders applied by the identity program, always in this order:
//! 1. Brightness (additive shift)
//! 2. Contrast (scale around 0.5)
//! 3. Saturation (HSV round-trip)
//! 4. Highlights (weighted by luminance, smoothstep 0.5..1.0)
//! 5. Shadows (weighted by luminance, inverse smoothstep 0.0..0.5)
//! 6. Temperature (red up / blue down)
//! 7. Tint (red up / green down)
//! 8. Clarity (local contrast against a 3x3 box blur)
//! 9. Sharpen (5x center minus the 4-neighbor sum)
//!
//! Each stage operates on the output of the previous one. Stages 8 and 9 need
//! neighboring source pixels and are driven by [`crate::reference`]; the
//! per-pixel helpers here are shared with it.

use serde::{Deserialize, Serialize};

/// Threshold below which clarity and sharpen are skipped.
pub const DETAIL_EPSILON: f32 = 0.01;

/// The nine adjustment sliders.
///
/// `brightness` through `tint` live in [-1.0, 1.0]; `clarity` and `sharpen`
/// live in [0.0, 1.0]. A fresh value has every slider at 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentParams {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub highlights: f32,
    pub shadows: f32,
    /// Negative = cooler, positive = warmer.
    pub temperature: f32,
    /// Negative = greener, positive = more magenta.
    pub tint: f32,
    pub clarity: f32,
    pub sharpen: f32,
}

impl AdjustmentParams {
    /// All sliders at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one slider.
    pub fn get(&self, kind: AdjustmentType) -> f32 {
        match kind {
            AdjustmentType::Brightness => self.brightness,
            AdjustmentType::Contrast => self.contrast,
            AdjustmentType::Saturation => self.saturation,
            AdjustmentType::Highlights => self.highlights,
            AdjustmentType::Shadows => self.shadows,
            AdjustmentType::Temperature => self.temperature,
            AdjustmentType::Tint => self.tint,
            AdjustmentType::Clarity => self.clarity,
            AdjustmentType::Sharpen => self.sharpen,
        }
    }

    /// Write one slider.
    ///
    /// No range validation happens here: slider widgets already produce
    /// bounded output. Use [`AdjustmentParams::set_clamped`] for untrusted input.
    pub fn set(&mut self, kind: AdjustmentType, value: f32) {
        let slot = self.slot_mut(kind);
        *slot = value;
    }

    /// Write one slider, clamped to its declared range.
    pub fn set_clamped(&mut self, kind: AdjustmentType, value: f32) {
        self.set(kind, kind.clamp(value));
    }

    /// Add every slider of `other` into `self`, clamping each to its own range.
    pub fn merge(&mut self, other: &AdjustmentParams) {
        for kind in AdjustmentType::ALL {
            let merged = self.get(kind) + other.get(kind);
            self.set(kind, kind.clamp(merged));
        }
    }

    /// Return every slider to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True if any slider deviates from zero.
    pub fn has_any_adjustment(&self) -> bool {
        AdjustmentType::ALL
            .iter()
            .any(|kind| self.get(*kind) != kind.default_value())
    }

    /// True if every slider lies within its declared range.
    pub fn is_within_bounds(&self) -> bool {
        AdjustmentType::ALL.iter().all(|kind| {
            let v = self.get(*kind);
            v >= kind.min() && v <= kind.max()
        })
    }

    /// Copy with every slider clamped to its range and non-finite values zeroed.
    pub fn sanitized(&self) -> Self {
        let mut out = *self;
        for kind in AdjustmentType::ALL {
            let v = out.get(kind);
            let v = if v.is_finite() { kind.clamp(v) } else { 0.0 };
            out.set(kind, v);
        }
        out
    }

    fn slot_mut(&mut self, kind: AdjustmentType) -> &mut f32 {
        match kind {
            AdjustmentType::Brightness => &mut self.brightness,
            AdjustmentType::Contrast => &mut self.contrast,
            AdjustmentType::Saturation => &mut self.saturation,
            AdjustmentType::Highlights => &mut self.highlights,
            AdjustmentType::Shadows => &mut self.shadows,
            AdjustmentType::Temperature => &mut self.temperature,
            AdjustmentType::Tint => &mut self.tint,
            AdjustmentType::Clarity => &mut self.clarity,
            AdjustmentType::Sharpen => &mut self.sharpen,
        }
    }
}

/// Enumerated slider key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    Brightness,
    Contrast,
    Saturation,
    Highlights,
    Shadows,
    Temperature,
    Tint,
    Clarity,
    Sharpen,
}

impl AdjustmentType {
    /// Every slider, in application order.
    pub const ALL: [AdjustmentType; 9] = [
        AdjustmentType::Brightness,
        AdjustmentType::Contrast,
        AdjustmentType::Saturation,
        AdjustmentType::Highlights,
        AdjustmentType::Shadows,
        AdjustmentType::Temperature,
        AdjustmentType::Tint,
        AdjustmentType::Clarity,
        AdjustmentType::Sharpen,
    ];

    pub fn min(self) -> f32 {
        match self {
            AdjustmentType::Clarity | AdjustmentType::Sharpen => 0.0,
            _ => -1.0,
        }
    }

    pub fn max(self) -> f32 {
        1.0
    }

    pub fn default_value(self) -> f32 {
        0.0
    }

    pub fn clamp(self, value: f32) -> f32 {
        value.clamp(self.min(), self.max())
    }

    /// Human-readable label for slider UIs.
    pub fn display_name(self) -> &'static str {
        match self {
            AdjustmentType::Brightness => "Brightness",
            AdjustmentType::Contrast => "Contrast",
            AdjustmentType::Saturation => "Saturation",
            AdjustmentType::Highlights => "Highlights",
            AdjustmentType::Shadows => "Shadows",
            AdjustmentType::Temperature => "Temperature",
            AdjustmentType::Tint => "Tint",
            AdjustmentType::Clarity => "Clarity",
            AdjustmentType::Sharpen => "Sharpen",
        }
    }

    /// Name of the matching field in the identity program's uniform block.
    pub fn uniform_name(self) -> &'static str {
        match self {
            AdjustmentType::Brightness => "brightness",
            AdjustmentType::Contrast => "contrast",
            AdjustmentType::Saturation => "saturation",
            AdjustmentType::Highlights => "highlights",
            AdjustmentType::Shadows => "shadows",
            AdjustmentType::Temperature => "temperature",
            AdjustmentType::Tint => "tint",
            AdjustmentType::Clarity => "clarity",
            AdjustmentType::Sharpen => "sharpen",
        }
    }
}

pub(crate) type Rgb = [f32; 3];

/// Rec. 601 luma, matching the programs.
#[inline]
pub(crate) fn luminance(rgb: Rgb) -> f32 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

#[inline]
pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

#[inline]
fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn step(edge: f32, x: f32) -> f32 {
    if x >= edge {
        1.0
    } else {
        0.0
    }
}

/// Branch-free RGB to HSV, identical to the shader helper.
pub(crate) fn rgb_to_hsv(c: Rgb) -> Rgb {
    let [r, g, b] = c;
    let k = [0.0, -1.0 / 3.0, 2.0 / 3.0, -1.0];
    let s = step(b, g);
    let p = [
        mix(b, g, s),
        mix(g, b, s),
        mix(k[3], k[0], s),
        mix(k[2], k[1], s),
    ];
    let s = step(p[0], r);
    let q = [
        mix(p[0], r, s),
        mix(p[1], p[1], s),
        mix(p[3], p[2], s),
        mix(r, p[0], s),
    ];
    let d = q[0] - q[3].min(q[1]);
    let e = 1.0e-10;
    [
        (q[2] + (q[3] - q[1]) / (6.0 * d + e)).abs(),
        d / (q[0] + e),
        q[0],
    ]
}

/// HSV back to RGB, identical to the shader helper.
pub(crate) fn hsv_to_rgb(c: Rgb) -> Rgb {
    let [h, s, v] = c;
    let k = [1.0, 2.0 / 3.0, 1.0 / 3.0, 3.0];
    let channel = |offset: f32| {
        let p = (fract(h + offset) * 6.0 - k[3]).abs();
        v * mix(k[0], (p - k[0]).clamp(0.0, 1.0), s)
    };
    [channel(k[0]), channel(k[1]), channel(k[2])]
}

/// Stages 1-7 on one pixel. Values are not clamped between stages.
pub(crate) fn apply_tonal(rgb: Rgb, params: &AdjustmentParams) -> Rgb {
    let mut rgb = apply_brightness(rgb, params.brightness);
    rgb = apply_contrast(rgb, params.contrast);
    rgb = apply_saturation(rgb, params.saturation);

    let luma = luminance(rgb);
    rgb = apply_highlights(rgb, luma, params.highlights);
    rgb = apply_shadows(rgb, luma, params.shadows);
    rgb = apply_temperature(rgb, params.temperature);
    apply_tint(rgb, params.tint)
}

#[inline]
fn apply_brightness(rgb: Rgb, brightness: f32) -> Rgb {
    let shift = brightness * 0.5;
    rgb.map(|c| c + shift)
}

#[inline]
fn apply_contrast(rgb: Rgb, contrast: f32) -> Rgb {
    let factor = 1.0 + contrast;
    rgb.map(|c| (c - 0.5) * factor + 0.5)
}

#[inline]
fn apply_saturation(rgb: Rgb, saturation: f32) -> Rgb {
    let mut hsv = rgb_to_hsv(rgb);
    hsv[1] *= 1.0 + saturation;
    hsv_to_rgb(hsv)
}

#[inline]
fn apply_highlights(rgb: Rgb, luma: f32, highlights: f32) -> Rgb {
    let boost = smoothstep(0.5, 1.0, luma) * highlights * 0.3;
    rgb.map(|c| c + boost)
}

#[inline]
fn apply_shadows(rgb: Rgb, luma: f32, shadows: f32) -> Rgb {
    let mask = 1.0 - smoothstep(0.0, 0.5, luma);
    let boost = mask * shadows * 0.3;
    rgb.map(|c| c + boost)
}

#[inline]
fn apply_temperature(rgb: Rgb, temperature: f32) -> Rgb {
    let shift = temperature * 0.1;
    [rgb[0] + shift, rgb[1], rgb[2] - shift]
}

#[inline]
fn apply_tint(rgb: Rgb, tint: f32) -> Rgb {
    [rgb[0] + tint * 0.1, rgb[1] - tint * 0.05, rgb[2]]
}

/// Stage 8: blend toward `rgb + (rgb - blurred) * 0.5`.
#[inline]
pub(crate) fn apply_clarity(rgb: Rgb, blurred: Rgb, clarity: f32) -> Rgb {
    if clarity <= DETAIL_EPSILON {
        return rgb;
    }
    let mut out = rgb;
    for i in 0..3 {
        let detail = rgb[i] + (rgb[i] - blurred[i]) * 0.5;
        out[i] = mix(rgb[i], detail, clarity);
    }
    out
}

/// Stage 9: `neighbors` is the sum of the four axis-aligned source neighbors.
#[inline]
pub(crate) fn apply_sharpen(rgb: Rgb, neighbors: Rgb, sharpen: f32) -> Rgb {
    if sharpen <= DETAIL_EPSILON {
        return rgb;
    }
    let mut out = rgb;
    for i in 0..3 {
        let sharp = rgb[i] * 5.0 - neighbors[i];
        out[i] = mix(rgb[i], sharp, sharpen * 0.5);
    }
    out
}
