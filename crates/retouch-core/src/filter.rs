//! Fixed catalog of filter programs.
//!
//! Every filter is one GPU program: the shared vertex stage in
//! `shaders/common.wgsl` followed by a filter-specific fragment stage.
//! Only [`FilterType::None`] (the "Original" look) exposes the parametric
//! adjustments; the other nine are fixed color transforms.
//!
//! The ordinal of each variant is stable and persisted by older drafts, so new
//! variants must be appended, never inserted.

use serde::{Deserialize, Serialize};

const COMMON_SOURCE: &str = include_str!("shaders/common.wgsl");
const IDENTITY_SOURCE: &str = include_str!("shaders/identity.wgsl");
const GRAYSCALE_SOURCE: &str = include_str!("shaders/grayscale.wgsl");
const SEPIA_SOURCE: &str = include_str!("shaders/sepia.wgsl");
const COOL_SOURCE: &str = include_str!("shaders/cool.wgsl");
const WARM_SOURCE: &str = include_str!("shaders/warm.wgsl");
const VIVID_SOURCE: &str = include_str!("shaders/vivid.wgsl");
const FADE_SOURCE: &str = include_str!("shaders/fade.wgsl");
const INVERT_SOURCE: &str = include_str!("shaders/invert.wgsl");
const BRIGHTNESS_SOURCE: &str = include_str!("shaders/brightness.wgsl");
const CONTRAST_SOURCE: &str = include_str!("shaders/contrast.wgsl");

/// Vertex stage entry point shared by all programs.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment stage entry point shared by all programs.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// One of the ten predefined looks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    /// Identity program with the nine adjustment sliders.
    #[default]
    None,
    Grayscale,
    Sepia,
    Cool,
    Warm,
    Vivid,
    Fade,
    Invert,
    Brightness,
    Contrast,
}

impl FilterType {
    /// All filters in stable ordinal order.
    pub const ALL: [FilterType; 10] = [
        FilterType::None,
        FilterType::Grayscale,
        FilterType::Sepia,
        FilterType::Cool,
        FilterType::Warm,
        FilterType::Vivid,
        FilterType::Fade,
        FilterType::Invert,
        FilterType::Brightness,
        FilterType::Contrast,
    ];

    /// Stable position in [`FilterType::ALL`].
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Inverse of [`FilterType::ordinal`]; out-of-range values map to `None`.
    pub fn from_ordinal(ordinal: usize) -> FilterType {
        Self::ALL.get(ordinal).copied().unwrap_or_default()
    }

    /// Persisted identifier, e.g. `"SEPIA"`.
    pub fn name(self) -> &'static str {
        match self {
            FilterType::None => "NONE",
            FilterType::Grayscale => "GRAYSCALE",
            FilterType::Sepia => "SEPIA",
            FilterType::Cool => "COOL",
            FilterType::Warm => "WARM",
            FilterType::Vivid => "VIVID",
            FilterType::Fade => "FADE",
            FilterType::Invert => "INVERT",
            FilterType::Brightness => "BRIGHTNESS",
            FilterType::Contrast => "CONTRAST",
        }
    }

    /// Parse a persisted identifier (case-insensitive).
    pub fn from_name(name: &str) -> Option<FilterType> {
        Self::ALL
            .iter()
            .copied()
            .find(|filter| filter.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Label shown in the filter strip.
    pub fn display_name(self) -> &'static str {
        match self {
            FilterType::None => "Original",
            FilterType::Grayscale => "Black & White",
            FilterType::Sepia => "Vintage",
            FilterType::Cool => "Cool",
            FilterType::Warm => "Warm",
            FilterType::Vivid => "Vivid",
            FilterType::Fade => "Fade",
            FilterType::Invert => "Invert",
            FilterType::Brightness => "Bright",
            FilterType::Contrast => "High Contrast",
        }
    }

    /// Whether this program reads the adjustment sliders.
    pub fn supports_adjustments(self) -> bool {
        matches!(self, FilterType::None)
    }

    /// Fragment stage source for this filter, without the shared prelude.
    pub fn fragment_source(self) -> &'static str {
        match self {
            FilterType::None => IDENTITY_SOURCE,
            FilterType::Grayscale => GRAYSCALE_SOURCE,
            FilterType::Sepia => SEPIA_SOURCE,
            FilterType::Cool => COOL_SOURCE,
            FilterType::Warm => WARM_SOURCE,
            FilterType::Vivid => VIVID_SOURCE,
            FilterType::Fade => FADE_SOURCE,
            FilterType::Invert => INVERT_SOURCE,
            FilterType::Brightness => BRIGHTNESS_SOURCE,
            FilterType::Contrast => CONTRAST_SOURCE,
        }
    }

    /// Complete WGSL module: shared prelude followed by the fragment stage.
    pub fn program_source(self) -> String {
        let body = self.fragment_source();
        let mut source = String::with_capacity(COMMON_SOURCE.len() + body.len() + 1);
        source.push_str(COMMON_SOURCE);
        source.push('\n');
        source.push_str(body);
        source
    }

    /// Apply this filter's fixed color transform to one unclamped pixel.
    ///
    /// `None` returns the input unchanged; its adjustments are driven by
    /// [`crate::reference`].
    pub fn apply_rgb(self, rgb: [f32; 3]) -> [f32; 3] {
        use crate::adjustments::luminance;

        let [r, g, b] = rgb;
        match self {
            FilterType::None => rgb,
            FilterType::Grayscale => {
                let gray = luminance(rgb);
                [gray; 3]
            }
            FilterType::Sepia => [
                0.393 * r + 0.769 * g + 0.189 * b,
                0.349 * r + 0.686 * g + 0.168 * b,
                0.272 * r + 0.534 * g + 0.131 * b,
            ],
            FilterType::Cool => [r * 0.8, g * 0.9, b * 1.1],
            FilterType::Warm => [r * 1.1, g * 0.95, b * 0.8],
            FilterType::Vivid => {
                let gray = luminance(rgb);
                rgb.map(|c| gray + (c - gray) * 1.5)
            }
            FilterType::Fade => {
                let gray = luminance(rgb);
                rgb.map(|c| gray + (c - gray) * 0.5)
            }
            FilterType::Invert => rgb.map(|c| 1.0 - c),
            FilterType::Brightness => rgb.map(|c| c + 0.2),
            FilterType::Contrast => rgb.map(|c| (c - 0.5) * 1.3 + 0.5),
        }
    }
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map(|_| ())
            .map_err(|e| format!("{e:?}"))
    }

    #[test]
    fn test_every_program_validates() {
        for filter in FilterType::ALL {
            let source = filter.program_source();
            if let Err(err) = validate(&source) {
                panic!("{} failed validation: {err}", filter.name());
            }
        }
    }

    #[test]
    fn test_every_program_has_entry_points() {
        for filter in FilterType::ALL {
            let module = naga::front::wgsl::parse_str(&filter.program_source())
                .expect("program should parse");
            let names: Vec<_> = module.entry_points.iter().map(|ep| ep.name.as_str()).collect();
            assert!(names.contains(&VERTEX_ENTRY), "{filter} missing vertex entry");
            assert!(names.contains(&FRAGMENT_ENTRY), "{filter} missing fragment entry");
        }
    }

    #[test]
    fn test_only_identity_reads_adjustments() {
        for filter in FilterType::ALL {
            let reads = filter.fragment_source().contains("@binding(3)");
            assert_eq!(reads, filter.supports_adjustments(), "{filter}");
        }
    }

    #[test]
    fn test_ordinal_is_stable() {
        assert_eq!(FilterType::None.ordinal(), 0);
        assert_eq!(FilterType::Grayscale.ordinal(), 1);
        assert_eq!(FilterType::Sepia.ordinal(), 2);
        assert_eq!(FilterType::Contrast.ordinal(), 9);
        for (i, filter) in FilterType::ALL.iter().enumerate() {
            assert_eq!(FilterType::from_ordinal(i), *filter);
        }
    }

    #[test]
    fn test_from_ordinal_out_of_range() {
        assert_eq!(FilterType::from_ordinal(10), FilterType::None);
        assert_eq!(FilterType::from_ordinal(usize::MAX), FilterType::None);
    }

    #[test]
    fn test_name_round_trip() {
        for filter in FilterType::ALL {
            assert_eq!(FilterType::from_name(filter.name()), Some(filter));
        }
        assert_eq!(FilterType::from_name("sepia"), Some(FilterType::Sepia));
        assert_eq!(FilterType::from_name("POLAROID"), None);
    }

    #[test]
    fn test_serde_uses_persisted_name() {
        let json = serde_json::to_string(&FilterType::Warm).unwrap();
        assert_eq!(json, "\"WARM\"");
        let back: FilterType = serde_json::from_str("\"INVERT\"").unwrap();
        assert_eq!(back, FilterType::Invert);
    }

    #[test]
    fn test_apply_rgb_samples() {
        let rgb = [0.5, 0.5, 0.5];
        assert_eq!(FilterType::None.apply_rgb(rgb), rgb);
        assert_eq!(FilterType::Invert.apply_rgb([0.2, 0.4, 1.0]), [0.8, 0.6, 0.0]);

        let gray = FilterType::Grayscale.apply_rgb([1.0, 0.0, 0.0]);
        assert!((gray[0] - 0.299).abs() < 1e-6);
        assert_eq!(gray[0], gray[2]);

        // A neutral gray keeps its value under vivid and fade
        let vivid = FilterType::Vivid.apply_rgb(rgb);
        assert!((vivid[0] - 0.5).abs() < 1e-6);
        let fade = FilterType::Fade.apply_rgb(rgb);
        assert!((fade[1] - 0.5).abs() < 1e-6);
    }
}
