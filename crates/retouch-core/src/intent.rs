//! Immutable description of one frame to render.
//!
//! The UI side builds a [`RenderIntent`] from its edit state and hands it to
//! the render thread; the render thread never reads editor state directly.

use serde::{Deserialize, Serialize};

use crate::adjustments::AdjustmentParams;
use crate::filter::FilterType;
use crate::transform::ViewTransform;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderIntent {
    pub filter: FilterType,
    /// Quick black-and-white toggle; overrides `filter` while set.
    pub grayscale: bool,
    pub adjustments: AdjustmentParams,
    pub view: ViewTransform,
}

impl RenderIntent {
    /// The program that will actually run.
    pub fn program(&self) -> FilterType {
        if self.grayscale {
            FilterType::Grayscale
        } else {
            self.filter
        }
    }

    /// Adjustments the active program reads, or all-zero if it reads none.
    pub fn effective_adjustments(&self) -> AdjustmentParams {
        if self.program().supports_adjustments() {
            self.adjustments.sanitized()
        } else {
            AdjustmentParams::default()
        }
    }

    /// Same look at native resolution: rotation kept, pan and zoom dropped.
    pub fn for_export(&self) -> Self {
        Self {
            view: self.view.without_pan_zoom(),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Rotation;

    #[test]
    fn test_grayscale_toggle_wins() {
        let intent = RenderIntent {
            filter: FilterType::Sepia,
            grayscale: true,
            ..Default::default()
        };
        assert_eq!(intent.program(), FilterType::Grayscale);

        let intent = RenderIntent {
            grayscale: false,
            ..intent
        };
        assert_eq!(intent.program(), FilterType::Sepia);
    }

    #[test]
    fn test_adjustments_only_for_identity() {
        let mut intent = RenderIntent::default();
        intent.adjustments.contrast = 0.5;
        assert_eq!(intent.effective_adjustments().contrast, 0.5);

        intent.filter = FilterType::Warm;
        assert!(!intent.effective_adjustments().has_any_adjustment());

        intent.filter = FilterType::None;
        intent.grayscale = true;
        assert!(!intent.effective_adjustments().has_any_adjustment());
    }

    #[test]
    fn test_for_export_drops_pan_zoom_keeps_rotation() {
        let mut intent = RenderIntent::default();
        intent.view.scale = 3.0;
        intent.view.offset_x = 0.4;
        intent.view.rotation = Rotation::Deg90;

        let export = intent.for_export();
        assert_eq!(export.view.scale, 1.0);
        assert_eq!(export.view.offset_x, 0.0);
        assert_eq!(export.view.rotation, Rotation::Deg90);
    }
}
