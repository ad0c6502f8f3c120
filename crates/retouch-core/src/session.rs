//! Coordination-side edit session.
//!
//! [`EditSession`] owns the live edit state on the input thread. It never
//! touches GPU resources: every change produces a new [`RenderIntent`], crops
//! are requested as a [`CropRequest`] and only recorded once the render side
//! reports a [`PixelState`], and undo/redo return a [`Restore`] plan for the
//! render side to carry out.
//!
//! History uses a post-change model: the entry under the cursor always equals
//! the last committed state. An initial entry is pushed when the session
//! opens; each discrete action pushes the state after it. Slider drags are
//! coalesced by [`AdjustmentDebouncer`] and committed once the drag goes quiet
//! or right before the next discrete action, undo/redo or mode exit.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::adjustments::{AdjustmentParams, AdjustmentType};
use crate::config::EditorConfig;
use crate::draft::Draft;
use crate::filter::FilterType;
use crate::history::{EditHistory, EditState};
use crate::intent::RenderIntent;
use crate::pixels::PixelVersion;
use crate::transform::{
    CropError, DisplayRect, ScreenRect, SourceCropRect, ViewTransform, ZoomLimits,
};

/// Mutually exclusive UI modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EditorMode {
    #[default]
    Normal,
    CropEditing,
    FilterPicking,
    AdjustmentEditing,
}

impl EditorMode {
    /// Pan and zoom gestures are ignored while cropping or picking a filter.
    pub fn gestures_enabled(self) -> bool {
        !matches!(self, EditorMode::CropEditing | EditorMode::FilterPicking)
    }
}

/// Coalesces a run of slider changes into one history entry.
#[derive(Debug, Clone)]
pub struct AdjustmentDebouncer {
    window: Duration,
    last_change: Option<Instant>,
}

impl AdjustmentDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_change: None,
        }
    }

    /// Note a change at `now`. Returns true if it starts a new run.
    pub fn record_change(&mut self, now: Instant) -> bool {
        self.last_change.replace(now).is_none()
    }

    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// True once the run has been quiet for the whole window.
    pub fn due(&self, now: Instant) -> bool {
        self.last_change
            .is_some_and(|last| now.saturating_duration_since(last) >= self.window)
    }

    /// End the current run. Returns true if one was pending.
    pub fn take(&mut self) -> bool {
        self.last_change.take().is_some()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Which pixels are current, as reported by the render side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelState {
    pub version: PixelVersion,
    pub width: u32,
    pub height: u32,
    /// Cumulative crop relative to the decoded original, `None` if uncropped.
    pub crop: Option<SourceCropRect>,
}

impl PixelState {
    /// The decoded original.
    pub fn root(width: u32, height: u32) -> Self {
        Self {
            version: PixelVersion::ROOT,
            width,
            height,
            crop: None,
        }
    }
}

/// A validated crop waiting to be baked on the render thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRequest {
    /// Crop relative to the current source pixels.
    pub rect: SourceCropRect,
    /// Pixel version the rect refers to.
    pub base: PixelVersion,
}

/// What the render side must do to show a state popped from history.
#[derive(Debug, Clone, PartialEq)]
pub struct Restore {
    /// Pixel version to roll to first, if it differs from the live one.
    pub pixel_version: Option<PixelVersion>,
    pub intent: RenderIntent,
    pub state: EditState,
}

/// Live edit state for one open image.
#[derive(Debug)]
pub struct EditSession {
    mode: EditorMode,
    filter: FilterType,
    grayscale: bool,
    adjustments: AdjustmentParams,
    view: ViewTransform,
    pixels: PixelState,
    viewport: (u32, u32),
    zoom_limits: ZoomLimits,
    history: EditHistory,
    debouncer: AdjustmentDebouncer,
    pending_crop: Option<CropRequest>,
    draft_created_at: Option<DateTime<Utc>>,
}

impl EditSession {
    /// Start a session on freshly decoded pixels and record the initial state.
    pub fn new(pixels: PixelState, config: &EditorConfig) -> Self {
        let mut session = Self {
            mode: EditorMode::Normal,
            filter: FilterType::None,
            grayscale: false,
            adjustments: AdjustmentParams::default(),
            view: ViewTransform::default(),
            pixels,
            viewport: (0, 0),
            zoom_limits: config.zoom_limits(),
            history: EditHistory::new(config.history_capacity),
            debouncer: AdjustmentDebouncer::new(config.debounce()),
            pending_crop: None,
            draft_created_at: None,
        };
        session.push_snapshot();
        session
    }

    /// Resume a draft. `pixels` must already reflect the draft's crop.
    pub fn from_draft(draft: &Draft, pixels: PixelState, config: &EditorConfig) -> Self {
        let limits = config.zoom_limits();
        let mut session = Self {
            mode: EditorMode::Normal,
            filter: draft.filter(),
            grayscale: draft.is_grayscale_enabled,
            adjustments: draft.adjustments.sanitized(),
            view: draft.view(limits),
            pixels,
            viewport: (0, 0),
            zoom_limits: limits,
            history: EditHistory::new(config.history_capacity),
            debouncer: AdjustmentDebouncer::new(config.debounce()),
            pending_crop: None,
            draft_created_at: Some(draft.created_at),
        };
        session.push_snapshot();
        info!(
            filter = %session.filter,
            rotation = session.view.rotation.degrees(),
            cropped = session.pixels.crop.is_some(),
            "resumed draft"
        );
        session
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Switch UI mode. Leaving adjustment editing commits a pending slider run;
    /// entering crop editing drops pan and zoom so the overlay maps onto the
    /// letterboxed image.
    pub fn set_mode(&mut self, mode: EditorMode) {
        if mode == self.mode {
            return;
        }
        if self.mode == EditorMode::AdjustmentEditing {
            self.flush();
        }
        if mode == EditorMode::CropEditing {
            self.view.reset_pan_zoom();
        }
        debug!(from = ?self.mode, to = ?mode, "mode change");
        self.mode = mode;
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Select a filter. Returns false if it was already active.
    pub fn apply_filter(&mut self, filter: FilterType) -> bool {
        self.flush();
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        self.push_snapshot();
        true
    }

    /// Set the black-and-white toggle. Returns false if unchanged.
    pub fn set_grayscale(&mut self, enabled: bool) -> bool {
        self.flush();
        if enabled == self.grayscale {
            return false;
        }
        self.grayscale = enabled;
        self.push_snapshot();
        true
    }

    /// Rotate by `delta` degrees (positive = clockwise), snapped to a quarter turn.
    pub fn rotate(&mut self, delta: f32) -> bool {
        self.flush();
        let next = self.view.rotation.rotated_by(delta);
        if next == self.view.rotation {
            return false;
        }
        self.view.rotation = next;
        self.view.clamp_offsets();
        self.push_snapshot();
        true
    }

    /// Move one slider at time `now`.
    ///
    /// Ignored (returns false) when the active program does not read
    /// adjustments. The value is clamped to the slider's range.
    pub fn set_adjustment(&mut self, kind: AdjustmentType, value: f32, now: Instant) -> bool {
        if !self.intent().program().supports_adjustments() {
            debug!(?kind, program = %self.intent().program(), "adjustment ignored by active program");
            return false;
        }
        if !value.is_finite() {
            warn!(?kind, value, "rejected non-finite adjustment");
            return false;
        }
        self.adjustments.set_clamped(kind, value);
        self.debouncer.record_change(now);
        true
    }

    /// Zero every slider as one history entry.
    pub fn reset_adjustments(&mut self) -> bool {
        self.flush();
        if !self.adjustments.has_any_adjustment() {
            return false;
        }
        self.adjustments.reset();
        self.push_snapshot();
        true
    }

    /// Drag by screen pixels. Ignored while gestures are disabled.
    pub fn pan_pixels(&mut self, dx: f32, dy: f32) -> bool {
        if !self.mode.gestures_enabled() {
            return false;
        }
        let (w, h) = self.viewport;
        self.view.pan_pixels(dx, dy, w, h);
        true
    }

    /// Pinch zoom about a screen-pixel focus. Ignored while gestures are disabled.
    pub fn zoom_about(&mut self, factor: f32, focus_x: f32, focus_y: f32) -> bool {
        if !self.mode.gestures_enabled() {
            return false;
        }
        let (w, h) = self.viewport;
        self.view
            .zoom_about(factor, focus_x, focus_y, w, h, self.zoom_limits);
        true
    }

    /// Turn an on-screen crop overlay into a crop request for the render side.
    ///
    /// The overlay is in viewport pixels. On success pan and zoom are reset
    /// and the crop stays pending until [`EditSession::complete_crop`]; a
    /// rejected overlay leaves the view untouched.
    pub fn begin_crop(&mut self, overlay: &ScreenRect) -> Result<CropRequest, CropError> {
        self.flush();

        let (vw, vh) = self.viewport;
        let display = DisplayRect::fit(
            vw,
            vh,
            self.pixels.width,
            self.pixels.height,
            self.view.rotation,
        );
        let normalized = display.normalize(overlay).inspect_err(|e| {
            warn!(error = %e, "crop overlay could not be mapped");
        })?;
        let rect = SourceCropRect::from_display(normalized, self.view.rotation);
        rect.validate().inspect_err(|e| {
            warn!(error = %e, ?rect, "rejected crop");
        })?;

        self.view.reset_pan_zoom();
        let request = CropRequest {
            rect,
            base: self.pixels.version,
        };
        self.pending_crop = Some(request);
        Ok(request)
    }

    /// Record a crop the render side has finished baking.
    pub fn complete_crop(&mut self, outcome: PixelState) {
        self.pending_crop = None;
        self.pixels = outcome;
        self.view.reset_pan_zoom();
        if self.mode == EditorMode::CropEditing {
            self.mode = EditorMode::Normal;
        }
        info!(
            version = %outcome.version,
            width = outcome.width,
            height = outcome.height,
            "crop applied"
        );
        self.push_snapshot();
    }

    /// Forget a pending crop the render side rejected.
    pub fn cancel_crop(&mut self) {
        self.pending_crop = None;
    }

    pub fn pending_crop(&self) -> Option<&CropRequest> {
        self.pending_crop.as_ref()
    }

    /// Replace the pixel bookkeeping without touching history, e.g. after a
    /// restore fell back to a different version.
    pub fn sync_pixels(&mut self, pixels: PixelState) {
        self.pixels = pixels;
    }

    pub fn pixels(&self) -> PixelState {
        self.pixels
    }

    pub fn undo(&mut self) -> Option<Restore> {
        self.flush();
        let state = self.history.undo()?.clone();
        Some(self.restore(state))
    }

    pub fn redo(&mut self) -> Option<Restore> {
        self.flush();
        let state = self.history.redo()?.clone();
        Some(self.restore(state))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.debouncer.is_pending()
    }

    pub fn can_redo(&self) -> bool {
        !self.debouncer.is_pending() && self.history.can_redo()
    }

    /// Commit a slider run whose debounce window has elapsed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.debouncer.due(now) {
            self.flush();
            true
        } else {
            false
        }
    }

    /// Commit any pending slider run now.
    pub fn flush(&mut self) {
        if self.debouncer.take() {
            self.push_snapshot();
        }
    }

    pub fn has_pending_adjustments(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Current live state as a history entry.
    pub fn snapshot(&self) -> EditState {
        EditState {
            adjustments: self.adjustments,
            view: self.view,
            crop_rect: self.pixels.crop,
            grayscale: self.grayscale,
            filter: self.filter,
            pixel_version: self.pixels.version,
            image_width: self.pixels.width,
            image_height: self.pixels.height,
            captured_at: Utc::now(),
        }
    }

    /// Immutable frame description for the render thread.
    pub fn intent(&self) -> RenderIntent {
        RenderIntent {
            filter: self.filter,
            grayscale: self.grayscale,
            adjustments: self.adjustments,
            view: self.view,
        }
    }

    /// Serializable draft of the live state.
    pub fn draft(&self, original_image_uri: &str) -> Draft {
        let now = Utc::now();
        let mut draft = Draft::new(original_image_uri);
        draft.created_at = self.draft_created_at.unwrap_or(now);
        draft.modified_at = now;
        draft.is_grayscale_enabled = self.grayscale;
        draft.filter_type = self.filter.name().to_string();
        draft.adjustments = self.adjustments;
        draft.scale_factor = self.view.scale;
        draft.offset_x = self.view.offset_x;
        draft.offset_y = self.view.offset_y;
        draft.rotation_angle = self.view.rotation.degrees();
        draft.set_crop(self.pixels.crop);
        draft
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn adjustments(&self) -> &AdjustmentParams {
        &self.adjustments
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    fn push_snapshot(&mut self) {
        let state = self.snapshot();
        self.history.add_state(state);
        debug!(
            cursor = ?self.history.cursor(),
            len = self.history.len(),
            "history snapshot"
        );
    }

    fn restore(&mut self, state: EditState) -> Restore {
        let pixel_version =
            (state.pixel_version != self.pixels.version).then_some(state.pixel_version);

        self.adjustments = state.adjustments;
        self.view = state.view;
        self.filter = state.filter;
        self.grayscale = state.grayscale;
        self.pixels = PixelState {
            version: state.pixel_version,
            width: state.image_width,
            height: state.image_height,
            crop: state.crop_rect,
        };
        self.pending_crop = None;

        Restore {
            pixel_version,
            intent: self.intent(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditSession {
        let mut s = EditSession::new(PixelState::root(400, 200), &EditorConfig::default());
        s.set_viewport(800, 400);
        s
    }

    fn overlay(left: f32, top: f32, right: f32, bottom: f32) -> ScreenRect {
        ScreenRect {
            left,
            top,
            right,
            bottom,
        }
    }

    #[test]
    fn test_initial_entry() {
        let s = session();
        assert_eq!(s.history().len(), 1);
        assert!(!s.can_undo());
        assert!(!s.can_redo());
    }

    #[test]
    fn test_mode_gestures() {
        assert!(EditorMode::Normal.gestures_enabled());
        assert!(EditorMode::AdjustmentEditing.gestures_enabled());
        assert!(!EditorMode::CropEditing.gestures_enabled());
        assert!(!EditorMode::FilterPicking.gestures_enabled());
    }

    #[test]
    fn test_gestures_suppressed_in_crop_mode() {
        let mut s = session();
        s.set_mode(EditorMode::CropEditing);
        assert!(!s.pan_pixels(50.0, 0.0));
        assert!(!s.zoom_about(2.0, 0.0, 0.0));
        assert_eq!(*s.view(), ViewTransform::default());
    }

    #[test]
    fn test_entering_crop_resets_pan_zoom() {
        let mut s = session();
        s.zoom_about(2.0, 400.0, 200.0);
        s.pan_pixels(40.0, 0.0);
        s.set_mode(EditorMode::CropEditing);
        assert_eq!(s.view().scale, 1.0);
        assert_eq!(s.view().offset_x, 0.0);
    }

    #[test]
    fn test_filter_and_undo() {
        let mut s = session();
        assert!(s.apply_filter(FilterType::Sepia));
        assert!(!s.apply_filter(FilterType::Sepia));
        assert_eq!(s.history().len(), 2);

        let restore = s.undo().unwrap();
        assert_eq!(restore.pixel_version, None);
        assert_eq!(restore.intent.filter, FilterType::None);
        assert_eq!(s.filter(), FilterType::None);

        let restore = s.redo().unwrap();
        assert_eq!(restore.intent.filter, FilterType::Sepia);
    }

    #[test]
    fn test_rotate_records_snapped() {
        let mut s = session();
        assert!(s.rotate(90.0));
        assert!(s.rotate(90.0));
        assert_eq!(s.view().rotation.degrees(), 180.0);
        assert!(!s.rotate(360.0));
        assert_eq!(s.history().len(), 3);
    }

    #[test]
    fn test_slider_run_is_one_entry() {
        let mut s = session();
        let t0 = Instant::now();
        for i in 0..10 {
            let t = t0 + Duration::from_millis(i * 30);
            assert!(s.set_adjustment(AdjustmentType::Brightness, i as f32 / 20.0, t));
        }
        assert!(s.has_pending_adjustments());
        assert!(s.can_undo());
        assert!(!s.tick(t0 + Duration::from_millis(400)));
        assert!(s.tick(t0 + Duration::from_millis(270 + 500)));
        assert_eq!(s.history().len(), 2);

        let restore = s.undo().unwrap();
        assert_eq!(restore.intent.adjustments.brightness, 0.0);
    }

    #[test]
    fn test_discrete_action_flushes_slider_run() {
        let mut s = session();
        s.set_adjustment(AdjustmentType::Contrast, 0.4, Instant::now());
        s.rotate(90.0);
        // Initial, slider run, rotation
        assert_eq!(s.history().len(), 3);
        s.undo();
        assert_eq!(s.view().rotation.degrees(), 0.0);
        assert_eq!(s.adjustments().contrast, 0.4);
    }

    #[test]
    fn test_undo_with_pending_commits_first() {
        let mut s = session();
        s.set_adjustment(AdjustmentType::Tint, -0.5, Instant::now());
        let restore = s.undo().unwrap();
        assert_eq!(restore.intent.adjustments.tint, 0.0);
        assert!(s.can_redo());
        assert_eq!(s.redo().unwrap().intent.adjustments.tint, -0.5);
    }

    #[test]
    fn test_leaving_adjustment_mode_flushes() {
        let mut s = session();
        s.set_mode(EditorMode::AdjustmentEditing);
        s.set_adjustment(AdjustmentType::Shadows, 0.3, Instant::now());
        s.set_mode(EditorMode::Normal);
        assert!(!s.has_pending_adjustments());
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn test_adjustments_gated_by_program() {
        let mut s = session();
        s.apply_filter(FilterType::Vivid);
        assert!(!s.set_adjustment(AdjustmentType::Brightness, 0.5, Instant::now()));
        s.apply_filter(FilterType::None);
        s.set_grayscale(true);
        assert!(!s.set_adjustment(AdjustmentType::Brightness, 0.5, Instant::now()));
        assert_eq!(s.adjustments().brightness, 0.0);
    }

    #[test]
    fn test_set_adjustment_clamps() {
        let mut s = session();
        s.set_adjustment(AdjustmentType::Sharpen, -1.0, Instant::now());
        assert_eq!(s.adjustments().sharpen, 0.0);
        assert!(!s.set_adjustment(AdjustmentType::Sharpen, f32::NAN, Instant::now()));
    }

    #[test]
    fn test_reset_adjustments() {
        let mut s = session();
        assert!(!s.reset_adjustments());
        s.set_adjustment(AdjustmentType::Clarity, 0.5, Instant::now());
        assert!(s.reset_adjustments());
        assert!(!s.adjustments().has_any_adjustment());
        // Initial, slider run, reset
        assert_eq!(s.history().len(), 3);
    }

    #[test]
    fn test_begin_crop_maps_display_to_source() {
        let mut s = session();
        // 400x200 image fills the 800x400 viewport exactly
        let request = s.begin_crop(&overlay(0.0, 0.0, 400.0, 200.0)).unwrap();
        assert_eq!(request.rect, SourceCropRect::new(0.0, 0.0, 0.5, 0.5));
        assert_eq!(request.base, PixelVersion::ROOT);
        assert!(s.pending_crop().is_some());
        // Nothing recorded until the render side reports back
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn test_begin_crop_rotated() {
        let mut s = session();
        s.rotate(90.0);
        // Rotated image is 200x400, letterboxed to 200x400 at x = 300
        let request = s.begin_crop(&overlay(300.0, 0.0, 400.0, 200.0)).unwrap();
        assert_eq!(request.rect, SourceCropRect::new(0.0, 0.5, 0.5, 1.0));
    }

    #[test]
    fn test_begin_crop_rejects_empty() {
        let mut s = session();
        let err = s.begin_crop(&overlay(100.0, 100.0, 100.0, 300.0)).unwrap_err();
        assert_eq!(err, CropError::Degenerate);
        assert!(s.pending_crop().is_none());

        s.set_viewport(0, 0);
        let err = s.begin_crop(&overlay(0.0, 0.0, 10.0, 10.0)).unwrap_err();
        assert_eq!(err, CropError::EmptyDisplay);
    }

    #[test]
    fn test_rejected_crop_keeps_view() {
        let mut s = session();
        s.zoom_about(2.0, 400.0, 200.0);
        s.pan_pixels(40.0, 0.0);
        let before = *s.view();
        assert_eq!(before.scale, 2.0);

        assert!(s.begin_crop(&overlay(10.0, 10.0, 10.0, 10.0)).is_err());
        assert_eq!(*s.view(), before);
        assert!(s.pending_crop().is_none());

        s.begin_crop(&overlay(0.0, 0.0, 400.0, 200.0)).unwrap();
        assert_eq!(s.view().scale, 1.0);
        assert_eq!(s.view().offset_x, 0.0);
    }

    #[test]
    fn test_complete_crop_then_undo_rolls_pixels_back() {
        let mut s = session();
        s.set_mode(EditorMode::CropEditing);
        s.begin_crop(&overlay(0.0, 0.0, 400.0, 200.0)).unwrap();
        let outcome = PixelState {
            version: PixelVersion(1),
            width: 200,
            height: 100,
            crop: Some(SourceCropRect::new(0.0, 0.0, 0.5, 0.5)),
        };
        s.complete_crop(outcome);

        assert_eq!(s.mode(), EditorMode::Normal);
        assert!(s.pending_crop().is_none());
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.history().current().unwrap().pixel_version, PixelVersion(1));

        let restore = s.undo().unwrap();
        assert_eq!(restore.pixel_version, Some(PixelVersion::ROOT));
        assert_eq!(s.pixels(), PixelState::root(400, 200));

        let restore = s.redo().unwrap();
        assert_eq!(restore.pixel_version, Some(PixelVersion(1)));
        assert_eq!(s.pixels().width, 200);
    }

    #[test]
    fn test_undo_clears_pending_crop() {
        let mut s = session();
        s.apply_filter(FilterType::Cool);
        s.begin_crop(&overlay(0.0, 0.0, 400.0, 200.0)).unwrap();
        s.undo();
        assert!(s.pending_crop().is_none());
    }

    #[test]
    fn test_draft_reflects_state() {
        let mut s = session();
        s.apply_filter(FilterType::Fade);
        s.rotate(-90.0);
        let draft = s.draft("file:///photo.jpg");
        assert_eq!(draft.filter_type, "FADE");
        assert_eq!(draft.rotation_angle, 270.0);
        assert_eq!(draft.crop_left, None);
        assert_eq!(draft.original_image_uri, "file:///photo.jpg");
    }

    #[test]
    fn test_from_draft_round_trip() {
        let mut s = session();
        s.apply_filter(FilterType::None);
        s.set_adjustment(AdjustmentType::Saturation, 0.25, Instant::now());
        s.set_grayscale(true);
        let draft = s.draft("photo.jpg");

        let resumed = EditSession::from_draft(&draft, s.pixels(), &EditorConfig::default());
        assert_eq!(resumed.intent(), s.intent());
        assert_eq!(resumed.history().len(), 1);
        assert_eq!(resumed.draft("photo.jpg").created_at, draft.created_at);
    }

    #[test]
    fn test_debouncer() {
        let mut d = AdjustmentDebouncer::new(Duration::from_millis(500));
        let t0 = Instant::now();
        assert!(!d.is_pending());
        assert!(d.record_change(t0));
        assert!(!d.record_change(t0 + Duration::from_millis(100)));
        assert!(!d.due(t0 + Duration::from_millis(599)));
        assert!(d.due(t0 + Duration::from_millis(600)));
        assert!(d.take());
        assert!(!d.take());
    }
}
