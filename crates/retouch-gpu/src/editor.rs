//! Coordination-side façade tying an [`EditSession`] to a render thread.
//!
//! Every mutator updates the session first and then asks the render thread
//! for a frame with the new intent. Crops and history restores wait for the
//! render thread to report the resulting pixels before anything is recorded.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Instant;

use retouch_core::encode::write_export;
use retouch_core::{
    decode_image, AdjustmentType, ConfigError, CropError, CropRequest, DecodeError, Draft,
    DraftError, EditSession, EditorConfig, EditorMode, EncodeError, ExportFormat, FilterType,
    PixelBuffer, PixelState, PixelVersion, RenderIntent, ScreenRect,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::context::GpuError;
use crate::renderer::RendererOptions;
use crate::target::ExportError;
use crate::thread::{Deferred, RenderHandle, RenderThread};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One open image.
#[derive(Debug)]
pub struct Editor {
    session: EditSession,
    render: RenderThread,
    config: EditorConfig,
}

impl Editor {
    /// Decode `bytes` and open an editing session, resuming `draft` if given.
    pub fn open(
        bytes: &[u8],
        draft: Option<&Draft>,
        config: EditorConfig,
        viewport: (u32, u32),
    ) -> Result<Self, EditorError> {
        let root = decode_image(bytes)?;
        Self::open_buffer(root, draft, config, viewport)
    }

    /// Open an editing session on already decoded pixels.
    pub fn open_buffer(
        root: PixelBuffer,
        draft: Option<&Draft>,
        config: EditorConfig,
        viewport: (u32, u32),
    ) -> Result<Self, EditorError> {
        let config = config.validated()?;
        let options = RendererOptions::from_config(&config, viewport);
        let (render, mut pixels) = RenderThread::spawn(root, options)?;

        let mut session = match draft {
            Some(draft) => {
                if let Some(rect) = draft.crop() {
                    let request = CropRequest {
                        rect,
                        base: PixelVersion::ROOT,
                    };
                    match render.handle().apply_crop(request).wait_gpu() {
                        Ok(state) => pixels = state,
                        Err(e) => warn!(error = %e, "draft crop could not be applied"),
                    }
                }
                EditSession::from_draft(draft, pixels, &config)
            }
            None => EditSession::new(pixels, &config),
        };
        session.set_viewport(viewport.0, viewport.1);

        let editor = Self {
            session,
            render,
            config,
        };
        info!(
            width = pixels.width,
            height = pixels.height,
            resumed = draft.is_some(),
            "editor opened"
        );
        editor.request_frame();
        Ok(editor)
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn intent(&self) -> RenderIntent {
        self.session.intent()
    }

    pub fn pixels(&self) -> PixelState {
        self.session.pixels()
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.session.set_mode(mode);
        self.request_frame();
    }

    pub fn set_filter(&mut self, filter: FilterType) -> bool {
        let changed = self.session.apply_filter(filter);
        self.redraw_if(changed)
    }

    pub fn set_grayscale(&mut self, enabled: bool) -> bool {
        let changed = self.session.set_grayscale(enabled);
        self.redraw_if(changed)
    }

    pub fn rotate(&mut self, delta: f32) -> bool {
        let changed = self.session.rotate(delta);
        self.redraw_if(changed)
    }

    pub fn set_adjustment(&mut self, kind: AdjustmentType, value: f32) -> bool {
        let changed = self.session.set_adjustment(kind, value, Instant::now());
        self.redraw_if(changed)
    }

    pub fn reset_adjustments(&mut self) -> bool {
        let changed = self.session.reset_adjustments();
        self.redraw_if(changed)
    }

    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        let changed = self.session.pan_pixels(dx, dy);
        self.redraw_if(changed)
    }

    pub fn zoom(&mut self, factor: f32, focus_x: f32, focus_y: f32) -> bool {
        let changed = self.session.zoom_about(factor, focus_x, focus_y);
        self.redraw_if(changed)
    }

    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        self.session.set_viewport(width, height);
        self.render.handle().resize(width, height);
        self.request_frame();
    }

    /// Commit a slider run whose debounce window has elapsed.
    pub fn tick(&mut self) -> bool {
        self.session.tick(Instant::now())
    }

    /// Crop to an on-screen overlay and wait for the render thread to bake it.
    ///
    /// The post-crop history entry is recorded only after the new pixels
    /// exist. On failure nothing is recorded and the pixels are unchanged.
    pub fn apply_crop(&mut self, overlay: &ScreenRect) -> Result<PixelState, EditorError> {
        let request = self.session.begin_crop(overlay)?;
        match self.render.handle().apply_crop(request).wait_gpu() {
            Ok(state) => {
                self.session.complete_crop(state);
                self.request_frame();
                Ok(state)
            }
            Err(e) => {
                warn!(error = %e, "crop failed on render thread");
                self.session.cancel_crop();
                Err(e.into())
            }
        }
    }

    /// Step back one history entry. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        match self.session.undo() {
            Some(restore) => {
                self.restore_pixels(restore.pixel_version)?;
                self.request_frame();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Step forward one history entry. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        match self.session.redo() {
            Some(restore) => {
                self.restore_pixels(restore.pixel_version)?;
                self.request_frame();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    /// Export at native resolution, blocking until the pixels are read back.
    pub fn export(&self) -> Result<PixelBuffer, EditorError> {
        Ok(self.export_deferred().wait_export()?)
    }

    /// Request an export now and collect the pixels later.
    pub fn export_deferred(&self) -> Deferred<Result<PixelBuffer, ExportError>> {
        self.render.handle().export(self.session.intent())
    }

    /// Export and encode to `path` on a background thread.
    pub fn save_export(
        &self,
        path: PathBuf,
        format: ExportFormat,
    ) -> JoinHandle<Result<PathBuf, EditorError>> {
        let pending = self.export_deferred();
        let quality = self.config.jpeg_quality;
        std::thread::spawn(move || {
            let pixels = pending.wait_export()?;
            write_export(&pixels, &path, format, quality)?;
            Ok(path)
        })
    }

    /// Capture the on-screen view once the current state has been drawn.
    pub fn snapshot(&self) -> Deferred<Result<PixelBuffer, ExportError>> {
        self.request_frame();
        self.render.handle().snapshot()
    }

    pub fn draft(&self, original_image_uri: &str) -> Draft {
        self.session.draft(original_image_uri)
    }

    /// Write the current draft on a background thread.
    pub fn save_draft(&self, original_image_uri: &str, path: &Path) -> JoinHandle<Result<(), EditorError>> {
        let draft = self.draft(original_image_uri);
        let path = path.to_path_buf();
        std::thread::spawn(move || Ok(draft.save(&path)?))
    }

    /// Commit pending edits and release every GPU resource.
    pub fn close(mut self) {
        self.session.flush();
        self.render.shutdown();
        info!(history = self.session.history().len(), "editor closed");
    }

    pub fn handle(&self) -> &RenderHandle {
        self.render.handle()
    }

    fn restore_pixels(&mut self, version: Option<PixelVersion>) -> Result<(), EditorError> {
        let Some(version) = version else {
            return Ok(());
        };
        let actual = self.render.handle().restore(version).wait_gpu()?;
        if actual.version != version {
            warn!(
                requested = %version,
                actual = %actual.version,
                "pixel version unavailable, keeping current pixels"
            );
        }
        if actual != self.session.pixels() {
            self.session.sync_pixels(actual);
        }
        Ok(())
    }

    fn request_frame(&self) {
        self.render.handle().request_frame(self.session.intent());
    }

    fn redraw_if(&self, changed: bool) -> bool {
        if changed {
            self.request_frame();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retouch_core::render_reference;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 7) as u8, (y * 11) as u8, 128, 255]);
            }
        }
        PixelBuffer::new(width, height, pixels)
    }

    fn open(root: PixelBuffer, draft: Option<&Draft>) -> Option<Editor> {
        match Editor::open_buffer(root, draft, EditorConfig::default(), (400, 200)) {
            Ok(editor) => Some(editor),
            Err(EditorError::Gpu(e)) => {
                eprintln!("GPU not available ({e}), skipping GPU test");
                None
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
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
    fn test_decode_failure_surfaces() {
        let err = Editor::open(b"not an image", None, EditorConfig::default(), (10, 10))
            .unwrap_err();
        assert!(matches!(err, EditorError::Decode(_)));
    }

    #[test]
    fn test_invalid_config_rejected_before_gpu() {
        let config = EditorConfig {
            jpeg_quality: 0,
            ..Default::default()
        };
        let err = Editor::open_buffer(gradient(4, 4), None, config, (10, 10)).unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }

    #[test]
    fn test_crop_waits_for_render_thread() {
        let Some(mut editor) = open(gradient(20, 10), None) else {
            return;
        };
        // 20x10 image fills the 400x200 viewport; crop the left half
        let state = editor.apply_crop(&overlay(0.0, 0.0, 200.0, 200.0)).unwrap();
        assert_eq!((state.width, state.height), (10, 10));
        assert_eq!(editor.session().history().len(), 2);
        assert_eq!(
            editor.session().history().current().unwrap().pixel_version,
            state.version
        );

        let exported = editor.export().unwrap();
        assert_eq!((exported.width, exported.height), (10, 10));

        assert!(editor.undo().unwrap());
        assert_eq!(editor.pixels(), PixelState::root(20, 10));
        assert_eq!(editor.export().unwrap().width, 20);

        assert!(editor.redo().unwrap());
        assert_eq!(editor.pixels(), state);
        editor.close();
    }

    #[test]
    fn test_degenerate_crop_records_nothing() {
        let Some(mut editor) = open(gradient(20, 10), None) else {
            return;
        };
        let err = editor.apply_crop(&overlay(50.0, 0.0, 50.0, 100.0)).unwrap_err();
        assert!(matches!(err, EditorError::Crop(CropError::Degenerate)));
        assert_eq!(editor.session().history().len(), 1);
        assert_eq!(editor.pixels(), PixelState::root(20, 10));
    }

    #[test]
    fn test_export_matches_reference_after_edits() {
        let source = gradient(12, 9);
        let Some(mut editor) = open(source.clone(), None) else {
            return;
        };
        editor.set_adjustment(AdjustmentType::Contrast, 0.4);
        editor.rotate(90.0);
        editor.zoom(2.0, 100.0, 50.0);
        let exported = editor.export().unwrap();
        let expected = render_reference(&source, &editor.intent());
        assert_eq!((exported.width, exported.height), (9, 12));
        for (a, b) in exported.pixels.iter().zip(&expected.pixels) {
            assert!(a.abs_diff(*b) <= 2);
        }
    }

    #[test]
    fn test_resume_draft_with_crop() {
        let mut draft = Draft::new("photo.png");
        draft.filter_type = "SEPIA".to_string();
        draft.rotation_angle = 180.0;
        draft.set_crop(Some(retouch_core::SourceCropRect::new(0.0, 0.0, 0.5, 1.0)));

        let Some(editor) = open(gradient(20, 10), Some(&draft)) else {
            return;
        };
        assert_eq!(editor.pixels().width, 10);
        assert_eq!(editor.intent().filter, FilterType::Sepia);
        assert_eq!(editor.session().history().len(), 1);

        let resumed = editor.draft("photo.png");
        assert_eq!(resumed.crop(), draft.crop());
        assert_eq!(resumed.rotation_angle, 180.0);
    }

    #[test]
    fn test_snapshot_delivered_after_frame() {
        let Some(mut editor) = open(gradient(8, 8), None) else {
            return;
        };
        editor.set_filter(FilterType::Invert);
        let snap = editor.snapshot().wait_export().unwrap();
        assert_eq!((snap.width, snap.height), (400, 200));
    }

    #[test]
    fn test_save_export_in_background() {
        let Some(editor) = open(gradient(6, 6), None) else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let written = editor
            .save_export(path.clone(), ExportFormat::Png)
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(written, path);
        assert!(path.exists());
    }
}
