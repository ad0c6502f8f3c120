//! Retouch Core - edit model for the Retouch photo editor
//!
//! This crate holds everything that does not touch the GPU: the adjustment
//! sliders, the filter catalog and its WGSL programs, edit and pixel history,
//! view and crop geometry, the coordination-side edit session, drafts,
//! decode/encode, and a CPU renderer that mirrors the GPU programs.

pub mod adjustments;
pub mod config;
pub mod decode;
pub mod draft;
pub mod encode;
pub mod filter;
pub mod history;
pub mod intent;
pub mod pixels;
pub mod reference;
pub mod session;
pub mod transform;

pub use adjustments::{AdjustmentParams, AdjustmentType};
pub use config::{ConfigError, EditorConfig};
pub use decode::{decode_file, decode_image, DecodeError};
pub use draft::{Draft, DraftError};
pub use encode::{encode, EncodeError, ExportFormat};
pub use filter::FilterType;
pub use history::{EditHistory, EditState};
pub use intent::RenderIntent;
pub use pixels::{BitmapEntry, BitmapHistory, PixelBuffer, PixelVersion};
pub use reference::render_reference;
pub use session::{
    AdjustmentDebouncer, CropRequest, EditSession, EditorMode, PixelState, Restore,
};
pub use transform::{
    CropError, DisplayCropRect, DisplayRect, PixelRegion, Rotation, ScreenRect, SourceCropRect,
    ViewTransform,
};
