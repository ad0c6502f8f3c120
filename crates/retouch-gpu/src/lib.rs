//! Retouch GPU - wgpu render pipeline for the Retouch photo editor
//!
//! The render side of an edit session: a headless device, one compiled
//! program per filter, the source texture, off-screen view and export
//! targets, and the dedicated render thread. [`Editor`] is the entry point
//! for the coordination thread.

mod context;
mod editor;
mod programs;
mod renderer;
mod target;
mod texture;
mod thread;

pub use context::{GpuContext, GpuError};
pub use editor::{Editor, EditorError};
pub use programs::{ProgramCache, TARGET_FORMAT};
pub use renderer::{Renderer, RendererOptions};
pub use target::{ExportError, OffscreenTarget};
pub use texture::SourceTexture;
pub use thread::{Deferred, RenderHandle, RenderThread};
