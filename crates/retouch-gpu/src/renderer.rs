//! The render side of an edit session.
//!
//! [`Renderer`] owns every GPU resource and the versioned pixel store, and
//! must only be driven from the render thread. It draws the on-screen view
//! into an off-screen view target, bakes crops, rolls pixel versions back and
//! forth, and renders exports at native resolution.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use retouch_core::transform::{self, full_quad, quad_vertices, QuadVertex, ZoomLimits};
use retouch_core::{
    AdjustmentParams, BitmapHistory, CropRequest, DisplayRect, EditorConfig, FilterType,
    PixelBuffer, PixelState, PixelVersion, RenderIntent, SourceCropRect, ViewTransform,
};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

use crate::context::{GpuContext, GpuError};
use crate::programs::ProgramCache;
use crate::target::{ExportError, OffscreenTarget};
use crate::texture::SourceTexture;

// Uniform and vertex layouts. These must match the WGSL declarations exactly.

/// `ViewUniform` in the shared vertex stage.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct ViewUniform {
    pub transform: [[f32; 4]; 4],
}

impl ViewUniform {
    pub fn from_view(view: &ViewTransform) -> Self {
        Self {
            transform: view.matrix(),
        }
    }

    pub fn identity() -> Self {
        Self::from_view(&ViewTransform::default())
    }
}

/// `Adjustments` in the identity program.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct AdjustmentUniform {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub temperature: f32,
    pub tint: f32,
    pub clarity: f32,
    pub sharpen: f32,
    pub _padding: f32,
    pub texel_size: [f32; 2],
}

impl AdjustmentUniform {
    pub fn new(params: &AdjustmentParams, texel_size: [f32; 2]) -> Self {
        Self {
            brightness: params.brightness,
            contrast: params.contrast,
            saturation: params.saturation,
            highlights: params.highlights,
            shadows: params.shadows,
            temperature: params.temperature,
            tint: params.tint,
            clarity: params.clarity,
            sharpen: params.sharpen,
            _padding: 0.0,
            texel_size,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct GpuVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

impl From<QuadVertex> for GpuVertex {
    fn from(v: QuadVertex) -> Self {
        Self {
            position: v.position,
            tex_coord: v.tex_coord,
        }
    }
}

/// Settings the renderer needs from the editor configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererOptions {
    pub bitmap_capacity: usize,
    pub zoom_limits: ZoomLimits,
    pub viewport: (u32, u32),
}

impl RendererOptions {
    pub fn from_config(config: &EditorConfig, viewport: (u32, u32)) -> Self {
        Self {
            bitmap_capacity: config.bitmap_history_capacity,
            zoom_limits: config.zoom_limits(),
            viewport,
        }
    }
}

struct FrameBindings<'a> {
    view: &'a wgpu::Buffer,
    adjustments: &'a wgpu::Buffer,
    vertices: &'a wgpu::Buffer,
}

pub struct Renderer {
    ctx: GpuContext,
    programs: ProgramCache,
    source: SourceTexture,
    bitmaps: BitmapHistory,
    view_target: Option<OffscreenTarget>,
    view_sampler: wgpu::Sampler,
    export_sampler: wgpu::Sampler,
    view_buffer: wgpu::Buffer,
    adjust_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    zoom_limits: ZoomLimits,
    released: bool,
}

impl Renderer {
    /// Compile programs and upload the decoded original.
    pub fn new(ctx: GpuContext, root: PixelBuffer, options: RendererOptions) -> Result<Self, GpuError> {
        let programs = ProgramCache::build(&ctx)?;
        let source = SourceTexture::upload(&ctx, &root)?;
        let bitmaps = BitmapHistory::new(root, options.bitmap_capacity);

        // View target: smooth when zoomed
        let view_sampler = create_sampler(&ctx, "retouch-view-sampler", wgpu::FilterMode::Linear);
        // Export target: one texel per fragment, exact values
        let export_sampler =
            create_sampler(&ctx, "retouch-export-sampler", wgpu::FilterMode::Nearest);

        let view_buffer = create_uniform(&ctx, "retouch-view-uniform", &ViewUniform::identity());
        let adjust_buffer = create_uniform(
            &ctx,
            "retouch-adjust-uniform",
            &AdjustmentUniform::new(&AdjustmentParams::default(), source.texel_size()),
        );
        let vertex_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("retouch-quad"),
            size: std::mem::size_of::<[GpuVertex; 4]>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut renderer = Self {
            ctx,
            programs,
            source,
            bitmaps,
            view_target: None,
            view_sampler,
            export_sampler,
            view_buffer,
            adjust_buffer,
            vertex_buffer,
            zoom_limits: options.zoom_limits,
            released: false,
        };
        renderer.resize(options.viewport.0, options.viewport.1);

        let (width, height) = renderer.source.size();
        info!(width, height, adapter = renderer.ctx.adapter_name(), "renderer ready");
        Ok(renderer)
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn programs(&self) -> &ProgramCache {
        &self.programs
    }

    /// Pixel bookkeeping for the coordination side.
    pub fn pixel_state(&self) -> PixelState {
        let entry = self.bitmaps.current_entry();
        let root = &self.bitmaps.root().buffer;
        let crop = (entry.version != PixelVersion::ROOT)
            .then(|| SourceCropRect::from_region(entry.origin, root.width, root.height));
        PixelState {
            version: entry.version,
            width: entry.buffer.width,
            height: entry.buffer.height,
            crop,
        }
    }

    /// The pixels currently on the source texture.
    pub fn current_pixels(&self) -> Arc<PixelBuffer> {
        Arc::clone(&self.bitmaps.current_entry().buffer)
    }

    /// Draw `intent` into the view target.
    pub fn render_frame(&mut self, intent: &RenderIntent) {
        let Some(target) = &self.view_target else {
            debug!("no view target, skipping frame");
            return;
        };
        let intent = RenderIntent {
            view: intent.view.sanitized(self.zoom_limits),
            ..*intent
        };

        let (vw, vh) = target.size();
        let (sw, sh) = self.source.size();
        let rotation = intent.view.rotation;
        let rect = DisplayRect::fit(vw, vh, sw, sh, rotation);
        let quad = quad_vertices(&rect, vw, vh, rotation).map(GpuVertex::from);

        let queue = &self.ctx.queue;
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&quad));
        queue.write_buffer(
            &self.view_buffer,
            0,
            bytemuck::bytes_of(&ViewUniform::from_view(&intent.view)),
        );
        queue.write_buffer(
            &self.adjust_buffer,
            0,
            bytemuck::bytes_of(&AdjustmentUniform::new(
                &intent.effective_adjustments(),
                self.source.texel_size(),
            )),
        );

        self.draw(
            target.view(),
            intent.program(),
            &self.view_sampler,
            FrameBindings {
                view: &self.view_buffer,
                adjustments: &self.adjust_buffer,
                vertices: &self.vertex_buffer,
            },
        );
    }

    /// Bake a crop of the current pixels into a new version.
    ///
    /// The request is re-validated here. On error the current version and
    /// texture stay as they were.
    pub fn apply_crop(&mut self, request: &CropRequest) -> Result<PixelState, GpuError> {
        let current = self.bitmaps.current();
        if request.base != current {
            warn!(requested = %request.base, %current, "stale crop request");
            return Err(GpuError::StaleCrop {
                requested: request.base,
                current,
            });
        }

        let base = self.current_pixels();
        let (cropped, region) = transform::apply_crop(&base, &request.rect).inspect_err(|e| {
            warn!(error = %e, rect = ?request.rect, "crop rejected on render thread");
        })?;
        self.source.replace(&self.ctx, &cropped)?;
        let version = self.bitmaps.push(cropped, region);

        info!(
            %version,
            x = region.x,
            y = region.y,
            width = region.width,
            height = region.height,
            "baked crop"
        );
        Ok(self.pixel_state())
    }

    /// Roll the source pixels to `version`.
    ///
    /// An evicted version leaves the current pixels in place; the returned
    /// state tells the caller what is actually live.
    pub fn restore(&mut self, version: PixelVersion) -> Result<PixelState, GpuError> {
        if version == self.bitmaps.current() {
            return Ok(self.pixel_state());
        }
        let Some(entry) = self.bitmaps.get(version) else {
            warn!(%version, current = %self.bitmaps.current(), "pixel version no longer stored");
            return Ok(self.pixel_state());
        };

        let buffer = Arc::clone(&entry.buffer);
        self.source.replace(&self.ctx, &buffer)?;
        self.bitmaps.restore(version);
        debug!(%version, "restored pixel version");
        Ok(self.pixel_state())
    }

    /// Render `intent` at native resolution with quarter-turn rotation and
    /// no pan or zoom, then read it back.
    pub fn export(&self, intent: &RenderIntent) -> Result<PixelBuffer, ExportError> {
        let intent = intent.for_export();
        let rotation = intent.view.rotation;
        let (sw, sh) = self.source.size();
        let (width, height) = rotation.oriented_dimensions(sw, sh);
        let target = OffscreenTarget::new(&self.ctx, width, height)?;

        let quad = full_quad(rotation).map(GpuVertex::from);
        let vertices = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("retouch-export-quad"),
                contents: bytemuck::cast_slice(&quad),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let view = create_uniform(&self.ctx, "retouch-export-view", &ViewUniform::identity());
        let adjustments = create_uniform(
            &self.ctx,
            "retouch-export-adjust",
            &AdjustmentUniform::new(&intent.effective_adjustments(), self.source.texel_size()),
        );

        self.draw(
            target.view(),
            intent.program(),
            &self.export_sampler,
            FrameBindings {
                view: &view,
                adjustments: &adjustments,
                vertices: &vertices,
            },
        );
        let result = target.read_back(&self.ctx);

        target.destroy();
        vertices.destroy();
        view.destroy();
        adjustments.destroy();

        if result.is_ok() {
            info!(width, height, program = %intent.program(), "exported");
        }
        result
    }

    /// Read back the last drawn view.
    pub fn snapshot(&self) -> Result<PixelBuffer, ExportError> {
        match &self.view_target {
            Some(target) => target.read_back(&self.ctx),
            None => Err(ExportError::EmptyTarget {
                width: 0,
                height: 0,
            }),
        }
    }

    /// Reallocate the view target for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(old) = self.view_target.take() {
            if old.size() == (width, height) {
                self.view_target = Some(old);
                return;
            }
            old.destroy();
        }
        match OffscreenTarget::new(&self.ctx, width, height) {
            Ok(target) => self.view_target = Some(target),
            Err(e) => debug!(error = %e, "view target unavailable"),
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.view_target
            .as_ref()
            .map(OffscreenTarget::size)
            .unwrap_or((0, 0))
    }

    /// Free every texture and buffer. Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.source.destroy();
        if let Some(target) = self.view_target.take() {
            target.destroy();
        }
        self.view_buffer.destroy();
        self.adjust_buffer.destroy();
        self.vertex_buffer.destroy();
        self.released = true;
        info!(pixel_versions = self.bitmaps.len(), "released GPU resources");
    }

    fn draw(
        &self,
        target: &wgpu::TextureView,
        program: FilterType,
        sampler: &wgpu::Sampler,
        bindings: FrameBindings<'_>,
    ) {
        let device = &self.ctx.device;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("retouch-bind-group"),
            layout: self.programs.layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.source.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: bindings.view.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: bindings.adjustments.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("retouch-draw"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("retouch-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(self.programs.get(program));
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, bindings.vertices.slice(..));
            pass.draw(0..4, 0..1);
        }
        self.ctx.queue.submit(Some(encoder.finish()));
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.release();
    }
}

fn create_sampler(ctx: &GpuContext, label: &str, filter: wgpu::FilterMode) -> wgpu::Sampler {
    ctx.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn create_uniform<T: Pod>(ctx: &GpuContext, label: &str, value: &T) -> wgpu::Buffer {
    ctx.device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(value),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
}
