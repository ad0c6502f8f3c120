//! GPU copies of pixel buffers.

use retouch_core::PixelBuffer;
use tracing::debug;

use crate::context::{GpuContext, GpuError};
use crate::programs::TARGET_FORMAT;

/// The texture holding the current pixel version.
pub struct SourceTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl SourceTexture {
    pub fn upload(ctx: &GpuContext, buffer: &PixelBuffer) -> Result<Self, GpuError> {
        ctx.check_dimensions(buffer.width, buffer.height)?;
        let texture = create_source(ctx, buffer.width, buffer.height);
        write(ctx, &texture, buffer);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            width: buffer.width,
            height: buffer.height,
        })
    }

    /// Swap in new pixels, reallocating only when the size changes.
    ///
    /// On error the previous contents are left untouched.
    pub fn replace(&mut self, ctx: &GpuContext, buffer: &PixelBuffer) -> Result<(), GpuError> {
        if (buffer.width, buffer.height) == (self.width, self.height) {
            write(ctx, &self.texture, buffer);
            return Ok(());
        }

        let next = Self::upload(ctx, buffer)?;
        debug!(
            from = ?(self.width, self.height),
            to = ?(next.width, next.height),
            "reallocated source texture"
        );
        let previous = std::mem::replace(self, next);
        previous.destroy();
        Ok(())
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// One texel in normalized texture coordinates.
    pub fn texel_size(&self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

fn create_source(ctx: &GpuContext, width: u32, height: u32) -> wgpu::Texture {
    ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("retouch-source"),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write(ctx: &GpuContext, texture: &wgpu::Texture, buffer: &PixelBuffer) {
    ctx.queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &buffer.pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * buffer.width),
            rows_per_image: Some(buffer.height),
        },
        extent(buffer.width, buffer.height),
    );
}

pub(crate) fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}
