//! Off-screen color targets and their readback.
//!
//! Both the on-screen view and exports render into a texture that can be
//! copied out. wgpu texture rows start at the top, so readback only has to
//! strip the row padding the copy alignment adds.

use futures_intrusive::channel::shared::oneshot_channel;
use retouch_core::PixelBuffer;
use thiserror::Error;
use tracing::debug;

use crate::context::GpuContext;
use crate::programs::TARGET_FORMAT;
use crate::texture::extent;

/// Failures producing pixels from an off-screen target.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("render target would be empty ({width}x{height})")]
    EmptyTarget { width: u32, height: u32 },

    #[error("render target {width}x{height} exceeds the device limit of {max}")]
    TargetTooLarge { width: u32, height: u32, max: u32 },

    #[error("failed to read back rendered pixels: {0}")]
    Readback(String),

    #[error("render thread is not running")]
    Disconnected,
}

pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn new(ctx: &GpuContext, width: u32, height: u32) -> Result<Self, ExportError> {
        if width == 0 || height == 0 {
            return Err(ExportError::EmptyTarget { width, height });
        }
        let max = ctx.max_texture_dimension();
        if width > max || height > max {
            return Err(ExportError::TargetTooLarge { width, height, max });
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("retouch-target"),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            width,
            height,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copy the target back into CPU memory, top row first.
    pub fn read_back(&self, ctx: &GpuContext) -> Result<PixelBuffer, ExportError> {
        let padded = padded_bytes_per_row(self.width);
        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("retouch-readback"),
            size: padded as u64 * self.height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("retouch-readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            extent(self.width, self.height),
        );
        ctx.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = oneshot_channel::<Result<(), wgpu::BufferAsyncError>>();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        ctx.device.poll(wgpu::Maintain::Wait);

        match pollster::block_on(rx.receive()) {
            Some(Ok(())) => {}
            Some(Err(e)) => return Err(ExportError::Readback(e.to_string())),
            None => return Err(ExportError::Readback("map callback dropped".to_string())),
        }

        let pixels = {
            let data = slice.get_mapped_range();
            strip_padding(&data, self.width, self.height, padded)
        };
        staging.unmap();
        staging.destroy();

        debug!(width = self.width, height = self.height, "read back target");
        Ok(PixelBuffer::new(self.width, self.height, pixels))
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Row pitch of a texture-to-buffer copy.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drop the alignment padding from every row.
pub(crate) fn strip_padding(data: &[u8], width: u32, height: u32, padded: u32) -> Vec<u8> {
    let row = width as usize * 4;
    let mut out = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(padded as usize).take(height as usize) {
        out.extend_from_slice(&chunk[..row]);
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_padded_row_is_aligned_and_minimal(width in 1u32..8192) {
            let padded = padded_bytes_per_row(width);
            prop_assert_eq!(padded % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
            prop_assert!(padded >= width * 4);
            prop_assert!(padded - width * 4 < wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        }

        #[test]
        fn prop_strip_padding_recovers_rows(width in 1u32..80, height in 1u32..6) {
            let padded = padded_bytes_per_row(width);
            let data: Vec<u8> = (0..padded * height).map(|i| (i % 251) as u8).collect();
            let out = strip_padding(&data, width, height, padded);
            prop_assert_eq!(out.len(), (width * height * 4) as usize);
            for y in 0..height as usize {
                let row = width as usize * 4;
                let start = y * padded as usize;
                prop_assert_eq!(&out[y * row..(y + 1) * row], &data[start..start + row]);
            }
        }
    }
}
