//! Headless wgpu device management.

use retouch_core::{CropError, FilterType, PixelVersion};
use thiserror::Error;
use tracing::{error, info};

/// Render-side failures.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to request GPU device: {0}")]
    DeviceRequest(String),

    #[error("program for {filter} failed to compile: {message}")]
    ProgramCompilation { filter: FilterType, message: String },

    #[error("{width}x{height} exceeds the device texture limit of {max}")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[error("invalid crop: {0}")]
    InvalidCrop(#[from] CropError),

    #[error("crop targets {requested} but the current pixels are {current}")]
    StaleCrop {
        requested: PixelVersion,
        current: PixelVersion,
    },

    #[error("render thread is not running")]
    Disconnected,
}

/// Device, queue and the limits the renderer needs to respect.
pub struct GpuContext {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
    max_texture_dimension: u32,
}

impl GpuContext {
    /// Acquire an adapter and device without a presentation surface.
    pub fn headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("retouch-device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
            },
            None,
        ))
        .map_err(|e| GpuError::DeviceRequest(e.to_string()))?;

        // Errors outside an explicit scope are logged instead of aborting.
        device.on_uncaptured_error(Box::new(|err| {
            error!(error = %err, "uncaptured GPU error");
        }));

        let max_texture_dimension = device.limits().max_texture_dimension_2d;
        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            max_texture_dimension,
            "GPU device ready"
        );

        Ok(Self {
            device,
            queue,
            adapter_info,
            max_texture_dimension,
        })
    }

    /// Check if an adapter can be found without creating a device.
    pub fn is_available() -> bool {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .is_some()
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_info.name
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    /// Reject textures the device cannot hold.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), GpuError> {
        let max = self.max_texture_dimension;
        if width > max || height > max {
            return Err(GpuError::TextureTooLarge { width, height, max });
        }
        Ok(())
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter_info.name)
            .field("max_texture_dimension", &self.max_texture_dimension)
            .finish()
    }
}
