//! One compiled render pipeline per filter.
//!
//! Every program shares the vertex stage and a single bind group layout:
//!
//! | binding | resource                       | stage    |
//! |---------|--------------------------------|----------|
//! | 0       | sampler                        | fragment |
//! | 1       | source `texture_2d<f32>`       | fragment |
//! | 2       | `ViewUniform` (4x4 transform)  | vertex   |
//! | 3       | `Adjustments` (identity only)  | fragment |
//!
//! A program that fails to compile is logged and replaced by the identity
//! program, so selecting it draws the unfiltered image instead of garbage.

use std::sync::Arc;

use retouch_core::filter::{FRAGMENT_ENTRY, VERTEX_ENTRY};
use retouch_core::FilterType;
use tracing::{debug, error};

use crate::context::{GpuContext, GpuError};
use crate::renderer::{AdjustmentUniform, GpuVertex, ViewUniform};

/// Color format of every render target.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

pub struct ProgramCache {
    layout: wgpu::BindGroupLayout,
    /// Indexed by `FilterType::ordinal`.
    pipelines: Vec<Arc<wgpu::RenderPipeline>>,
    fallbacks: Vec<FilterType>,
}

impl ProgramCache {
    /// Compile every program in the catalog.
    ///
    /// Fails only if the identity program itself does not compile.
    pub fn build(ctx: &GpuContext) -> Result<Self, GpuError> {
        Self::build_with(ctx, FilterType::program_source)
    }

    /// Compile one program per filter from the WGSL `source_for` returns.
    pub(crate) fn build_with<F>(ctx: &GpuContext, source_for: F) -> Result<Self, GpuError>
    where
        F: Fn(FilterType) -> String,
    {
        let layout = create_bind_group_layout(&ctx.device);
        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("retouch-pipeline-layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

        let identity = compile(
            &ctx.device,
            &pipeline_layout,
            FilterType::None,
            &source_for(FilterType::None),
        )
            .map(Arc::new)
            .map_err(|message| {
                error!(%message, "identity program failed to compile");
                GpuError::ProgramCompilation {
                    filter: FilterType::None,
                    message,
                }
            })?;

        let mut pipelines = Vec::with_capacity(FilterType::ALL.len());
        let mut fallbacks = Vec::new();
        for filter in FilterType::ALL {
            if filter == FilterType::None {
                pipelines.push(Arc::clone(&identity));
                continue;
            }
            match compile(&ctx.device, &pipeline_layout, filter, &source_for(filter)) {
                Ok(pipeline) => pipelines.push(Arc::new(pipeline)),
                Err(message) => {
                    error!(%filter, %message, "program failed to compile, using identity");
                    fallbacks.push(filter);
                    pipelines.push(Arc::clone(&identity));
                }
            }
        }

        debug!(
            programs = pipelines.len(),
            fallbacks = fallbacks.len(),
            "program cache built"
        );
        Ok(Self {
            layout,
            pipelines,
            fallbacks,
        })
    }

    /// Pipeline for `filter`, the identity pipeline if it fell back.
    pub fn get(&self, filter: FilterType) -> &wgpu::RenderPipeline {
        &self.pipelines[filter.ordinal()]
    }

    /// Filters currently drawn with the identity program.
    pub fn fallbacks(&self) -> &[FilterType] {
        &self.fallbacks
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }
}

fn compile(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    filter: FilterType,
    source: &str,
) -> Result<wgpu::RenderPipeline, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(filter.name()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(filter.name()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: VERTEX_ENTRY,
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: FRAGMENT_ENTRY,
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err.to_string()),
        None => Ok(pipeline),
    }
}

fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("retouch-bind-layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ViewUniform>() as u64
                    ),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<AdjustmentUniform>() as u64
                    ),
                },
                count: None,
            },
        ],
    })
}
