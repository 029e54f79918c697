//! Pieces shared by the full-screen passes: the per-pass parameter block, the
//! two bind group layouts that read a render target, and the draw helper.

use crate::{
    data_structures::{
        model::QuadVertex,
        uniform::{UniformWriter, align_to, mk_uniform_buffer},
    },
    pipelines::{
        PipelineCache, PipelineDesc,
        program::{ProgramId, ProgramRegistry},
    },
};

/// Parameters of one full-screen pass. Mirrors `PostParams` in the prelude.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PostParams {
    pub direction: [f32; 2],
    pub texel_size: [f32; 2],
    pub threshold: f32,
    pub kernel_radius: f32,
    pub level_count: u32,
    pub view_mode: u32,
    pub lod_intensity: [[f32; 4]; 2],
}

impl PostParams {
    pub const SIZE: u32 = std::mem::size_of::<PostParams>() as u32;

    pub fn with_intensities(mut self, intensities: &[f32]) -> Self {
        for (level, value) in intensities.iter().take(8).enumerate() {
            self.lod_intensity[level / 4][level % 4] = *value;
        }
        self
    }
}

impl Default for PostParams {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

/// Upper bound of full-screen passes per frame.
pub const MAX_POST_SLOTS: u32 = 32;

/// One aligned slot per full-screen pass, written once per frame so passes in
/// the same submission never overwrite each other's parameters.
#[derive(Debug)]
pub struct PostParamsBuffer {
    pub buffer: wgpu::Buffer,
    writer: UniformWriter,
    alignment: u32,
}

impl PostParamsBuffer {
    pub fn new(device: &wgpu::Device, alignment: u32) -> Self {
        let capacity = align_to(PostParams::SIZE, alignment) * MAX_POST_SLOTS;
        Self {
            buffer: mk_uniform_buffer(device, capacity, "Post Params Buffer"),
            writer: UniformWriter::new(capacity),
            alignment,
        }
    }

    /// Upload `params` and return each entry's dynamic offset. Entries past
    /// the buffer's capacity get no offset and their passes are skipped.
    pub fn write(&mut self, queue: &wgpu::Queue, params: &[PostParams]) -> Vec<Option<u32>> {
        self.writer.reset();
        let offsets = params
            .iter()
            .map(|p| self.writer.push_pod(p, self.alignment))
            .collect();
        self.writer.flush(queue, &self.buffer);
        offsets
    }

    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(PostParams::SIZE as u64),
        })
    }
}

fn params_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: wgpu::BufferSize::new(PostParams::SIZE as u64),
        },
        count: None,
    }
}

/// A render target read with `textureLoad` plus the pass parameters.
pub fn mk_post_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            },
            params_entry(1),
        ],
        label: Some("post_bind_group_layout"),
    })
}

/// A filtered, mipmapped render target plus the pass parameters.
pub fn mk_composite_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            params_entry(2),
        ],
        label: Some("composite_bind_group_layout"),
    })
}

pub fn mk_post_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    params: &PostParamsBuffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: params.binding(),
            },
        ],
        label: Some(label),
    })
}

pub fn mk_composite_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    params: &PostParamsBuffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params.binding(),
            },
        ],
        label: Some("Bloom composite bind group"),
    })
}

/// Draw the screen quad into `target`. Bind group `i` is set at index `i`
/// with its dynamic offset, if it has one.
pub fn draw_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    pipeline: &wgpu::RenderPipeline,
    bind_groups: &[(&wgpu::BindGroup, Option<u32>)],
    quad: &wgpu::Buffer,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });
    render_pass.set_pipeline(pipeline);
    for (index, (bind_group, offset)) in bind_groups.iter().enumerate() {
        render_pass.set_bind_group(index as u32, *bind_group, offset.as_slice());
    }
    render_pass.set_vertex_buffer(0, quad.slice(..));
    render_pass.draw(0..4, 0..1);
}

/// What every full-screen pass needs besides its own bind groups.
pub struct PostDraw<'a> {
    pub device: &'a wgpu::Device,
    pub programs: &'a ProgramRegistry,
    pub quad: &'a wgpu::Buffer,
}

impl PostDraw<'_> {
    /// Pipeline drawing the screen quad with `program` into one `format` target.
    pub fn pipeline(
        &self,
        pipelines: &mut PipelineCache,
        program: ProgramId,
        label: &str,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        format: wgpu::TextureFormat,
        blend: Option<wgpu::BlendState>,
    ) -> Option<wgpu::RenderPipeline> {
        let targets = [Some(wgpu::ColorTargetState {
            format,
            blend,
            write_mask: wgpu::ColorWrites::ALL,
        })];
        pipelines.get_or_create(
            self.device,
            self.programs,
            program,
            &QuadVertex::layout(),
            &PipelineDesc {
                label,
                bind_group_layouts,
                targets: &targets,
                depth_format: None,
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                cull_mode: None,
            },
        )
    }
}
