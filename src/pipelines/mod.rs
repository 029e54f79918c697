use std::collections::HashMap;

use crate::{
    data_structures::{
        model::VertexLayout,
        uniform::{GLOBAL_PARAMS_SIZE, LOCAL_PARAMS_SIZE},
    },
    pipelines::program::{ProgramId, ProgramRegistry, VertexInput},
};

pub mod bloom;
pub mod deferred;
pub mod forward;
pub mod gui;
pub mod post;
pub mod present;
pub mod program;

/// Everything a pass decides about its pipeline apart from the shaders and
/// the vertex layout.
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub targets: &'a [Option<wgpu::ColorTargetState>],
    pub depth_format: Option<wgpu::TextureFormat>,
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
}

/// Colour target format and blend mode of one attachment.
pub type TargetKey = Option<(wgpu::TextureFormat, Option<wgpu::BlendState>)>;

/// A pipeline is valid for one program generation, one vertex layout and one
/// set of output states.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: ProgramId,
    pub generation: u32,
    pub layout: VertexLayout,
    pub targets: Vec<TargetKey>,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
}

impl PipelineKey {
    pub fn new(
        program: ProgramId,
        generation: u32,
        layout: &VertexLayout,
        desc: &PipelineDesc,
    ) -> Self {
        Self {
            program,
            generation,
            layout: layout.clone(),
            targets: desc
                .targets
                .iter()
                .map(|t| t.as_ref().map(|t| (t.format, t.blend)))
                .collect(),
            depth_format: desc.depth_format,
            topology: desc.topology,
            cull_mode: desc.cull_mode,
        }
    }
}

/// Render pipelines created on first use. A failed link is remembered as
/// `None` so it is logged once and not retried until the program reloads.
#[derive(Debug, Default)]
pub struct PipelineCache {
    pipelines: HashMap<PipelineKey, Option<wgpu::RenderPipeline>>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        programs: &ProgramRegistry,
        program: ProgramId,
        layout: &VertexLayout,
        desc: &PipelineDesc,
    ) -> Option<wgpu::RenderPipeline> {
        let entry = programs.get(program)?;
        let modules = entry.modules.as_ref()?;
        let key = PipelineKey::new(program, entry.generation, layout, desc);
        if let Some(pipeline) = self.pipelines.get(&key) {
            return pipeline.clone();
        }

        let pipeline = match link_vertex_layout(&entry.vertex_inputs, layout) {
            Ok(attributes) => {
                let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(&format!("{} Pipeline Layout", desc.label)),
                    bind_group_layouts: desc.bind_group_layouts,
                    push_constant_ranges: &[],
                });
                let buffers = [wgpu::VertexBufferLayout {
                    array_stride: layout.stride as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }];
                Some(mk_render_pipeline(
                    device,
                    desc,
                    &pipeline_layout,
                    &modules.vertex,
                    &modules.fragment,
                    if attributes.is_empty() { &[] } else { &buffers },
                ))
            }
            Err(e) => {
                log::error!("Cannot draw {} with program {}: {e:#}", desc.label, entry.name);
                None
            }
        };
        self.pipelines.insert(key, pipeline.clone());
        pipeline
    }

    /// Drop every pipeline built from an older generation of `program`.
    pub fn invalidate(&mut self, program: ProgramId) {
        self.pipelines.retain(|key, _| key.program != program);
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

fn float_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

/// Match every program input with the submesh attribute at the same location.
pub fn link_vertex_layout(
    inputs: &[VertexInput],
    layout: &VertexLayout,
) -> anyhow::Result<Vec<wgpu::VertexAttribute>> {
    inputs
        .iter()
        .map(|input| {
            let Some(attr) = layout.attribute(input.location) else {
                anyhow::bail!("vertex layout has no attribute at location {}", input.location);
            };
            let Some(format) = float_format(attr.components) else {
                anyhow::bail!(
                    "attribute at location {} has {} components",
                    attr.location,
                    attr.components
                );
            };
            Ok(wgpu::VertexAttribute {
                offset: attr.offset as wgpu::BufferAddress,
                shader_location: input.location,
                format,
            })
        })
        .collect()
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    desc: &PipelineDesc,
    layout: &wgpu::PipelineLayout,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    vertex_layouts: &[wgpu::VertexBufferLayout],
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(desc.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some("fs_main"),
            targets: desc.targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: desc.depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

/// Opaque colour target without blending.
pub fn opaque_target(format: wgpu::TextureFormat) -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })
}

/// Group 0: the global block at the start of the frame's uniform buffer.
pub fn mk_globals_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(GLOBAL_PARAMS_SIZE as u64),
            },
            count: None,
        }],
        label: Some("global_params_bind_group_layout"),
    })
}

/// Group 1: one entity block, selected with a dynamic offset per draw.
pub fn mk_locals_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(LOCAL_PARAMS_SIZE as u64),
            },
            count: None,
        }],
        label: Some("local_params_bind_group_layout"),
    })
}
