//! Deferred shading: a geometry pass fills the G-buffer, a full-screen
//! lighting pass shades it once per pixel into the colour target.

use std::path::Path;

use crate::{
    data_structures::targets::{COLOR_FORMAT, GBUFFER_FORMATS, RenderTargets},
    pipelines::{
        PipelineCache,
        forward::{SceneDraw, depth_attachment, draw_entities},
        opaque_target,
        post::{PostDraw, draw_fullscreen},
        program::{DEFERRED_GEOMETRY, DEFERRED_LIGHTING, ProgramId, ProgramRegistry},
    },
};

/// The four G-buffer targets, read with `textureLoad` by the lighting pass.
pub fn mk_gbuffer_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = (0..GBUFFER_FORMATS.len() as u32)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
            },
            count: None,
        })
        .collect();
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("gbuffer_bind_group_layout"),
    })
}

fn mk_gbuffer_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    targets: &RenderTargets,
) -> wgpu::BindGroup {
    let views = [
        &targets.normal.view,
        &targets.albedo.view,
        &targets.depth.view,
        &targets.position.view,
    ];
    let entries: Vec<wgpu::BindGroupEntry> = views
        .iter()
        .enumerate()
        .map(|(binding, view)| wgpu::BindGroupEntry {
            binding: binding as u32,
            resource: wgpu::BindingResource::TextureView(view),
        })
        .collect();
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &entries,
        label: Some("G-buffer bind group"),
    })
}

#[derive(Debug)]
pub struct DeferredPass {
    geometry: ProgramId,
    lighting: ProgramId,
    gbuffer_layout: wgpu::BindGroupLayout,
    gbuffer: wgpu::BindGroup,
}

impl DeferredPass {
    pub fn new(
        device: &wgpu::Device,
        programs: &mut ProgramRegistry,
        shader_path: &Path,
        targets: &RenderTargets,
    ) -> Self {
        let gbuffer_layout = mk_gbuffer_layout(device);
        let gbuffer = mk_gbuffer_bind_group(device, &gbuffer_layout, targets);
        Self {
            geometry: programs.load(device, shader_path, DEFERRED_GEOMETRY),
            lighting: programs.load(device, shader_path, DEFERRED_LIGHTING),
            gbuffer_layout,
            gbuffer,
        }
    }

    pub fn rebuild(&mut self, device: &wgpu::Device, targets: &RenderTargets) {
        self.gbuffer = mk_gbuffer_bind_group(device, &self.gbuffer_layout, targets);
    }

    /// Writes normal, albedo, linear depth and position of the nearest surface.
    pub fn record_geometry(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        draw: &SceneDraw,
        pipelines: &mut PipelineCache,
        targets: &RenderTargets,
    ) {
        let clear = wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store: wgpu::StoreOp::Store,
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = [
            &targets.normal.view,
            &targets.albedo.view,
            &targets.depth.view,
            &targets.position.view,
        ]
        .into_iter()
        .map(|view| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: clear,
                depth_slice: None,
            })
        })
        .collect();
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Deferred Geometry Pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(depth_attachment(targets)),
            ..Default::default()
        });
        let gbuffer_targets = GBUFFER_FORMATS.map(opaque_target);
        draw_entities(
            &mut render_pass,
            draw,
            pipelines,
            self.geometry,
            "Deferred Geometry Pass",
            &gbuffer_targets,
        );
    }

    /// Shades every covered pixel. Uncovered pixels keep the clear colour.
    pub fn record_lighting(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        draw: &SceneDraw,
        post: &PostDraw,
        pipelines: &mut PipelineCache,
        targets: &RenderTargets,
        clear: wgpu::Color,
    ) {
        let Some(pipeline) = post.pipeline(
            pipelines,
            self.lighting,
            "Deferred Lighting Pass",
            &[draw.globals_layout, &self.gbuffer_layout],
            COLOR_FORMAT,
            None,
        ) else {
            return;
        };
        draw_fullscreen(
            encoder,
            "Deferred Lighting Pass",
            &targets.color.view,
            wgpu::LoadOp::Clear(clear),
            &pipeline,
            &[(draw.globals, None), (&self.gbuffer, None)],
            post.quad,
        );
    }
}
