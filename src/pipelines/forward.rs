use std::path::Path;

use crate::{
    data_structures::{
        scene::Scene,
        targets::{COLOR_FORMAT, RenderTargets},
        texture::Texture,
    },
    pipelines::{
        PipelineCache, PipelineDesc, opaque_target,
        program::{FORWARD_SHADING, ProgramId, ProgramRegistry},
    },
    resources::Resources,
};

/// Everything needed to draw the scene's entities.
pub struct SceneDraw<'a> {
    pub device: &'a wgpu::Device,
    pub programs: &'a ProgramRegistry,
    pub scene: &'a Scene,
    pub resources: &'a Resources,
    pub globals_layout: &'a wgpu::BindGroupLayout,
    pub locals_layout: &'a wgpu::BindGroupLayout,
    pub globals: &'a wgpu::BindGroup,
    pub locals: &'a wgpu::BindGroup,
}

/**
 * Draw every entity that received uniforms this frame, one draw per submesh.
 * A submesh whose layout the program cannot link against is skipped; so is
 * an entity whose model is gone.
 */
pub fn draw_entities(
    render_pass: &mut wgpu::RenderPass<'_>,
    draw: &SceneDraw,
    pipelines: &mut PipelineCache,
    program: ProgramId,
    label: &str,
    targets: &[Option<wgpu::ColorTargetState>],
) {
    let resources = draw.resources;
    let layouts = [
        draw.globals_layout,
        draw.locals_layout,
        &resources.material_layout,
    ];
    render_pass.set_bind_group(0, draw.globals, &[]);

    for entity in &draw.scene.entities {
        let Some(local_params) = entity.local_params else {
            continue;
        };
        let Some(model) = resources.model(entity.model) else {
            continue;
        };
        let Some(mesh) = resources.meshes.get(model.mesh) else {
            continue;
        };
        render_pass.set_bind_group(1, draw.locals, &[local_params.offset]);

        for (index, submesh) in mesh.submeshes.iter().enumerate() {
            let Some(pipeline) = pipelines.get_or_create(
                draw.device,
                draw.programs,
                program,
                &submesh.layout,
                &PipelineDesc {
                    label,
                    bind_group_layouts: &layouts,
                    targets,
                    depth_format: Some(Texture::DEPTH_FORMAT),
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                },
            ) else {
                continue;
            };
            let material = model.material(index, resources.default_material);
            let Some(material) = resources.materials.get(material) else {
                continue;
            };
            render_pass.set_pipeline(&pipeline);
            render_pass.set_bind_group(2, &material.bind_group, &[]);
            mesh.draw_submesh(render_pass, submesh);
        }
    }
}

pub fn depth_attachment(targets: &RenderTargets) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view: &targets.depth_attachment.view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}

/// Shades every entity directly into the colour target.
#[derive(Debug)]
pub struct ForwardPass {
    program: ProgramId,
}

impl ForwardPass {
    pub fn new(device: &wgpu::Device, programs: &mut ProgramRegistry, shader_path: &Path) -> Self {
        Self {
            program: programs.load(device, shader_path, FORWARD_SHADING),
        }
    }

    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        draw: &SceneDraw,
        pipelines: &mut PipelineCache,
        targets: &RenderTargets,
        clear: wgpu::Color,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &targets.color.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(depth_attachment(targets)),
            ..Default::default()
        });
        let color_targets = [opaque_target(COLOR_FORMAT)];
        draw_entities(
            &mut render_pass,
            draw,
            pipelines,
            self.program,
            "Forward Pass",
            &color_targets,
        );
    }
}
