//! The per-frame update that runs before every render: shader hot reload,
//! camera movement, uniform packing and render-target resizing.

use cgmath::{Matrix4, Point3, Rad};

use crate::{
    camera::{Camera, CameraController, Projection},
    config::EngineConfig,
    context::Context,
    data_structures::{
        scene::{Entity, Light, Scene},
        targets::DisplaySizeTracker,
        uniform::{
            GLOBAL_HEADER_SIZE, GLOBAL_PARAMS_SIZE, LIGHT_STRIDE, LOCAL_PARAMS_SIZE, MAX_LIGHTS,
            UniformRange, UniformWriter, align_to, mk_uniform_buffer,
        },
    },
    pipelines::{mk_globals_layout, mk_locals_layout, program::ProgramRegistry},
    render::Renderer,
};

/// Entities the shared uniform buffer has room for.
pub const MAX_ENTITIES: u32 = 1024;

/// Bytes needed for the global block and `entities` entity blocks.
pub fn uniform_capacity(alignment: u32, entities: u32) -> u32 {
    align_to(GLOBAL_PARAMS_SIZE, alignment) + align_to(LOCAL_PARAMS_SIZE, alignment) * entities
}

/// The shared uniform buffer and the two bind groups reading it.
#[derive(Debug)]
pub struct FrameUniforms {
    pub writer: UniformWriter,
    pub buffer: wgpu::Buffer,
    pub globals_layout: wgpu::BindGroupLayout,
    pub locals_layout: wgpu::BindGroupLayout,
    pub globals: wgpu::BindGroup,
    pub locals: wgpu::BindGroup,
    pub alignment: u32,
}

impl FrameUniforms {
    pub fn new(device: &wgpu::Device, alignment: u32) -> Self {
        let capacity = uniform_capacity(alignment, MAX_ENTITIES);
        let buffer = mk_uniform_buffer(device, capacity, "Frame Uniform Buffer");
        let globals_layout = mk_globals_layout(device);
        let locals_layout = mk_locals_layout(device);
        let globals = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(GLOBAL_PARAMS_SIZE as u64),
                }),
            }],
            label: Some("global_params_bind_group"),
        });
        let locals = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &locals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(LOCAL_PARAMS_SIZE as u64),
                }),
            }],
            label: Some("local_params_bind_group"),
        });
        Self {
            writer: UniformWriter::new(capacity),
            buffer,
            globals_layout,
            locals_layout,
            globals,
            locals,
            alignment,
        }
    }
}

/// Per-entity block: model, view and projection, in that order.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct LocalParams {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

/**
 * Write the global block at offset 0 followed by one block per entity, each
 * starting on a multiple of `alignment`. Every entity's `local_params` is
 * replaced; entities that do not fit get `None` and are not drawn this
 * frame. Returns the number of entities packed.
 */
#[allow(clippy::too_many_arguments)]
pub fn pack_frame_uniforms(
    writer: &mut UniformWriter,
    camera_position: Point3<f32>,
    z_far: f32,
    lights: &[Light],
    entities: &mut [Entity],
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    alignment: u32,
) -> usize {
    writer.reset();
    if lights.len() > MAX_LIGHTS {
        log::warn!(
            "{} lights in the scene, only the first {MAX_LIGHTS} are shaded",
            lights.len()
        );
    }
    let light_count = lights.len().min(MAX_LIGHTS);

    let camera: [f32; 3] = camera_position.into();
    writer.push_bytes(bytemuck::cast_slice(&camera), 16);
    writer.push_u32(light_count as u32);
    writer.push_f32(z_far);
    for (index, light) in lights.iter().take(light_count).enumerate() {
        writer.pad_to(GLOBAL_HEADER_SIZE + index as u32 * LIGHT_STRIDE);
        writer.push_u32(light.kind as u32);
        writer.push_vec3(light.color);
        writer.push_vec3(light.direction);
        writer.push_vec3(light.position);
    }
    writer.pad_to(GLOBAL_PARAMS_SIZE);

    let mut packed = 0;
    let mut skipped = 0;
    for entity in entities.iter_mut() {
        let block = LocalParams {
            model: entity.world_matrix.into(),
            view: view.into(),
            projection: projection.into(),
        };
        entity.local_params = writer.push_pod(&block, alignment).map(|offset| UniformRange {
            offset,
            size: LOCAL_PARAMS_SIZE,
        });
        match entity.local_params {
            Some(_) => packed += 1,
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::warn!("Uniform buffer full, {skipped} entities skipped this frame");
    }
    packed
}

/// Camera state and the bookkeeping the frame update carries between frames.
#[derive(Debug)]
pub struct FrameUpdater {
    pub camera: Camera,
    pub projection: Projection,
    pub controller: CameraController,
    size_tracker: DisplaySizeTracker,
    hot_reload: bool,
}

impl FrameUpdater {
    pub fn new(config: &EngineConfig, display: (u32, u32)) -> Self {
        let camera_config = &config.camera;
        Self {
            camera: Camera::new(camera_config.position),
            projection: Projection::new(
                display.0,
                display.1,
                Rad::from(cgmath::Deg(camera_config.fovy_degrees)),
                camera_config.znear,
                camera_config.zfar,
            ),
            controller: CameraController::new(camera_config.sensitivity),
            size_tracker: DisplaySizeTracker::new(display),
            hot_reload: config.hot_reload,
        }
    }

    pub fn update(
        &mut self,
        dt: instant::Duration,
        ctx: &Context,
        programs: &mut ProgramRegistry,
        renderer: &mut Renderer,
        scene: &mut Scene,
    ) {
        if self.hot_reload {
            for program in programs.hot_reload(&ctx.device) {
                renderer.pipelines.invalidate(program);
            }
        }

        self.controller.update(&mut self.camera, dt);
        let view = self.camera.calc_matrix();
        let projection = self.projection.calc_matrix();

        let uniforms = &mut renderer.uniforms;
        pack_frame_uniforms(
            &mut uniforms.writer,
            self.camera.position,
            self.projection.zfar(),
            &scene.lights,
            &mut scene.entities,
            view,
            projection,
            uniforms.alignment,
        );
        uniforms.writer.flush(&ctx.queue, &uniforms.buffer);

        let display = ctx.display_size();
        if self.size_tracker.changed(display) {
            self.projection.resize(display.0, display.1);
            renderer.rebuild_targets(&ctx.device, display);
        }
    }
}
