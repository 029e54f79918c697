//! Paints tessellated egui output on top of the presented frame.
//!
//! [`GuiPainter::prepare`] applies texture updates and uploads the geometry
//! before the passes record, [`GuiPainter::paint`] draws into the surface and
//! [`GuiPainter::free_textures`] drops textures egui no longer uses once the
//! frame was submitted.

use egui_wgpu::{Renderer as EguiRenderer, RendererOptions, ScreenDescriptor};

/// Tessellated output of one egui pass.
#[derive(Default)]
pub struct GuiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
    pub size_in_pixels: [u32; 2],
}

impl GuiFrame {
    pub fn screen_descriptor(&self) -> ScreenDescriptor {
        ScreenDescriptor {
            size_in_pixels: self.size_in_pixels,
            pixels_per_point: self.pixels_per_point,
        }
    }
}

pub struct GuiPainter {
    renderer: EguiRenderer,
}

impl GuiPainter {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self {
            renderer: EguiRenderer::new(device, format, RendererOptions::default()),
        }
    }

    /// Apply texture updates and upload this frame's geometry. The returned
    /// command buffers must be submitted before the frame's encoder.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: &GuiFrame,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, delta) in &frame.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &frame.primitives,
            &frame.screen_descriptor(),
        )
    }

    /// Draw on top of whatever `target` already holds.
    pub fn paint(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        frame: &GuiFrame,
    ) {
        if frame.primitives.is_empty() {
            return;
        }
        let mut render_pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Gui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            })
            .forget_lifetime();
        self.renderer
            .render(&mut render_pass, &frame.primitives, &frame.screen_descriptor());
    }

    /// Forget textures egui freed this frame. Call after the frame was submitted.
    pub fn free_textures(&mut self, frame: &GuiFrame) {
        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
