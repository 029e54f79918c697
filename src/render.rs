//! The render sequencer.
//!
//! A frame is a fixed, ordered list of passes derived from the
//! [`RenderSettings`] by [`frame_passes`]. The [`Renderer`] walks that list and
//! records every pass into one command encoder, wrapping each in a debug
//! group so frame captures show the structure.
//!
//! # Key types
//!
//! - [`RenderSettings`] selects the shading mode, the debug view and bloom
//! - [`FramePass`] names one pass of a frame
//! - [`Renderer`] owns the render targets, the bloom chain, the uniform
//!   buffers and the per-pass state
//!

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    context::Context,
    data_structures::{
        model::mk_quad_buffer,
        scene::Scene,
        targets::{BloomChain, RenderTargets, TargetKind},
    },
    frame::FrameUniforms,
    pipelines::{
        PipelineCache,
        bloom::BloomPass,
        deferred::DeferredPass,
        forward::{ForwardPass, SceneDraw},
        gui::{GuiFrame, GuiPainter},
        post::{PostDraw, PostParams, PostParamsBuffer, mk_composite_layout, mk_post_layout},
        present::PresentPass,
        program::ProgramRegistry,
    },
    resources::Resources,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderMode {
    Forward,
    #[default]
    Deferred,
}

impl RenderMode {
    pub const ALL: [RenderMode; 2] = [RenderMode::Deferred, RenderMode::Forward];

    pub fn label(self) -> &'static str {
        match self {
            RenderMode::Forward => "Forward",
            RenderMode::Deferred => "Deferred",
        }
    }
}

/// Which render target ends up on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebugView {
    #[default]
    Color,
    Depth,
    Albedo,
    Normal,
    Position,
}

impl DebugView {
    pub const ALL: [DebugView; 5] = [
        DebugView::Color,
        DebugView::Depth,
        DebugView::Albedo,
        DebugView::Normal,
        DebugView::Position,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DebugView::Color => "Color",
            DebugView::Depth => "Depth",
            DebugView::Albedo => "Albedo",
            DebugView::Normal => "Normals",
            DebugView::Position => "Position",
        }
    }

    pub fn target(self) -> TargetKind {
        match self {
            DebugView::Color => TargetKind::Color,
            DebugView::Depth => TargetKind::Depth,
            DebugView::Albedo => TargetKind::Albedo,
            DebugView::Normal => TargetKind::Normal,
            DebugView::Position => TargetKind::Position,
        }
    }

    /// How the present shader remaps the target; matches `view_mode` in WGSL.
    pub fn view_mode(self) -> u32 {
        self as u32
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub enabled: bool,
    /// Luminance above which a pixel contributes to bloom (0..1).
    pub threshold: f32,
    /// Spacing multiplier of the blur taps (0..4).
    pub kernel_radius: f32,
    /// Add the blurred levels on top of the presented image.
    pub composite: bool,
    pub lod_intensity: [f32; 5],
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 0.5,
            kernel_radius: 1.0,
            composite: true,
            lod_intensity: [1.0, 0.8, 0.6, 0.4, 0.2],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub mode: RenderMode,
    pub view: DebugView,
    pub bloom: BloomSettings,
}

impl RenderSettings {
    /// The G-buffer only exists in deferred mode; forward shading always shows colour.
    pub fn effective_view(&self) -> DebugView {
        match self.mode {
            RenderMode::Forward => DebugView::Color,
            RenderMode::Deferred => self.view,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FramePass {
    Forward,
    DeferredGeometry,
    DeferredLighting,
    BrightPixels,
    /// Builds bloom level `n` from level `n - 1`.
    Downsample(u32),
    BlurHorizontal(u32),
    BlurVertical(u32),
    Present,
    BloomComposite,
    Gui,
}

/// The ordered passes of one frame.
pub fn frame_passes(settings: &RenderSettings, bloom_levels: u32) -> Vec<FramePass> {
    let mut passes = match settings.mode {
        RenderMode::Forward => vec![FramePass::Forward],
        RenderMode::Deferred => vec![FramePass::DeferredGeometry, FramePass::DeferredLighting],
    };
    let bloom = settings.bloom.enabled && bloom_levels > 0;
    if bloom {
        passes.push(FramePass::BrightPixels);
        passes.extend((1..bloom_levels).map(FramePass::Downsample));
        for level in 0..bloom_levels {
            passes.push(FramePass::BlurHorizontal(level));
            passes.push(FramePass::BlurVertical(level));
        }
    }
    passes.push(FramePass::Present);
    if bloom && settings.bloom.composite {
        passes.push(FramePass::BloomComposite);
    }
    passes.push(FramePass::Gui);
    passes
}

/// Parameters of the full-screen passes; scene passes take none.
pub fn post_params(
    pass: FramePass,
    settings: &RenderSettings,
    display: (u32, u32),
    bloom_levels: u32,
) -> Option<PostParams> {
    let base = PostParams {
        kernel_radius: settings.bloom.kernel_radius,
        threshold: settings.bloom.threshold,
        ..PostParams::default()
    };
    match pass {
        FramePass::BrightPixels | FramePass::Downsample(_) => Some(base),
        FramePass::BlurHorizontal(_) => Some(PostParams {
            direction: [1.0, 0.0],
            ..base
        }),
        FramePass::BlurVertical(_) => Some(PostParams {
            direction: [0.0, 1.0],
            ..base
        }),
        FramePass::Present => Some(PostParams {
            view_mode: settings.effective_view().view_mode(),
            ..base
        }),
        FramePass::BloomComposite => Some(
            PostParams {
                texel_size: [1.0 / display.0.max(1) as f32, 1.0 / display.1.max(1) as f32],
                level_count: bloom_levels,
                ..base
            }
            .with_intensities(&settings.bloom.lod_intensity),
        ),
        FramePass::Forward
        | FramePass::DeferredGeometry
        | FramePass::DeferredLighting
        | FramePass::Gui => None,
    }
}

pub struct Renderer {
    pub targets: RenderTargets,
    pub bloom_chain: BloomChain,
    pub uniforms: FrameUniforms,
    pub pipelines: PipelineCache,
    post_params: PostParamsBuffer,
    post_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    quad: wgpu::Buffer,
    forward: ForwardPass,
    deferred: DeferredPass,
    bloom: BloomPass,
    present: PresentPass,
    gui: GuiPainter,
}

impl Renderer {
    /// Create every target and load every program from `shader_path`.
    pub fn new(ctx: &Context, programs: &mut ProgramRegistry, shader_path: &Path) -> Self {
        Self::with_device(
            &ctx.device,
            ctx.config.format,
            ctx.display_size(),
            ctx.uniform_alignment(),
            programs,
            shader_path,
        )
    }

    /// Like [`Renderer::new`] for a device without a window, e.g. in tests.
    pub fn with_device(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        display: (u32, u32),
        uniform_alignment: u32,
        programs: &mut ProgramRegistry,
        shader_path: &Path,
    ) -> Self {
        let targets = RenderTargets::new(device, display);
        let bloom_chain = BloomChain::new(device, display);
        let post_params = PostParamsBuffer::new(device, uniform_alignment);
        let post_layout = mk_post_layout(device);
        let composite_layout = mk_composite_layout(device);

        let forward = ForwardPass::new(device, programs, shader_path);
        let deferred = DeferredPass::new(device, programs, shader_path, &targets);
        let bloom = BloomPass::new(
            device,
            programs,
            shader_path,
            &post_layout,
            &post_params,
            &targets,
            &bloom_chain,
        );
        let present = PresentPass::new(
            device,
            programs,
            shader_path,
            &post_layout,
            &composite_layout,
            &post_params,
            &targets,
            &bloom_chain,
        );
        log::info!(
            "Render targets {}x{}, {} bloom levels",
            targets.size.0,
            targets.size.1,
            bloom_chain.levels
        );

        Self {
            uniforms: FrameUniforms::new(device, uniform_alignment),
            pipelines: PipelineCache::new(),
            quad: mk_quad_buffer(device),
            gui: GuiPainter::new(device, surface_format),
            targets,
            bloom_chain,
            post_params,
            post_layout,
            composite_layout,
            forward,
            deferred,
            bloom,
            present,
        }
    }

    /// Destroy and recreate every display-sized texture, then rebind them.
    pub fn rebuild_targets(&mut self, device: &wgpu::Device, display: (u32, u32)) {
        self.targets.destroy();
        self.bloom_chain.destroy();
        self.targets = RenderTargets::new(device, display);
        self.bloom_chain = BloomChain::new(device, display);
        self.deferred.rebuild(device, &self.targets);
        self.bloom.rebuild(
            device,
            &self.post_layout,
            &self.post_params,
            &self.targets,
            &self.bloom_chain,
        );
        self.present.rebuild(
            device,
            &self.post_layout,
            &self.composite_layout,
            &self.post_params,
            &self.targets,
            &self.bloom_chain,
        );
        log::info!(
            "Rebuilt render targets at {}x{} ({} bloom levels)",
            display.0,
            display.1,
            self.bloom_chain.levels
        );
    }

    pub fn render(
        &mut self,
        ctx: &Context,
        programs: &ProgramRegistry,
        scene: &Scene,
        resources: &Resources,
        settings: &RenderSettings,
        gui: Option<&GuiFrame>,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = ctx.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let plan = frame_passes(settings, self.bloom_chain.levels);
        let post_passes: Vec<(FramePass, PostParams)> = plan
            .iter()
            .filter_map(|&pass| {
                post_params(pass, settings, self.targets.size, self.bloom_chain.levels)
                    .map(|params| (pass, params))
            })
            .collect();
        let params: Vec<PostParams> = post_passes.iter().map(|(_, p)| *p).collect();
        let offsets = self.post_params.write(&ctx.queue, &params);
        let params_offset = |pass: FramePass| {
            post_passes
                .iter()
                .zip(&offsets)
                .find(|((p, _), _)| *p == pass)
                .and_then(|(_, offset)| *offset)
        };

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        let gui_commands = match gui {
            Some(gui) => self.gui.prepare(&ctx.device, &ctx.queue, &mut encoder, gui),
            None => Vec::new(),
        };

        let draw = SceneDraw {
            device: &ctx.device,
            programs,
            scene,
            resources,
            globals_layout: &self.uniforms.globals_layout,
            locals_layout: &self.uniforms.locals_layout,
            globals: &self.uniforms.globals,
            locals: &self.uniforms.locals,
        };
        let post = PostDraw {
            device: &ctx.device,
            programs,
            quad: &self.quad,
        };
        let clear = ctx.clear_colour;

        for pass in plan {
            encoder.push_debug_group(&format!("{pass:?}"));
            match pass {
                FramePass::Forward => {
                    self.forward
                        .record(&mut encoder, &draw, &mut self.pipelines, &self.targets, clear)
                }
                FramePass::DeferredGeometry => self.deferred.record_geometry(
                    &mut encoder,
                    &draw,
                    &mut self.pipelines,
                    &self.targets,
                ),
                FramePass::DeferredLighting => self.deferred.record_lighting(
                    &mut encoder,
                    &draw,
                    &post,
                    &mut self.pipelines,
                    &self.targets,
                    clear,
                ),
                FramePass::BrightPixels
                | FramePass::Downsample(_)
                | FramePass::BlurHorizontal(_)
                | FramePass::BlurVertical(_) => {
                    if let Some(offset) = params_offset(pass) {
                        self.bloom.record(
                            &mut encoder,
                            &post,
                            &mut self.pipelines,
                            &self.post_layout,
                            &self.bloom_chain,
                            pass,
                            offset,
                        );
                    }
                }
                FramePass::Present => {
                    if let Some(offset) = params_offset(pass) {
                        self.present.record_present(
                            &mut encoder,
                            &post,
                            &mut self.pipelines,
                            &self.post_layout,
                            &surface_view,
                            ctx.config.format,
                            settings.effective_view().target(),
                            offset,
                            clear,
                        );
                    }
                }
                FramePass::BloomComposite => {
                    if let Some(offset) = params_offset(pass) {
                        self.present.record_composite(
                            &mut encoder,
                            &post,
                            &mut self.pipelines,
                            &self.composite_layout,
                            &surface_view,
                            ctx.config.format,
                            offset,
                        );
                    }
                }
                FramePass::Gui => {
                    if let Some(gui) = gui {
                        self.gui.paint(&mut encoder, &surface_view, gui);
                    }
                }
            }
            encoder.pop_debug_group();
        }

        ctx.queue
            .submit(gui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();
        if let Some(gui) = gui {
            self.gui.free_textures(gui);
        }
        Ok(())
    }
}
