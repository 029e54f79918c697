//! Bright-pixel extraction, the downsample chain and the separable blur.
//!
//! Every level has its own single-mip views, so each pass reads one mip and
//! writes another without aliasing:
//!
//! ```text
//! color ──bright──▶ bright[0] ──down──▶ bright[1] ──down──▶ ... bright[n-1]
//! bright[k] ──blur h──▶ blurred[k] ──blur v──▶ bright[k]
//! ```

use std::path::Path;

use crate::{
    data_structures::targets::{BLOOM_FORMAT, BloomChain, RenderTargets},
    pipelines::{
        PipelineCache,
        post::{PostDraw, PostParamsBuffer, draw_fullscreen, mk_post_bind_group},
        program::{BLUR, BRIGHTEST_PIXELS, DOWNSAMPLE, ProgramId, ProgramRegistry},
    },
    render::FramePass,
};

#[derive(Debug)]
pub struct BloomPass {
    bright: ProgramId,
    downsample: ProgramId,
    blur: ProgramId,
    color_source: wgpu::BindGroup,
    bright_sources: Vec<wgpu::BindGroup>,
    blurred_sources: Vec<wgpu::BindGroup>,
}

impl BloomPass {
    pub fn new(
        device: &wgpu::Device,
        programs: &mut ProgramRegistry,
        shader_path: &Path,
        post_layout: &wgpu::BindGroupLayout,
        params: &PostParamsBuffer,
        targets: &RenderTargets,
        chain: &BloomChain,
    ) -> Self {
        let (color_source, bright_sources, blurred_sources) =
            mk_sources(device, post_layout, params, targets, chain);
        Self {
            bright: programs.load(device, shader_path, BRIGHTEST_PIXELS),
            downsample: programs.load(device, shader_path, DOWNSAMPLE),
            blur: programs.load(device, shader_path, BLUR),
            color_source,
            bright_sources,
            blurred_sources,
        }
    }

    /// Rebind after the targets and the chain were recreated.
    pub fn rebuild(
        &mut self,
        device: &wgpu::Device,
        post_layout: &wgpu::BindGroupLayout,
        params: &PostParamsBuffer,
        targets: &RenderTargets,
        chain: &BloomChain,
    ) {
        (self.color_source, self.bright_sources, self.blurred_sources) =
            mk_sources(device, post_layout, params, targets, chain);
    }

    /// Record one bloom pass. Passes outside the bloom chain are ignored.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        draw: &PostDraw,
        pipelines: &mut PipelineCache,
        post_layout: &wgpu::BindGroupLayout,
        chain: &BloomChain,
        pass: FramePass,
        params_offset: u32,
    ) {
        let (label, program, source, target) = match pass {
            FramePass::BrightPixels => (
                "Bloom bright pixels",
                self.bright,
                Some(&self.color_source),
                chain.bright_levels.first(),
            ),
            FramePass::Downsample(level) if level > 0 => (
                "Bloom downsample",
                self.downsample,
                self.bright_sources.get(level as usize - 1),
                chain.bright_levels.get(level as usize),
            ),
            FramePass::BlurHorizontal(level) => (
                "Bloom blur horizontal",
                self.blur,
                self.bright_sources.get(level as usize),
                chain.blurred_levels.get(level as usize),
            ),
            FramePass::BlurVertical(level) => (
                "Bloom blur vertical",
                self.blur,
                self.blurred_sources.get(level as usize),
                chain.bright_levels.get(level as usize),
            ),
            _ => return,
        };
        let (Some(source), Some(target)) = (source, target) else {
            log::warn!("{label}: {pass:?} is outside the {} level chain", chain.levels);
            return;
        };
        let Some(pipeline) =
            draw.pipeline(pipelines, program, label, &[post_layout], BLOOM_FORMAT, None)
        else {
            return;
        };
        draw_fullscreen(
            encoder,
            label,
            target,
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            &pipeline,
            &[(source, Some(params_offset))],
            draw.quad,
        );
    }
}

fn mk_sources(
    device: &wgpu::Device,
    post_layout: &wgpu::BindGroupLayout,
    params: &PostParamsBuffer,
    targets: &RenderTargets,
    chain: &BloomChain,
) -> (wgpu::BindGroup, Vec<wgpu::BindGroup>, Vec<wgpu::BindGroup>) {
    let color = mk_post_bind_group(device, post_layout, &targets.color.view, params, "Bloom color source");
    let bright = chain
        .bright_levels
        .iter()
        .map(|view| mk_post_bind_group(device, post_layout, view, params, "Bloom bright source"))
        .collect();
    let blurred = chain
        .blurred_levels
        .iter()
        .map(|view| mk_post_bind_group(device, post_layout, view, params, "Bloom blurred source"))
        .collect();
    (color, bright, blurred)
}
