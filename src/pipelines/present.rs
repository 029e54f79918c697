use std::path::Path;

use crate::{
    data_structures::{
        targets::{BloomChain, RenderTargets, TargetKind},
        texture::create_clamp_sampler,
    },
    pipelines::{
        PipelineCache,
        post::{
            PostDraw, PostParamsBuffer, draw_fullscreen, mk_composite_bind_group,
            mk_post_bind_group,
        },
        program::{BLOOM, ProgramId, ProgramRegistry, TEXTURED_GEOMETRY},
    },
};

const TARGET_KINDS: [TargetKind; 5] = [
    TargetKind::Color,
    TargetKind::Normal,
    TargetKind::Albedo,
    TargetKind::Depth,
    TargetKind::Position,
];

/// Adds every bloom level, weighted by its alpha, on top of the presented image.
pub const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Copies a render target to the surface and composites the bloom chain.
#[derive(Debug)]
pub struct PresentPass {
    blit: ProgramId,
    composite: ProgramId,
    sampler: wgpu::Sampler,
    sources: Vec<(TargetKind, wgpu::BindGroup)>,
    bloom_source: wgpu::BindGroup,
}

impl PresentPass {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        programs: &mut ProgramRegistry,
        shader_path: &Path,
        post_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        params: &PostParamsBuffer,
        targets: &RenderTargets,
        chain: &BloomChain,
    ) -> Self {
        let sampler = create_clamp_sampler(device, "Bloom composite sampler");
        let sources = mk_sources(device, post_layout, params, targets);
        let bloom_source =
            mk_composite_bind_group(device, composite_layout, &chain.bright.view, &sampler, params);
        Self {
            blit: programs.load(device, shader_path, TEXTURED_GEOMETRY),
            composite: programs.load(device, shader_path, BLOOM),
            sampler,
            sources,
            bloom_source,
        }
    }

    pub fn rebuild(
        &mut self,
        device: &wgpu::Device,
        post_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        params: &PostParamsBuffer,
        targets: &RenderTargets,
        chain: &BloomChain,
    ) {
        self.sources = mk_sources(device, post_layout, params, targets);
        self.bloom_source = mk_composite_bind_group(
            device,
            composite_layout,
            &chain.bright.view,
            &self.sampler,
            params,
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_present(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        draw: &PostDraw,
        pipelines: &mut PipelineCache,
        post_layout: &wgpu::BindGroupLayout,
        surface: &wgpu::TextureView,
        surface_format: wgpu::TextureFormat,
        view: TargetKind,
        params_offset: u32,
        clear: wgpu::Color,
    ) {
        let Some((_, source)) = self.sources.iter().find(|(kind, _)| *kind == view) else {
            return;
        };
        let Some(pipeline) = draw.pipeline(
            pipelines,
            self.blit,
            "Present",
            &[post_layout],
            surface_format,
            Some(wgpu::BlendState::REPLACE),
        ) else {
            return;
        };
        draw_fullscreen(
            encoder,
            "Present",
            surface,
            wgpu::LoadOp::Clear(clear),
            &pipeline,
            &[(source, Some(params_offset))],
            draw.quad,
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_composite(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        draw: &PostDraw,
        pipelines: &mut PipelineCache,
        composite_layout: &wgpu::BindGroupLayout,
        surface: &wgpu::TextureView,
        surface_format: wgpu::TextureFormat,
        params_offset: u32,
    ) {
        let Some(pipeline) = draw.pipeline(
            pipelines,
            self.composite,
            "Bloom composite",
            &[composite_layout],
            surface_format,
            Some(ADDITIVE),
        ) else {
            return;
        };
        draw_fullscreen(
            encoder,
            "Bloom composite",
            surface,
            wgpu::LoadOp::Load,
            &pipeline,
            &[(&self.bloom_source, Some(params_offset))],
            draw.quad,
        );
    }
}

fn mk_sources(
    device: &wgpu::Device,
    post_layout: &wgpu::BindGroupLayout,
    params: &PostParamsBuffer,
    targets: &RenderTargets,
) -> Vec<(TargetKind, wgpu::BindGroup)> {
    TARGET_KINDS
        .iter()
        .map(|&kind| {
            let label = format!("Present {kind:?} source");
            let view = &targets.get(kind).view;
            (kind, mk_post_bind_group(device, post_layout, view, params, &label))
        })
        .collect()
}
