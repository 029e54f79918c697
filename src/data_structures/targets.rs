//! Display-sized render targets and the bloom mip chain.
//!
//! Both are rebuilt from scratch whenever the display size changes. The old
//! textures are destroyed before the replacements are created.

use crate::data_structures::texture::Texture;

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Linear view depth divided by the far plane.
pub const LINEAR_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const BLOOM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Upper bound of bloom levels; small displays get fewer.
pub const BLOOM_MAX_LEVELS: u32 = 5;

/// Formats written by the deferred geometry pass, in attachment order.
pub const GBUFFER_FORMATS: [wgpu::TextureFormat; 4] =
    [NORMAL_FORMAT, ALBEDO_FORMAT, LINEAR_DEPTH_FORMAT, POSITION_FORMAT];

/// Size of bloom level `level`: level 0 is half the display, every further
/// level halves again, never dropping below one pixel.
pub fn bloom_level_size(display: (u32, u32), level: u32) -> (u32, u32) {
    let shift = (level + 1).min(31);
    ((display.0 >> shift).max(1), (display.1 >> shift).max(1))
}

/// Levels the chain can hold for this display size.
pub fn bloom_level_count(display: (u32, u32)) -> u32 {
    let (w, h) = bloom_level_size(display, 0);
    let full_chain = 32 - w.max(h).leading_zeros();
    full_chain.clamp(1, BLOOM_MAX_LEVELS)
}

/// Which render target a debug view shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Color,
    Normal,
    Albedo,
    Depth,
    Position,
}

/// The frame's colour and G-buffer attachments.
#[derive(Debug)]
pub struct RenderTargets {
    pub size: (u32, u32),
    pub color: Texture,
    pub normal: Texture,
    pub albedo: Texture,
    pub depth: Texture,
    pub position: Texture,
    pub depth_attachment: Texture,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let size = (size.0.max(1), size.1.max(1));
        let extent = [size.0, size.1];
        Self {
            size,
            color: Texture::create_render_target(device, extent, COLOR_FORMAT, 1, "rt_color"),
            normal: Texture::create_render_target(device, extent, NORMAL_FORMAT, 1, "rt_normal"),
            albedo: Texture::create_render_target(device, extent, ALBEDO_FORMAT, 1, "rt_albedo"),
            depth: Texture::create_render_target(device, extent, LINEAR_DEPTH_FORMAT, 1, "rt_depth"),
            position: Texture::create_render_target(device, extent, POSITION_FORMAT, 1, "rt_position"),
            depth_attachment: Texture::create_depth_texture(device, extent, "rt_depth_attachment"),
        }
    }

    pub fn get(&self, kind: TargetKind) -> &Texture {
        match kind {
            TargetKind::Color => &self.color,
            TargetKind::Normal => &self.normal,
            TargetKind::Albedo => &self.albedo,
            TargetKind::Depth => &self.depth,
            TargetKind::Position => &self.position,
        }
    }

    pub fn destroy(&self) {
        for texture in [
            &self.color,
            &self.normal,
            &self.albedo,
            &self.depth,
            &self.position,
            &self.depth_attachment,
        ] {
            texture.destroy();
        }
    }
}

/// Two half-resolution textures with one mip per bloom level. `bright` holds
/// the extracted pixels and, after the vertical pass, the blurred result;
/// `blurred` holds the horizontal intermediate.
#[derive(Debug)]
pub struct BloomChain {
    pub display: (u32, u32),
    pub levels: u32,
    pub bright: Texture,
    pub blurred: Texture,
    pub bright_levels: Vec<wgpu::TextureView>,
    pub blurred_levels: Vec<wgpu::TextureView>,
}

impl BloomChain {
    pub fn new(device: &wgpu::Device, display: (u32, u32)) -> Self {
        let levels = bloom_level_count(display);
        let (w, h) = bloom_level_size(display, 0);
        let bright = Texture::create_render_target(device, [w, h], BLOOM_FORMAT, levels, "rt_bright");
        let blurred =
            Texture::create_render_target(device, [w, h], BLOOM_FORMAT, levels, "rt_bloom_h");
        let bright_levels = (0..levels)
            .map(|level| bright.mip_view(level, &format!("rt_bright level {level}")))
            .collect();
        let blurred_levels = (0..levels)
            .map(|level| blurred.mip_view(level, &format!("rt_bloom_h level {level}")))
            .collect();
        Self {
            display,
            levels,
            bright,
            blurred,
            bright_levels,
            blurred_levels,
        }
    }

    pub fn destroy(&self) {
        self.bright.destroy();
        self.blurred.destroy();
    }
}

/// Remembers the display size of the previous frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplaySizeTracker {
    last: (u32, u32),
}

impl DisplaySizeTracker {
    pub fn new(size: (u32, u32)) -> Self {
        Self { last: size }
    }

    /// True once per change; zero-sized displays are ignored.
    pub fn changed(&mut self, current: (u32, u32)) -> bool {
        if current.0 == 0 || current.1 == 0 || current == self.last {
            return false;
        }
        self.last = current;
        true
    }

    pub fn last(&self) -> (u32, u32) {
        self.last
    }
}
