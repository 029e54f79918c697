use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{Material, MaterialUniform},
        texture::{self, Texture},
    },
    resources::TextureId,
};

/// Albedo texture, its sampler and the material's constant colour.
pub fn mk_material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
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
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<MaterialUniform>() as u64,
                    ),
                },
                count: None,
            },
        ],
        label: Some("Material bind_group_layout"),
    })
}

pub fn mk_material(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    name: &str,
    albedo: [f32; 3],
    texture_id: TextureId,
    texture: &Texture,
) -> Material {
    let uniform = MaterialUniform {
        albedo: [albedo[0], albedo[1], albedo[2], 1.0],
    };
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name} Material Buffer")),
        contents: bytemuck::bytes_of(&uniform),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let fallback_sampler;
    let sampler = match &texture.sampler {
        Some(sampler) => sampler,
        None => {
            fallback_sampler = texture::create_default_sampler(device);
            &fallback_sampler
        }
    };
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: buffer.as_entire_binding(),
            },
        ],
        label: Some(name),
    });
    Material {
        name: name.to_string(),
        albedo,
        albedo_texture: texture_id,
        bind_group,
    }
}
