//! Meshes, submeshes, materials and models.
//!
//! A [`Mesh`] owns one vertex and one index buffer shared by all of its
//! submeshes. Every [`Submesh`] describes its own interleaved vertex layout
//! and byte offsets into those buffers, so submeshes with and without
//! normals or texture coordinates can live side by side.

use wgpu::util::DeviceExt;

use crate::resources::TextureId;

/// Shader location of each attribute a loader may emit.
pub const POSITION_LOCATION: u32 = 0;
pub const NORMAL_LOCATION: u32 = 1;
pub const TEX_COORDS_LOCATION: u32 = 2;

/// One float attribute inside an interleaved vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexAttr {
    pub location: u32,
    /// Number of `f32` components (1..=4).
    pub components: u32,
    /// Byte offset inside the vertex.
    pub offset: u32,
}

/// Interleaved float vertex layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub attributes: Vec<VertexAttr>,
    pub stride: u32,
}

impl VertexLayout {
    /// Append an attribute right after the existing ones.
    pub fn push(&mut self, location: u32, components: u32) {
        self.attributes.push(VertexAttr {
            location,
            components,
            offset: self.stride,
        });
        self.stride += components * std::mem::size_of::<f32>() as u32;
    }

    pub fn with(mut self, location: u32, components: u32) -> Self {
        self.push(location, components);
        self
    }

    pub fn attribute(&self, location: u32) -> Option<&VertexAttr> {
        self.attributes.iter().find(|a| a.location == location)
    }

    /// Floats per vertex.
    pub fn floats(&self) -> usize {
        self.stride as usize / std::mem::size_of::<f32>()
    }
}

/// CPU description of one submesh inside [`MeshData`].
#[derive(Clone, Debug, PartialEq)]
pub struct SubmeshData {
    pub layout: VertexLayout,
    /// Byte offset of the first vertex in the shared vertex data.
    pub vertex_offset: u64,
    pub vertex_count: u32,
    /// Byte offset of the first index in the shared index data.
    pub index_offset: u64,
    pub index_count: u32,
    /// Index into the loader's material list.
    pub material: Option<usize>,
}

/// Flattened geometry ready to upload: interleaved floats plus `u32` indices.
/// Indices are local to each submesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubmeshData>,
}

impl MeshData {
    /// Append one submesh. `vertices` must be interleaved according to `layout`.
    pub fn push_submesh(
        &mut self,
        layout: VertexLayout,
        vertices: &[f32],
        indices: &[u32],
        material: Option<usize>,
    ) {
        let floats = layout.floats().max(1);
        let submesh = SubmeshData {
            vertex_offset: (self.vertices.len() * std::mem::size_of::<f32>()) as u64,
            vertex_count: (vertices.len() / floats) as u32,
            index_offset: (self.indices.len() * std::mem::size_of::<u32>()) as u64,
            index_count: indices.len() as u32,
            layout,
            material,
        };
        self.vertices.extend_from_slice(vertices);
        self.indices.extend_from_slice(indices);
        self.submeshes.push(submesh);
    }

    pub fn is_empty(&self) -> bool {
        self.submeshes.is_empty()
    }
}

#[derive(Debug)]
pub struct Submesh {
    pub layout: VertexLayout,
    pub vertex_offset: u64,
    pub vertex_count: u32,
    pub index_offset: u64,
    pub index_count: u32,
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub submeshes: Vec<Submesh>,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, name: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Vertex Buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Index Buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let submeshes = data
            .submeshes
            .iter()
            .map(|s| Submesh {
                layout: s.layout.clone(),
                vertex_offset: s.vertex_offset,
                vertex_count: s.vertex_count,
                index_offset: s.index_offset,
                index_count: s.index_count,
            })
            .collect();
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            submeshes,
        }
    }

    /// Bind the submesh's slices of the shared buffers and draw it.
    pub fn draw_submesh(&self, render_pass: &mut wgpu::RenderPass<'_>, submesh: &Submesh) {
        if submesh.index_count == 0 || submesh.vertex_count == 0 {
            return;
        }
        let vertex_end = submesh.vertex_offset + submesh.vertex_count as u64 * submesh.layout.stride as u64;
        let index_end = submesh.index_offset + submesh.index_count as u64 * 4;
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(submesh.vertex_offset..vertex_end));
        render_pass.set_index_buffer(
            self.index_buffer.slice(submesh.index_offset..index_end),
            wgpu::IndexFormat::Uint32,
        );
        render_pass.draw_indexed(0..submesh.index_count, 0, 0..1);
    }
}

/// Per-material values mirrored into the material uniform.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub albedo: [f32; 4],
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub albedo: [f32; 3],
    pub albedo_texture: TextureId,
    pub bind_group: wgpu::BindGroup,
}

/// One mesh and a material per submesh.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub mesh: usize,
    pub materials: Vec<usize>,
}

impl Model {
    /// Material of submesh `submesh`, or `fallback` when the model has none for it.
    pub fn material(&self, submesh: usize, fallback: usize) -> usize {
        self.materials.get(submesh).copied().unwrap_or(fallback)
    }
}

/// Vertex of the screen-filling quad used by every full-screen pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl QuadVertex {
    /// Triangle strip covering clip space.
    pub const QUAD: [QuadVertex; 4] = [
        QuadVertex { position: [-1.0, -1.0, 0.0], tex_coords: [0.0, 0.0] },
        QuadVertex { position: [1.0, -1.0, 0.0], tex_coords: [1.0, 0.0] },
        QuadVertex { position: [-1.0, 1.0, 0.0], tex_coords: [0.0, 1.0] },
        QuadVertex { position: [1.0, 1.0, 0.0], tex_coords: [1.0, 1.0] },
    ];

    pub fn layout() -> VertexLayout {
        VertexLayout::default().with(0, 3).with(1, 2)
    }
}

/// Vertex buffer of [`QuadVertex::QUAD`].
pub fn mk_quad_buffer(device: &wgpu::Device) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Screen Quad Vertex Buffer"),
        contents: bytemuck::cast_slice(&QuadVertex::QUAD),
        usage: wgpu::BufferUsages::VERTEX,
    })
}
