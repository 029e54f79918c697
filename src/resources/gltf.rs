//! glTF import. The node hierarchy is flattened: each triangle primitive
//! becomes a submesh whose positions and normals are baked into world space.

use std::path::Path;

use anyhow::Context as _;
use cgmath::{Matrix, Matrix3, Matrix4, SquareMatrix, Transform, Vector3};

use crate::{
    data_structures::model::{
        MeshData, NORMAL_LOCATION, POSITION_LOCATION, TEX_COORDS_LOCATION, VertexLayout,
    },
    resources::{ImportedMaterial, ImportedModel, TextureSource, load_binary},
};

pub async fn load_gltf_data(path: &Path) -> anyhow::Result<ImportedModel> {
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let bytes = load_binary(path).await?;
    let gltf = gltf::Gltf::from_slice(&bytes).context("parsing glTF")?;

    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffers.push(blob.to_vec()),
                None => anyhow::bail!("buffer {} refers to a missing GLB chunk", buffer.index()),
            },
            gltf::buffer::Source::Uri(uri) => {
                buffers.push(load_binary(&base_dir.join(uri)).await?);
            }
        }
    }

    let key = path.display().to_string();
    Ok(ImportedModel {
        mesh: flatten_gltf(&gltf.document, &buffers),
        materials: import_gltf_materials(&gltf.document, &buffers, base_dir, &key),
    })
}

pub fn import_gltf_materials(
    document: &gltf::Document,
    buffers: &[Vec<u8>],
    base_dir: &Path,
    key: &str,
) -> Vec<ImportedMaterial> {
    document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let [r, g, b, _] = pbr.base_color_factor();
            let albedo_texture = pbr.base_color_texture().and_then(|info| {
                let image = info.texture().source();
                match image.source() {
                    gltf::image::Source::View { view, mime_type } => {
                        let data = buffers.get(view.buffer().index())?;
                        let start = view.offset();
                        let end = start + view.length();
                        let bytes = data.get(start..end)?.to_vec();
                        Some(TextureSource::Embedded {
                            key: format!("{key}#image{}", image.index()),
                            bytes,
                            extension: mime_type.split('/').next_back().map(str::to_string),
                        })
                    }
                    gltf::image::Source::Uri { uri, .. } => {
                        Some(TextureSource::File(base_dir.join(uri)))
                    }
                }
            });
            ImportedMaterial {
                name: material
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("material{}", material.index().unwrap_or(0))),
                albedo: [r, g, b],
                albedo_texture,
            }
        })
        .collect()
}

pub fn flatten_gltf(document: &gltf::Document, buffers: &[Vec<u8>]) -> MeshData {
    let mut data = MeshData::default();
    let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => document.nodes().collect(),
    };
    for node in roots {
        flatten_node(&node, Matrix4::identity(), buffers, &mut data);
    }
    data
}

fn flatten_node(node: &gltf::Node, parent: Matrix4<f32>, buffers: &[Vec<u8>], data: &mut MeshData) {
    let world = parent * Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping non-triangle primitive {} of mesh '{}'",
                    primitive.index(),
                    mesh.name().unwrap_or("unnamed")
                );
                continue;
            }
            push_primitive(&primitive, world, buffers, data);
        }
    }
    for child in node.children() {
        flatten_node(&child, world, buffers, data);
    }
}

fn push_primitive(
    primitive: &gltf::Primitive,
    world: Matrix4<f32>,
    buffers: &[Vec<u8>],
    data: &mut MeshData,
) {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let Some(positions) = reader.read_positions() else {
        log::warn!("Skipping primitive {} without positions", primitive.index());
        return;
    };
    let positions: Vec<[f32; 3]> = positions.collect();
    let normals: Option<Vec<[f32; 3]>> = reader
        .read_normals()
        .map(|n| n.collect::<Vec<_>>())
        .filter(|n| n.len() == positions.len());
    // Images are flipped on load, so glTF's top-left UV origin flips too.
    let tex_coords: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().map(|[u, v]| [u, 1.0 - v]).collect::<Vec<_>>())
        .filter(|t| t.len() == positions.len());
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let normal_matrix = normal_matrix(&world);
    let mut layout = VertexLayout::default().with(POSITION_LOCATION, 3);
    if normals.is_some() {
        layout.push(NORMAL_LOCATION, 3);
    }
    if tex_coords.is_some() {
        layout.push(TEX_COORDS_LOCATION, 2);
    }
    let mut vertices = Vec::with_capacity(positions.len() * layout.floats());
    for (i, position) in positions.iter().enumerate() {
        let p = world.transform_point((*position).into());
        vertices.extend_from_slice(&[p.x, p.y, p.z]);
        if let Some(normals) = &normals {
            let n = normal_matrix * Vector3::from(normals[i]);
            vertices.extend_from_slice(&[n.x, n.y, n.z]);
        }
        if let Some(tex_coords) = &tex_coords {
            vertices.extend_from_slice(&tex_coords[i]);
        }
    }
    data.push_submesh(layout, &vertices, &indices, primitive.material().index());
}

fn normal_matrix(world: &Matrix4<f32>) -> Matrix3<f32> {
    let upper = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    match upper.invert() {
        Some(inverse) => inverse.transpose(),
        None => upper,
    }
}
