use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{
    data_structures::model::{
        MeshData, NORMAL_LOCATION, POSITION_LOCATION, TEX_COORDS_LOCATION, VertexLayout,
    },
    resources::{ImportedMaterial, ImportedModel, TextureSource, load_string},
};

/**
 * Every obj object becomes one submesh. Normals and texture coordinates are only part of the
 * submesh's layout when the file provides them for every vertex.
 */
pub fn flatten_obj(models: &[tobj::Model]) -> MeshData {
    let mut data = MeshData::default();
    for m in models {
        let mesh = &m.mesh;
        let vertex_count = mesh.positions.len() / 3;
        if vertex_count == 0 || mesh.indices.is_empty() {
            log::warn!("Skipping obj object '{}' without triangles", m.name);
            continue;
        }
        let has_normals = mesh.normals.len() == vertex_count * 3;
        let has_tex_coords = mesh.texcoords.len() == vertex_count * 2;

        let mut layout = VertexLayout::default().with(POSITION_LOCATION, 3);
        if has_normals {
            layout.push(NORMAL_LOCATION, 3);
        }
        if has_tex_coords {
            layout.push(TEX_COORDS_LOCATION, 2);
        }

        let mut vertices = Vec::with_capacity(vertex_count * layout.floats());
        for i in 0..vertex_count {
            vertices.extend_from_slice(&mesh.positions[i * 3..i * 3 + 3]);
            if has_normals {
                vertices.extend_from_slice(&mesh.normals[i * 3..i * 3 + 3]);
            }
            if has_tex_coords {
                vertices.extend_from_slice(&mesh.texcoords[i * 2..i * 2 + 2]);
            }
        }
        data.push_submesh(layout, &vertices, &mesh.indices, mesh.material_id);
    }
    data
}

pub fn import_obj_materials(materials: &[tobj::Material], base_dir: &Path) -> Vec<ImportedMaterial> {
    materials
        .iter()
        .map(|m| ImportedMaterial {
            name: m.name.clone(),
            albedo: m.diffuse.unwrap_or([1.0, 1.0, 1.0]),
            albedo_texture: m
                .diffuse_texture
                .as_ref()
                .filter(|t| !t.is_empty())
                .map(|t| TextureSource::File(base_dir.join(t))),
        })
        .collect()
}

/// Parse an obj file and its mtl libraries. Material and texture paths are
/// resolved relative to the obj's directory.
pub async fn load_obj_data(path: &Path) -> anyhow::Result<ImportedModel> {
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let obj_text = load_string(path).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mtl_path = base_dir.join(&p);
            async move {
                match load_string(&mtl_path).await {
                    Ok(mtl_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl_text))),
                    Err(e) => {
                        log::error!("{e:#}");
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await?;

    let materials = match obj_materials {
        Ok(materials) => import_obj_materials(&materials, base_dir),
        Err(e) => {
            log::warn!("{}: materials unavailable ({e})", path.display());
            Vec::new()
        }
    };

    Ok(ImportedModel {
        mesh: flatten_obj(&models),
        materials,
    })
}
