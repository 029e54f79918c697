use std::io::{BufReader, Cursor};

use shade_ngin::{
    data_structures::{
        model::{Model, NORMAL_LOCATION, POSITION_LOCATION, TEX_COORDS_LOCATION},
        texture::decode_image,
    },
    resources::{
        AssetCache, TextureSource,
        gltf::flatten_gltf,
        mesh::{flatten_obj, import_obj_materials},
    },
};

#[cfg(feature = "integration-tests")]
mod common;

const QUAD_OBJ: &str = "
o Quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl Red
f 1/1/1 2/2/1 3/3/1 4/4/1
o Bare
v 0 0 1
v 1 0 1
v 0 1 1
f 5 6 7
";

fn load_obj(source: &str) -> Vec<tobj::Model> {
    let (models, _) = tobj::load_obj_buf(
        &mut BufReader::new(Cursor::new(source)),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )
    .unwrap();
    models
}

#[test]
fn obj_objects_become_submeshes_with_their_own_layout() {
    let data = flatten_obj(&load_obj(QUAD_OBJ));
    assert_eq!(data.submeshes.len(), 2);

    let quad = &data.submeshes[0];
    assert_eq!(quad.index_count, 6);
    assert_eq!(quad.vertex_count, 4);
    assert_eq!(quad.layout.stride, 8 * 4);
    assert_eq!(quad.layout.attribute(NORMAL_LOCATION).unwrap().offset, 12);
    assert_eq!(quad.layout.attribute(TEX_COORDS_LOCATION).unwrap().offset, 24);

    let bare = &data.submeshes[1];
    assert_eq!(bare.layout.stride, 3 * 4);
    assert!(bare.layout.attribute(NORMAL_LOCATION).is_none());
    assert_eq!(bare.vertex_offset, 4 * 8 * 4);
    assert_eq!(bare.index_offset, 6 * 4);
    // Indices stay local to their submesh.
    assert!(data.indices[6..].iter().all(|&i| i < 3));
}

#[test]
fn obj_materials_resolve_against_model_directory() {
    let (materials, _) = tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(
        "newmtl Red\nKd 1 0 0\nmap_Kd red.png\nnewmtl Plain\nKd 0.5 0.5 0.5\n",
    )))
    .unwrap();
    let imported = import_obj_materials(&materials, std::path::Path::new("models/crate"));
    assert_eq!(imported.len(), 2);
    assert_eq!(imported[0].albedo, [1.0, 0.0, 0.0]);
    assert_eq!(
        imported[0].albedo_texture,
        Some(TextureSource::File("models/crate/red.png".into()))
    );
    assert!(imported[1].albedo_texture.is_none());
}

#[test]
fn asset_cache_hands_out_stable_ids_and_retries_failures() {
    let mut cache: AssetCache<u32> = AssetCache::new();
    assert_eq!(cache.get_or_load("a", || Ok(1)), Some(0));
    assert_eq!(cache.get_or_load("a", || Ok(99)), Some(0));
    assert_eq!(cache.get(0), Some(&1));

    assert_eq!(cache.get_or_load("b", || anyhow::bail!("broken")), None);
    assert_eq!(cache.id("b"), None);
    assert_eq!(cache.get_or_load("b", || Ok(2)), Some(1));
    assert_eq!(cache.len(), 2);
}

fn png(width: u32, height: u32, color: image::ColorType, pixels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::write_buffer_with_format(
        &mut Cursor::new(&mut bytes),
        pixels,
        width,
        height,
        color,
        image::ImageFormat::Png,
    )
    .unwrap();
    bytes
}

#[test]
fn images_are_flipped_bottom_row_first() {
    // Top row red, bottom row blue.
    let pixels = [255, 0, 0, 0, 0, 255];
    let bytes = png(1, 2, image::ColorType::Rgb8, &pixels);
    let decoded = decode_image(&bytes, "two rows", Some("png")).unwrap();
    assert_eq!((decoded.width, decoded.height, decoded.channels), (1, 2, 3));
    assert_eq!(decoded.rgba, vec![0, 0, 255, 255, 255, 0, 0, 255]);
}

#[test]
fn unusual_channel_counts_are_converted() {
    let bytes = png(2, 1, image::ColorType::L8, &[10, 20]);
    let decoded = decode_image(&bytes, "grey", None).unwrap();
    assert_eq!(decoded.channels, 1);
    assert_eq!(decoded.rgba, vec![10, 10, 10, 255, 20, 20, 20, 255]);
}

#[test]
fn garbage_is_an_error() {
    assert!(decode_image(b"not an image", "garbage", Some("png")).is_err());
}

const TRIANGLE_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "translation": [1.0, 2.0, 3.0], "children": [1] },
    { "scale": [2.0, 2.0, 2.0], "mesh": 0 }
  ],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
  "buffers": [{ "byteLength": 36, "uri": "triangle.bin" }],
  "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
  "accessors": [{
    "bufferView": 0,
    "componentType": 5126,
    "count": 3,
    "type": "VEC3",
    "min": [0.0, 0.0, 0.0],
    "max": [1.0, 1.0, 0.0]
  }]
}"#;

#[test]
fn gltf_nodes_are_baked_into_positions() {
    let gltf = gltf::Gltf::from_slice(TRIANGLE_GLTF.as_bytes()).unwrap();
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let buffers = vec![bytemuck::cast_slice::<f32, u8>(&positions).to_vec()];

    let data = flatten_gltf(&gltf.document, &buffers);
    assert_eq!(data.submeshes.len(), 1);
    let submesh = &data.submeshes[0];
    assert_eq!(submesh.layout.stride, 12);
    assert!(submesh.layout.attribute(POSITION_LOCATION).is_some());
    // Unindexed primitives get a trivial index list.
    assert_eq!(data.indices, vec![0, 1, 2]);
    assert_eq!(
        data.vertices,
        vec![1.0, 2.0, 3.0, 3.0, 2.0, 3.0, 1.0, 4.0, 3.0]
    );
}

#[test]
fn submeshes_without_a_material_use_the_fallback() {
    let model = Model {
        name: "two parts, one material".to_string(),
        mesh: 0,
        materials: vec![3],
    };
    assert_eq!(model.material(0, 9), 3);
    assert_eq!(model.material(1, 9), 9);
}

#[test]
#[cfg(feature = "integration-tests")]
fn loading_a_texture_twice_reuses_the_upload() {
    use shade_ngin::resources::Resources;

    use crate::common::test_utils::headless_device;

    let Some((device, queue)) = headless_device() else {
        eprintln!("no adapter, skipping");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let bytes = png(2, 2, image::ColorType::Rgba8, &[255; 16]);
    std::fs::write(dir.path().join("white.png"), bytes).unwrap();

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut resources = Resources::new(&device, &queue, dir.path());
    let default = resources.default_material;
    assert_eq!(
        resources.materials[default].albedo_texture,
        resources.white_texture
    );
    let before = resources.textures.len();

    let first = runtime.block_on(resources.load_texture("white.png")).unwrap();
    assert_eq!(resources.textures.len(), before + 1);
    let second = runtime.block_on(resources.load_texture("white.png")).unwrap();
    assert_eq!(first, second);
    assert_eq!(resources.textures.len(), before + 1);
    assert_eq!(resources.texture(first).unwrap().texture.width(), 2);

    // A missing file is not cached, so nothing is added.
    assert!(runtime.block_on(resources.load_texture("missing.png")).is_none());
    assert_eq!(resources.textures.len(), before + 1);
}
