//! Loading meshes, materials and textures from external files.
//!
//! Parsing is split from uploading: [`mesh::load_obj_data`] and
//! [`gltf::load_gltf_data`] turn a file into an [`ImportedModel`] without
//! touching the GPU, and [`Resources`] uploads the result and keeps every
//! handle alive for the lifetime of the application.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    data_structures::{
        model::{Material, Mesh, MeshData, Model},
        texture::Texture,
    },
    resources::texture::{mk_material, mk_material_layout},
};

pub mod gltf;
pub mod mesh;
pub mod texture;

pub type TextureId = usize;
pub type MaterialId = usize;
pub type MeshId = usize;
pub type ModelId = usize;

pub async fn load_string(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

pub async fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

/// Where a material's albedo image comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    /// A file, already resolved against the model's directory.
    File(PathBuf),
    /// Bytes stored inside the model file. `key` identifies them in the cache.
    Embedded {
        key: String,
        bytes: Vec<u8>,
        extension: Option<String>,
    },
}

impl TextureSource {
    pub fn key(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Embedded { key, .. } => key.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportedMaterial {
    pub name: String,
    pub albedo: [f32; 3],
    pub albedo_texture: Option<TextureSource>,
}

/// A model file flattened into one mesh and its materials.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedModel {
    pub mesh: MeshData,
    pub materials: Vec<ImportedMaterial>,
}

/// Path-keyed store that hands out stable indices.
#[derive(Debug)]
pub struct AssetCache<T> {
    entries: Vec<T>,
    by_key: HashMap<String, usize>,
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached entry for `key` or run `load`. Failures are logged
    /// and not cached, so a later request tries again.
    pub fn get_or_load(
        &mut self,
        key: &str,
        load: impl FnOnce() -> anyhow::Result<T>,
    ) -> Option<usize> {
        if let Some(&id) = self.by_key.get(key) {
            return Some(id);
        }
        match load() {
            Ok(value) => Some(self.insert(key, value)),
            Err(e) => {
                log::error!("Could not load {key}: {e:#}");
                None
            }
        }
    }

    /// Store a value under `key`, replacing the key's previous mapping.
    pub fn insert(&mut self, key: &str, value: T) -> usize {
        let id = self.entries.len();
        self.entries.push(value);
        self.by_key.insert(key.to_string(), id);
        id
    }

    pub fn id(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every texture, material, mesh and model the application loaded.
#[derive(Debug)]
pub struct Resources {
    device: wgpu::Device,
    queue: wgpu::Queue,
    assets_dir: PathBuf,
    pub textures: AssetCache<Texture>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub models: AssetCache<Model>,
    pub material_layout: wgpu::BindGroupLayout,
    /// Bound for materials without an albedo texture.
    pub white_texture: TextureId,
    /// Bound when a referenced texture failed to load.
    pub missing_texture: TextureId,
    fallback: Texture,
    /// White, untextured material for submeshes that reference none.
    pub default_material: MaterialId,
}

impl Resources {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, assets_dir: impl Into<PathBuf>) -> Self {
        let mut textures = AssetCache::new();
        let white_texture = textures.insert(
            "<white>",
            Texture::solid_color(device, queue, [255, 255, 255, 255], "white"),
        );
        let fallback = Texture::solid_color(device, queue, [255, 0, 255, 255], "missing");
        let missing_texture = textures.insert("<missing>", fallback.clone());
        let mut resources = Self {
            device: device.clone(),
            queue: queue.clone(),
            assets_dir: assets_dir.into(),
            textures,
            materials: Vec::new(),
            meshes: Vec::new(),
            models: AssetCache::new(),
            material_layout: mk_material_layout(device),
            white_texture,
            missing_texture,
            fallback,
            default_material: 0,
        };
        resources.default_material =
            resources.push_material("default", [1.0, 1.0, 1.0], resources.white_texture);
        resources
    }

    /// Resolve a path relative to the assets directory; absolute paths pass through.
    pub fn asset_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.assets_dir.join(path)
    }

    /// Load (or fetch from the cache) the texture at `path`.
    pub async fn load_texture(&mut self, path: impl AsRef<Path>) -> Option<TextureId> {
        let path = self.asset_path(path);
        let key = path.display().to_string();
        if let Some(id) = self.textures.id(&key) {
            return Some(id);
        }
        let bytes = match load_binary(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Could not open texture {key}: {e:#}");
                return None;
            }
        };
        self.texture_from_source(&TextureSource::Embedded {
            key,
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().to_string()),
            bytes,
        })
    }

    fn texture_from_source(&mut self, source: &TextureSource) -> Option<TextureId> {
        let key = source.key();
        let (device, queue) = (&self.device, &self.queue);
        match source {
            TextureSource::File(path) => {
                let path = path.clone();
                self.textures.get_or_load(&key, || {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    let extension = path.extension().and_then(|e| e.to_str());
                    Texture::from_bytes(device, queue, &bytes, &key, extension)
                })
            }
            TextureSource::Embedded {
                bytes, extension, ..
            } => self.textures.get_or_load(&key, || {
                Texture::from_bytes(device, queue, bytes, &key, extension.as_deref())
            }),
        }
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id)
    }

    fn push_material(&mut self, name: &str, albedo: [f32; 3], texture: TextureId) -> MaterialId {
        let view = self.textures.get(texture).unwrap_or(&self.fallback);
        let material = mk_material(
            &self.device,
            &self.material_layout,
            name,
            albedo,
            texture,
            view,
        );
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Load a model, dispatching on the file extension. Loading the same path
    /// twice returns the first model.
    pub async fn load_model(&mut self, path: impl AsRef<Path>) -> Option<ModelId> {
        let path = self.asset_path(path);
        let key = path.display().to_string();
        if let Some(id) = self.models.id(&key) {
            return Some(id);
        }
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let imported = match extension.as_str() {
            "obj" => mesh::load_obj_data(&path).await,
            "gltf" | "glb" => gltf::load_gltf_data(&path).await,
            other => Err(anyhow::anyhow!("unsupported model format '{other}'")),
        };
        let imported = match imported {
            Ok(imported) => imported,
            Err(e) => {
                log::error!("Could not load model {key}: {e:#}");
                return None;
            }
        };
        if imported.mesh.is_empty() {
            log::warn!("{key} contains no triangle geometry");
        }
        Some(self.upload_model(&key, imported))
    }

    /// Upload an already parsed model.
    pub fn upload_model(&mut self, name: &str, imported: ImportedModel) -> ModelId {
        let mut material_ids = Vec::with_capacity(imported.materials.len());
        for material in &imported.materials {
            let texture = match &material.albedo_texture {
                None => self.white_texture,
                Some(source) => self
                    .texture_from_source(source)
                    .unwrap_or(self.missing_texture),
            };
            material_ids.push(self.push_material(&material.name, material.albedo, texture));
        }

        let mut materials = Vec::with_capacity(imported.mesh.submeshes.len());
        for submesh in &imported.mesh.submeshes {
            let id = match submesh.material.and_then(|m| material_ids.get(m)) {
                Some(&id) => id,
                None => self.default_material,
            };
            materials.push(id);
        }

        self.meshes.push(Mesh::upload(&self.device, name, &imported.mesh));
        let model = Model {
            name: name.to_string(),
            mesh: self.meshes.len() - 1,
            materials,
        };
        self.models.insert(name, model)
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id)
    }
}
