//! Engine data structures: meshes, textures, render targets, the scene and uniform packing.
//!
//! - `model` contains mesh, submesh and material definitions plus the screen quad
//! - `scene` holds entities, lights and the named object list
//! - `targets` owns the display-sized render targets and the bloom mip chain
//! - `texture` contains the GPU texture wrapper and image decoding
//! - `transform` converts between world matrices and editable transforms
//! - `uniform` packs per-frame uniform data with the required alignment

pub mod model;
pub mod scene;
pub mod targets;
pub mod texture;
pub mod transform;
pub mod uniform;
