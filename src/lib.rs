//! shade-ngin
//!
//! A small wgpu renderer that draws a scene of entities and lights with either
//! forward or deferred shading, followed by an optional bloom post-process over
//! a five level mip chain. Shader programs live in one WGSL file, are selected by
//! preprocessor defines and are hot-reloaded when the file changes. An egui
//! overlay exposes the render switches and per-object editing.
//!
//! High-level modules
//! - `camera`: free-fly camera, its input controller and the projection
//! - `config`: JSON configuration for the window, assets and initial settings
//! - `context`: central GPU and window context that owns device/queue/surface
//! - `data_structures`: meshes, materials, textures, render targets, the scene and uniform packing
//! - `flow`: winit event loop driving update and render once per frame
//! - `frame`: the per-frame updater (hot reload, camera, uniforms, resize)
//! - `gui`: the debug panels (scene, hierarchy, inspector, info)
//! - `pipelines`: shader program registry, pipeline cache and the individual passes
//! - `render`: the render sequencer issuing the ordered passes of a frame
//! - `resources`: helpers to load textures/models and create GPU resources
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod frame;
pub mod gui;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit;
