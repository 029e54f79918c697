//! Engine configuration.
//!
//! [`EngineConfig`] is read from JSON once at start-up. Every field has a
//! default, so a partial file (or none at all) is valid.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::render::RenderSettings;

/// Environment variable pointing at an explicit configuration file.
pub const CONFIG_ENV: &str = "SHADE_NGIN_CONFIG";

/// Name of the configuration file looked up inside the assets directory.
pub const CONFIG_FILE: &str = "engine.json";

// ── WindowConfig ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "shade-ngin".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

// ── CameraConfig ──────────────────────────────────────────────────────────────

/// Start pose and projection parameters of the free-fly camera.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    /// Degrees of rotation per pixel of mouse travel.
    pub sensitivity: f32,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.0, 10.0],
            sensitivity: 1.0,
            fovy_degrees: 60.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    /// Root for every relative asset path (models, textures, shaders).
    pub assets_dir: PathBuf,
    /// The shared WGSL file holding all shader programs, relative to `assets_dir`.
    pub shader_file: String,
    /// Poll the shader file every frame and recompile programs that changed.
    pub hot_reload: bool,
    pub camera: CameraConfig,
    pub render: RenderSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets_dir: default_assets_dir(),
            shader_file: "shaders.wgsl".to_string(),
            hot_reload: true,
            camera: CameraConfig::default(),
            render: RenderSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration file from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve the configuration the demo starts with.
    ///
    /// `$SHADE_NGIN_CONFIG` wins, then `<assets>/engine.json`, then defaults.
    /// A file that exists but cannot be parsed is logged and ignored.
    pub fn discover() -> Self {
        let candidate = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => default_assets_dir().join(CONFIG_FILE),
        };
        if !candidate.exists() {
            log::info!("No config at {}, using defaults", candidate.display());
            return Self::default();
        }
        match Self::load(&candidate) {
            Ok(config) => {
                log::info!("Loaded config from {}", candidate.display());
                config
            }
            Err(e) => {
                log::error!("{e:#}");
                Self::default()
            }
        }
    }

    /// Absolute (or cwd-relative) path of an asset.
    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.assets_dir.join(relative)
    }

    pub fn shader_path(&self) -> PathBuf {
        self.asset_path(&self.shader_file)
    }
}

fn default_assets_dir() -> PathBuf {
    match option_env!("SHADE_NGIN_ASSETS") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from("./assets"),
    }
}
