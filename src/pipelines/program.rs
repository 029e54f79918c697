//! Shader programs compiled from one shared WGSL file.
//!
//! The file holds every program. A program is selected by defining its name
//! plus `VERTEX` or `FRAGMENT` and running the file through [`preprocess`];
//! the result is prefixed with [`PRELUDE`], which declares the uniform blocks
//! the Rust side packs.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::SystemTime,
};

pub type ProgramId = usize;

pub const TEXTURED_GEOMETRY: &str = "TEXTURED_GEOMETRY";
pub const FORWARD_SHADING: &str = "FORWARD_SHADING";
pub const DEFERRED_GEOMETRY: &str = "DEFERRED_GEOMETRY";
pub const DEFERRED_LIGHTING: &str = "DEFERRED_LIGHTING";
pub const BRIGHTEST_PIXELS: &str = "BRIGHTEST_PIXELS";
pub const DOWNSAMPLE: &str = "DOWNSAMPLE";
pub const BLUR: &str = "BLUR";
pub const BLOOM: &str = "BLOOM";

/// Declarations shared by every program. Layouts must match
/// `data_structures::uniform` and `pipelines::post::PostParams`.
pub const PRELUDE: &str = r#"
const MAX_LIGHTS: u32 = 16u;
const LIGHT_DIRECTIONAL: u32 = 0u;
const LIGHT_POINT: u32 = 1u;

struct Light {
    kind: u32,
    color: vec3<f32>,
    direction: vec3<f32>,
    position: vec3<f32>,
}

struct GlobalParams {
    camera_position: vec3<f32>,
    light_count: u32,
    z_far: f32,
    lights: array<Light, 16>,
}

struct LocalParams {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}

struct PostParams {
    direction: vec2<f32>,
    texel_size: vec2<f32>,
    threshold: f32,
    kernel_radius: f32,
    level_count: u32,
    view_mode: u32,
    lod_intensity: array<vec4<f32>, 2>,
}
"#;

const VERTEX_DEFINE: &str = "VERTEX";
const FRAGMENT_DEFINE: &str = "FRAGMENT";

struct Block {
    /// Whether the enclosing block emits lines.
    parent_active: bool,
    condition: bool,
    seen_else: bool,
}

/**
 * Resolve `#define`, `#ifdef`, `#ifndef`, `#else` and `#endif`. Blocks nest.
 * Directive lines and lines of inactive blocks are replaced by empty lines so
 * compiler diagnostics keep the file's line numbers.
 */
pub fn preprocess(source: &str, defines: &[&str]) -> anyhow::Result<String> {
    let mut defined: HashSet<String> = defines.iter().map(|d| d.to_string()).collect();
    let mut stack: Vec<Block> = Vec::new();
    let mut out = String::with_capacity(source.len());

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let active = stack.last().is_none_or(|b| b.parent_active && b.condition);
        let trimmed = line.trim_start();
        let Some(directive) = trimmed.strip_prefix('#') else {
            if active {
                out.push_str(line);
            }
            out.push('\n');
            continue;
        };

        let mut words = directive.split_whitespace();
        let keyword = words.next().unwrap_or_default();
        let argument = words.next();
        match (keyword, argument) {
            ("define", Some(name)) => {
                if active {
                    defined.insert(name.to_string());
                }
            }
            ("ifdef", Some(name)) | ("ifndef", Some(name)) => {
                let is_defined = defined.contains(name);
                stack.push(Block {
                    parent_active: active,
                    condition: if keyword == "ifdef" { is_defined } else { !is_defined },
                    seen_else: false,
                });
            }
            ("else", _) => match stack.last_mut() {
                Some(block) if !block.seen_else => {
                    block.condition = !block.condition;
                    block.seen_else = true;
                }
                Some(_) => anyhow::bail!("line {line_number}: second #else in one block"),
                None => anyhow::bail!("line {line_number}: #else without #ifdef"),
            },
            ("endif", _) => {
                if stack.pop().is_none() {
                    anyhow::bail!("line {line_number}: #endif without #ifdef");
                }
            }
            _ => anyhow::bail!("line {line_number}: unknown directive '{}'", trimmed.trim_end()),
        }
        out.push('\n');
    }

    if !stack.is_empty() {
        anyhow::bail!("{} unterminated #ifdef block(s)", stack.len());
    }
    Ok(out)
}

/// One `@location(n)` input of a vertex entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexInput {
    pub location: u32,
    pub components: u32,
}

fn type_components(ty: &str) -> Option<u32> {
    let ty = ty.trim();
    if ty == "f32" {
        return Some(1);
    }
    ["vec2", "vec3", "vec4"]
        .iter()
        .position(|prefix| ty.starts_with(prefix))
        .map(|i| i as u32 + 2)
}

/// Read the `@location` fields of `struct VertexInput`, sorted by location.
/// A source without that struct takes no vertex inputs.
pub fn reflect_vertex_inputs(vertex_source: &str) -> Vec<VertexInput> {
    let Some(start) = vertex_source.find("struct VertexInput") else {
        return Vec::new();
    };
    let body = &vertex_source[start..];
    let (Some(open), Some(close)) = (body.find('{'), body.find('}')) else {
        return Vec::new();
    };
    if close < open {
        return Vec::new();
    }

    let mut inputs: Vec<VertexInput> = body[open + 1..close]
        .split(',')
        .filter_map(|field| {
            let rest = field.trim().strip_prefix("@location(")?;
            let (location, rest) = rest.split_once(')')?;
            let (_, ty) = rest.split_once(':')?;
            Some(VertexInput {
                location: location.trim().parse().ok()?,
                components: type_components(ty)?,
            })
        })
        .collect();
    inputs.sort_by_key(|input| input.location);
    inputs
}

pub fn file_timestamp(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[derive(Debug)]
pub struct ProgramModules {
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
}

#[derive(Debug)]
pub struct Program {
    pub name: String,
    pub path: PathBuf,
    /// Modification time of `path` when it was last compiled.
    pub last_write: Option<SystemTime>,
    pub vertex_inputs: Vec<VertexInput>,
    /// `None` until the program compiles once.
    pub modules: Option<ProgramModules>,
    /// Bumped on every successful (re)compilation.
    pub generation: u32,
}

impl Program {
    /// True when the file changed (or appeared) since the last compilation.
    pub fn is_stale(&self) -> bool {
        match (file_timestamp(&self.path), self.last_write) {
            (Some(now), Some(last)) => now > last,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn compile(&mut self, device: &wgpu::Device) -> anyhow::Result<()> {
        self.last_write = file_timestamp(&self.path);
        let source = std::fs::read_to_string(&self.path)?;
        if !source.contains(&format!("#ifdef {}", self.name)) {
            log::warn!("{} has no #ifdef {} block", self.path.display(), self.name);
        }
        let vertex_source = format!(
            "{PRELUDE}{}",
            preprocess(&source, &[self.name.as_str(), VERTEX_DEFINE])?
        );
        let fragment_source = format!(
            "{PRELUDE}{}",
            preprocess(&source, &[self.name.as_str(), FRAGMENT_DEFINE])?
        );

        let vertex = compile_module(device, &format!("{} vertex", self.name), &vertex_source)?;
        let fragment =
            compile_module(device, &format!("{} fragment", self.name), &fragment_source)?;

        self.vertex_inputs = reflect_vertex_inputs(&vertex_source);
        self.modules = Some(ProgramModules { vertex, fragment });
        self.generation += 1;
        Ok(())
    }
}

fn compile_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> anyhow::Result<wgpu::ShaderModule> {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let info = pollster::block_on(module.get_compilation_info());
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
        .map(|m| match &m.location {
            // The prelude sits in front of the file's first line.
            Some(location) => format!(
                "line {}: {}",
                location.line_number.saturating_sub(PRELUDE.lines().count() as u32),
                m.message
            ),
            None => m.message.clone(),
        })
        .collect();
    if errors.is_empty() {
        Ok(module)
    } else {
        anyhow::bail!("{label}: {}", errors.join("; "))
    }
}

#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: Vec<Program>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile program `name` from `path`. The id stays valid even when
    /// compilation fails; passes using a program without modules are skipped.
    pub fn load(&mut self, device: &wgpu::Device, path: &Path, name: &str) -> ProgramId {
        if let Some(id) = self
            .programs
            .iter()
            .position(|p| p.name == name && p.path == path)
        {
            return id;
        }
        let mut program = Program {
            name: name.to_string(),
            path: path.to_path_buf(),
            last_write: None,
            vertex_inputs: Vec::new(),
            modules: None,
            generation: 0,
        };
        match program.compile(device) {
            Ok(()) => log::info!("Compiled program {name}"),
            Err(e) => log::error!("Failed to compile program {name}: {e:#}"),
        }
        self.programs.push(program);
        self.programs.len() - 1
    }

    pub fn get(&self, id: ProgramId) -> Option<&Program> {
        self.programs.get(id)
    }

    pub fn find(&self, name: &str) -> Option<ProgramId> {
        self.programs.iter().position(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Recompile every program whose file changed. A failed recompilation
    /// keeps the previous modules. Returns the programs that were replaced.
    pub fn hot_reload(&mut self, device: &wgpu::Device) -> Vec<ProgramId> {
        let mut reloaded = Vec::new();
        for (id, program) in self.programs.iter_mut().enumerate() {
            if !program.is_stale() {
                continue;
            }
            match program.compile(device) {
                Ok(()) => {
                    log::info!("Reloaded program {}", program.name);
                    reloaded.push(id);
                }
                Err(e) => log::error!("Reloading {} failed: {e:#}", program.name),
            }
        }
        reloaded
    }
}
