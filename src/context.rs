use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

/// Adapter information shown in the debug GUI.
#[derive(Clone, Debug)]
pub struct GpuInfo {
    pub name: String,
    pub vendor: u32,
    pub device: u32,
    pub backend: String,
    pub driver: String,
    pub driver_info: String,
    pub features: String,
    pub max_texture_dimension_2d: u32,
    pub uniform_alignment: u32,
}

/// Window, surface and device. Everything else borrows from here.
#[derive(Debug)]
pub struct Context {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub info: GpuInfo,
    pub clear_colour: wgpu::Color,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("shade-ngin device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("requesting the GPU device")?;
        install_error_logger(&device);

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // All passes write linear colour; an sRGB surface does the encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let info = gpu_info(&adapter, &device);
        log::info!(
            "Running on {} ({}, {})",
            info.name,
            info.backend,
            info.driver
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            info,
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
            is_surface_configured: true,
        })
    }

    /// Reconfigure the surface. Zero sizes (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.is_surface_configured = true;
        } else {
            self.is_surface_configured = false;
        }
    }

    pub fn is_surface_configured(&self) -> bool {
        self.is_surface_configured
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Byte alignment every dynamically offset uniform block must honour.
    pub fn uniform_alignment(&self) -> u32 {
        self.info.uniform_alignment
    }
}

/// Route validation errors that are not caught by an error scope to the log.
pub fn install_error_logger(device: &wgpu::Device) {
    device.on_uncaptured_error(std::sync::Arc::new(|e| {
        log::error!("WGPU uncaptured error: {e}");
    }));
}

pub fn gpu_info(adapter: &wgpu::Adapter, device: &wgpu::Device) -> GpuInfo {
    let adapter_info = adapter.get_info();
    let limits = device.limits();
    GpuInfo {
        name: adapter_info.name,
        vendor: adapter_info.vendor,
        device: adapter_info.device,
        backend: format!("{:?}", adapter_info.backend),
        driver: adapter_info.driver,
        driver_info: adapter_info.driver_info,
        features: format!("{:?}", device.features()),
        max_texture_dimension_2d: limits.max_texture_dimension_2d,
        uniform_alignment: limits.min_uniform_buffer_offset_alignment,
    }
}
