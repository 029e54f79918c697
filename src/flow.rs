//! Application shell.
//!
//! `run` opens the window, builds an [`Engine`] once the event loop resumes and
//! then drives it frame by frame.
//!
//! # Lifecycle Flow
//!
//! 1. `resumed`: window, GPU context, programs, render targets, then the
//!    user's [`SceneSetup`] loads models and fills the scene.
//! 2. `window_event`: the debug GUI sees every event first; what it does
//!    not consume goes to the camera controller.
//! 3. `RedrawRequested`: frame update (hot reload, camera, uniforms, resize),
//!    GUI layout, then the render sequencer.
//! 4. `about_to_wait`: request the next redraw.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use futures::future::LocalBoxFuture;
use instant::Instant;
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::EngineConfig,
    context::Context,
    data_structures::scene::Scene,
    frame::FrameUpdater,
    gui::DebugGui,
    pipelines::program::ProgramRegistry,
    render::{RenderSettings, Renderer},
    resources::Resources,
};

/// Fills the scene once the GPU is ready.
pub type SceneSetup = for<'a> fn(&'a mut Engine) -> LocalBoxFuture<'a, anyhow::Result<()>>;

/// Everything a running frame touches.
pub struct Engine {
    pub ctx: Context,
    pub programs: ProgramRegistry,
    pub resources: Resources,
    pub scene: Scene,
    pub renderer: Renderer,
    pub updater: FrameUpdater,
    pub gui: DebugGui,
    pub settings: RenderSettings,
    last_frame: Instant,
}

impl Engine {
    pub async fn new(window: Arc<Window>, config: &EngineConfig) -> anyhow::Result<Self> {
        let gui = DebugGui::new(&window);
        let ctx = Context::new(window).await?;
        let shader_path: PathBuf = config.shader_path();

        let mut programs = ProgramRegistry::new();
        let renderer = Renderer::new(&ctx, &mut programs, &shader_path);
        log::info!(
            "Loaded {} programs from {}",
            programs.len(),
            shader_path.display()
        );

        let resources = Resources::new(&ctx.device, &ctx.queue, config.assets_dir.clone());
        let updater = FrameUpdater::new(config, ctx.display_size());
        Ok(Self {
            ctx,
            programs,
            resources,
            scene: Scene::new(),
            renderer,
            updater,
            gui,
            settings: config.render.clone(),
            last_frame: Instant::now(),
        })
    }

    /// Update, lay out the GUI and render one frame.
    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        self.updater.update(
            dt,
            &self.ctx,
            &mut self.programs,
            &mut self.renderer,
            &mut self.scene,
        );
        if !self.ctx.is_surface_configured() {
            return;
        }

        let gui = self.gui.run(
            &self.ctx.window,
            dt,
            &mut self.scene,
            &mut self.settings,
            &self.ctx.info,
        );
        let result = self.renderer.render(
            &self.ctx,
            &self.programs,
            &self.scene,
            &self.resources,
            &self.settings,
            Some(&gui),
        );
        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.ctx.window.inner_size();
                self.ctx.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {e}"),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, event: &WindowEvent) {
        if self.gui.on_window_event(&self.ctx.window, event) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.ctx.resize(size.width, size.height),
            WindowEvent::Focused(false) => self.updater.controller.reset(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Right,
                ..
            } => {
                let rotating = state.is_pressed() && !self.gui.wants_pointer();
                self.updater.controller.set_rotating(rotating);
            }
            WindowEvent::RedrawRequested => self.frame(),
            event => {
                self.updater.controller.handle_window_events(event);
            }
        }
    }
}

pub struct App {
    async_runtime: Runtime,
    config: EngineConfig,
    setup: SceneSetup,
    engine: Option<Engine>,
}

impl App {
    fn new(config: EngineConfig, setup: SceneSetup) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: Runtime::new().context("starting the tokio runtime")?,
            config,
            setup,
            engine: None,
        })
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Engine> {
        let window = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(window.title.as_str())
            .with_inner_size(PhysicalSize::new(window.width, window.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("creating the window")?,
        );

        let setup = self.setup;
        self.async_runtime.block_on(async {
            let mut engine = Engine::new(window, &self.config).await?;
            setup(&mut engine).await.context("scene setup")?;
            log::info!(
                "Scene ready: {} entities, {} lights",
                engine.scene.entities.len(),
                engine.scene.lights.len()
            );
            Ok::<_, anyhow::Error>(engine)
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(engine) => {
                engine.ctx.window.request_redraw();
                self.engine = Some(engine);
            }
            Err(e) => {
                log::error!("App initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(engine) = &mut self.engine {
            engine.window_event(event_loop, &event);
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let (Some(engine), DeviceEvent::MouseMotion { delta: (dx, dy) }) =
            (&mut self.engine, event)
        {
            engine.updater.controller.handle_mouse(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(engine) = &self.engine {
            engine.ctx.window.request_redraw();
        }
    }
}

/// Open the window and run until it is closed.
pub fn run(config: EngineConfig, setup: SceneSetup) -> anyhow::Result<()> {
    // A second call (or a test harness logger) is fine.
    let _ = env_logger::try_init();

    let event_loop = EventLoop::new().context("creating the event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(config, setup)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
