//! Debug panels: render switches, the scene hierarchy, an inspector that
//! edits entities and lights in place, and adapter information.

use cgmath::Vector3;
use winit::{event::WindowEvent, window::Window};

use crate::{
    context::GpuInfo,
    data_structures::{
        scene::{LightType, ObjectId, ObjectKind, Scene},
        transform::Transform,
    },
    pipelines::gui::GuiFrame,
    render::{DebugView, RenderMode, RenderSettings},
};

/// Frames per second, averaged over roughly one second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FpsCounter {
    frames: u32,
    elapsed: f32,
    fps: f32,
}

impl FpsCounter {
    pub fn tick(&mut self, dt: instant::Duration) -> f32 {
        self.frames += 1;
        self.elapsed += dt.as_secs_f32();
        if self.elapsed >= 1.0 {
            self.fps = self.frames as f32 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
        }
        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

pub struct DebugGui {
    ctx: egui::Context,
    state: egui_winit::State,
    selected: Option<ObjectId>,
    fps: FpsCounter,
}

impl DebugGui {
    pub fn new(window: &Window) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        Self {
            ctx,
            state,
            selected: None,
            fps: FpsCounter::default(),
        }
    }

    /// Feed a window event to egui. Returns true when egui used it and it
    /// must not reach the camera.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Whether the pointer is over a panel or egui is dragging something.
    pub fn wants_pointer(&self) -> bool {
        self.ctx.is_pointer_over_area() || self.ctx.wants_pointer_input()
    }

    /// Build this frame's panels and tessellate them.
    pub fn run(
        &mut self,
        window: &Window,
        dt: instant::Duration,
        scene: &mut Scene,
        settings: &mut RenderSettings,
        info: &GpuInfo,
    ) -> GuiFrame {
        let fps = self.fps.tick(dt);
        let raw_input = self.state.take_egui_input(window);
        let ctx = self.ctx.clone();
        let selected = &mut self.selected;
        let output = ctx.run(raw_input, |ctx| {
            scene_window(ctx, settings);
            hierarchy_window(ctx, scene, selected);
            inspector_window(ctx, scene, *selected);
            info_window(ctx, fps, info);
        });
        self.state
            .handle_platform_output(window, output.platform_output);

        let size = window.inner_size();
        GuiFrame {
            primitives: ctx.tessellate(output.shapes, output.pixels_per_point),
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
            size_in_pixels: [size.width, size.height],
        }
    }
}

fn scene_window(ctx: &egui::Context, settings: &mut RenderSettings) {
    egui::Window::new("Scene").show(ctx, |ui| {
        egui::ComboBox::from_label("Render Mode")
            .selected_text(settings.mode.label())
            .show_ui(ui, |ui| {
                for mode in RenderMode::ALL {
                    ui.selectable_value(&mut settings.mode, mode, mode.label());
                }
            });
        ui.add_enabled_ui(settings.mode == RenderMode::Deferred, |ui| {
            egui::ComboBox::from_label("Render Type")
                .selected_text(settings.view.label())
                .show_ui(ui, |ui| {
                    for view in DebugView::ALL {
                        ui.selectable_value(&mut settings.view, view, view.label());
                    }
                });
        });

        ui.separator();
        let bloom = &mut settings.bloom;
        ui.checkbox(&mut bloom.enabled, "Active Bloom");
        ui.add_enabled_ui(bloom.enabled, |ui| {
            ui.add(egui::Slider::new(&mut bloom.threshold, 0.0..=1.0).text("Threshold"));
            ui.add(egui::Slider::new(&mut bloom.kernel_radius, 0.0..=4.0).text("Kernel Radius"));
            ui.checkbox(&mut bloom.composite, "Composite");
            ui.add_enabled_ui(bloom.composite, |ui| {
                for (level, intensity) in bloom.lod_intensity.iter_mut().enumerate() {
                    ui.add(
                        egui::Slider::new(intensity, 0.0..=2.0).text(format!("Level {level}")),
                    );
                }
            });
        });
    });
}

fn hierarchy_window(ctx: &egui::Context, scene: &Scene, selected: &mut Option<ObjectId>) {
    egui::Window::new("Hierarchy").show(ctx, |ui| {
        for object in &scene.objects {
            let is_selected = *selected == Some(object.id);
            if ui.selectable_label(is_selected, object.name.as_str()).clicked() {
                *selected = Some(object.id);
            }
        }
    });
}

fn vec3_editor(ui: &mut egui::Ui, label: &str, value: &mut Vector3<f32>, speed: f32) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut changed = false;
        for component in [&mut value.x, &mut value.y, &mut value.z] {
            changed |= ui.add(egui::DragValue::new(component).speed(speed)).changed();
        }
        changed
    })
    .inner
}

fn inspector_window(ctx: &egui::Context, scene: &mut Scene, selected: Option<ObjectId>) {
    egui::Window::new("Inspector").show(ctx, |ui| {
        let Some(object) = selected.and_then(|id| scene.object(id)).cloned() else {
            ui.label("Select an object in the hierarchy.");
            return;
        };
        ui.label(object.name.as_str());

        match object.kind {
            ObjectKind::Entity(index) => {
                let Some(entity) = scene.entity_mut(index) else {
                    return;
                };
                let mut transform = Transform::from_matrix(&entity.world_matrix);
                egui::CollapsingHeader::new("Transform")
                    .default_open(true)
                    .show(ui, |ui| {
                        let mut changed = vec3_editor(ui, "Position", &mut transform.position, 0.1);
                        changed |= vec3_editor(ui, "Rotation", &mut transform.rotation, 1.0);
                        changed |= vec3_editor(ui, "Scale", &mut transform.scale, 0.05);
                        if changed {
                            entity.world_matrix = transform.to_matrix();
                        }
                    });
            }
            ObjectKind::Light(index) => {
                let Some(light) = scene.light_mut(index) else {
                    return;
                };
                egui::CollapsingHeader::new("Transform")
                    .default_open(true)
                    .show(ui, |ui| {
                        vec3_editor(ui, "Position", &mut light.position, 0.1);
                        if light.kind == LightType::Directional {
                            vec3_editor(ui, "Direction", &mut light.direction, 0.05);
                        }
                    });
                let mut color: [f32; 3] = light.color.into();
                ui.horizontal(|ui| {
                    ui.label("Color");
                    if ui.color_edit_button_rgb(&mut color).changed() {
                        light.color = color.into();
                    }
                });
            }
        }
    });
}

fn info_window(ctx: &egui::Context, fps: f32, info: &GpuInfo) {
    egui::Window::new("Info").show(ctx, |ui| {
        ui.label(format!("FPS: {fps:.1}"));
        ui.separator();
        ui.label(format!("Adapter: {}", info.name));
        ui.label(format!("Vendor: {:#06x}  Device: {:#06x}", info.vendor, info.device));
        ui.label(format!("Backend: {}", info.backend));
        ui.label(format!("Driver: {} {}", info.driver, info.driver_info));
        ui.label(format!("Max texture size: {}", info.max_texture_dimension_2d));
        ui.label(format!("Uniform alignment: {}", info.uniform_alignment));
        egui::CollapsingHeader::new("Features").show(ui, |ui| {
            ui.label(info.features.as_str());
        });
    });
}
