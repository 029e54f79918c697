//! Free-fly camera.
//!
//! The camera is driven by yaw/pitch angles (right mouse drag) and a velocity
//! that WASD accelerates and that decays while no key is held. All of the math
//! is CPU-side so it can be exercised without a GPU.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, Zero, perspective};
use instant::Duration;
use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// wgpu clip space uses a 0..1 depth range while cgmath produces OpenGL's -1..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch is kept strictly inside ±`PITCH_LIMIT`.
pub const PITCH_LIMIT: f32 = PI / 2.1;
const PITCH_MARGIN: f32 = 1e-4;

/// Multiplier applied to the velocity on frames without movement input.
pub const SPEED_DECAY: f32 = 0.8;
pub const MAX_SPEED: f32 = 100.0;
/// Velocities shorter than this snap to zero.
pub const MIN_SPEED: f32 = 0.01;

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    /// Yaw in radians, always within `[0, TAU)`.
    pub yaw: f32,
    /// Pitch in radians, always strictly within `(-PITCH_LIMIT, PITCH_LIMIT)`.
    pub pitch: f32,
    pub speed: Vector3<f32>,
    pub right: Vector3<f32>,
    pub forward: Vector3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: 0.0,
            pitch: 0.0,
            speed: Vector3::zero(),
            right: Vector3::unit_x(),
            forward: -Vector3::unit_z(),
            up: Vector3::unit_y(),
        };
        camera.update_basis();
        camera
    }

    /// Add a mouse-driven rotation in radians and re-normalise the angles.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = wrap_yaw(self.yaw + delta_yaw);
        self.pitch = clamp_pitch(self.pitch + delta_pitch);
        self.update_basis();
    }

    /// Recompute right/forward/up from yaw and pitch.
    pub fn update_basis(&mut self) {
        let (sin_y, cos_y) = self.yaw.sin_cos();
        let (sin_p, cos_p) = self.pitch.sin_cos();
        self.right = Vector3::new(cos_y, 0.0, sin_y).normalize();
        self.forward = Vector3::new(cos_p * sin_y, sin_p, -cos_p * cos_y).normalize();
        self.up = self.right.cross(self.forward);
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward, self.up)
    }
}

/// Wrap an angle into `[0, TAU)`.
pub fn wrap_yaw(yaw: f32) -> f32 {
    let wrapped = yaw.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

pub fn clamp_pitch(pitch: f32) -> f32 {
    let limit = PITCH_LIMIT - PITCH_MARGIN;
    if pitch.is_nan() {
        return 0.0;
    }
    pitch.clamp(-limit, limit)
}

/// Apply one frame of acceleration, decay, capping and snapping to a velocity.
pub fn step_speed(speed: Vector3<f32>, acceleration: Option<Vector3<f32>>) -> Vector3<f32> {
    let speed = match acceleration {
        Some(acceleration) => speed + acceleration,
        None => speed * SPEED_DECAY,
    };
    let length = speed.magnitude();
    if length > MAX_SPEED {
        speed * (MAX_SPEED / length)
    } else if length < MIN_SPEED {
        Vector3::zero()
    } else {
        speed
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Which movement keys are currently held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Accumulates raw input between frames and applies it in [`CameraController::update`].
#[derive(Debug)]
pub struct CameraController {
    /// Degrees per pixel of mouse travel.
    sensitivity: f32,
    mouse_delta: (f32, f32),
    rotating: bool,
    pub keys: MoveKeys,
}

impl CameraController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            mouse_delta: (0.0, 0.0),
            rotating: false,
            keys: MoveKeys::default(),
        }
    }

    /// Mouse motion only rotates the camera while the right button is held.
    pub fn set_rotating(&mut self, rotating: bool) {
        self.rotating = rotating;
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if self.rotating {
            self.mouse_delta.0 += dx as f32;
            self.mouse_delta.1 += dy as f32;
        }
    }

    /// Track WASD. Returns whether the event was a movement key.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    ..
                },
            ..
        } = event
        else {
            return false;
        };
        self.process_key(*code, *state == ElementState::Pressed)
    }

    pub fn process_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        match code {
            KeyCode::KeyW => self.keys.forward = pressed,
            KeyCode::KeyS => self.keys.backward = pressed,
            KeyCode::KeyA => self.keys.left = pressed,
            KeyCode::KeyD => self.keys.right = pressed,
            _ => return false,
        }
        true
    }

    /// Release every key, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        self.keys = MoveKeys::default();
        self.rotating = false;
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let (dx, dy) = std::mem::take(&mut self.mouse_delta);
        let step = self.sensitivity * TAU / 360.0;
        camera.rotate(dx * step, -dy * step);

        let mut acceleration: Option<Vector3<f32>> = None;
        let mut accelerate = |direction: Vector3<f32>| {
            *acceleration.get_or_insert_with(Vector3::zero) += direction;
        };
        if self.keys.forward {
            accelerate(camera.forward);
        }
        if self.keys.backward {
            accelerate(-camera.forward);
        }
        if self.keys.right {
            accelerate(camera.right);
        }
        if self.keys.left {
            accelerate(-camera.right);
        }

        camera.speed = step_speed(camera.speed, acceleration);
        camera.position += camera.speed * dt.as_secs_f32();
    }
}
