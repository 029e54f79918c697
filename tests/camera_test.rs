use std::f32::consts::{PI, TAU};

use shade_ngin::{
    camera::{
        Camera, CameraController, MAX_SPEED, PITCH_LIMIT, Projection, SPEED_DECAY, clamp_pitch,
        step_speed, wrap_yaw,
    },
    cgmath::{Deg, InnerSpace, Vector3, Zero},
    winit::keyboard::KeyCode,
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn yaw_wraps_into_one_turn() {
    assert!(approx(wrap_yaw(TAU + 0.5), 0.5));
    assert!(approx(wrap_yaw(-0.5), TAU - 0.5));
    assert_eq!(wrap_yaw(0.0), 0.0);
    for yaw in [-100.0, -TAU, -1e-9, 3.0 * TAU, 1234.5] {
        let wrapped = wrap_yaw(yaw);
        assert!((0.0..TAU).contains(&wrapped), "{yaw} wrapped to {wrapped}");
    }
}

#[test]
fn pitch_stays_strictly_inside_limit() {
    assert!(clamp_pitch(10.0) < PITCH_LIMIT);
    assert!(clamp_pitch(-10.0) > -PITCH_LIMIT);
    assert_eq!(clamp_pitch(0.3), 0.3);
    assert_eq!(clamp_pitch(f32::NAN), 0.0);
}

#[test]
fn rotating_keeps_basis_orthonormal() {
    let mut camera = Camera::new([0.0, 1.0, 10.0]);
    camera.rotate(0.7, 0.4);
    camera.rotate(-3.0, 5.0);
    assert!(camera.pitch < PITCH_LIMIT);
    assert!((0.0..TAU).contains(&camera.yaw));
    assert!(approx(camera.forward.magnitude(), 1.0));
    assert!(approx(camera.right.magnitude(), 1.0));
    assert!(approx(camera.forward.dot(camera.right), 0.0));
    assert!(approx(camera.up.dot(camera.forward), 0.0));
}

#[test]
fn new_camera_looks_down_negative_z() {
    let camera = Camera::new([0.0, 1.0, 10.0]);
    assert!(approx(camera.forward.z, -1.0));
    assert!(approx(camera.right.x, 1.0));
    assert!(approx(camera.up.y, 1.0));
}

#[test]
fn speed_decays_and_snaps_to_zero() {
    let speed = Vector3::new(1.0, 0.0, 0.0);
    let decayed = step_speed(speed, None);
    assert!(approx(decayed.x, SPEED_DECAY));

    let tiny = Vector3::new(0.005, 0.0, 0.0);
    assert_eq!(step_speed(tiny, None), Vector3::zero());
}

#[test]
fn speed_is_capped() {
    let speed = Vector3::new(MAX_SPEED, 0.0, 0.0);
    let faster = step_speed(speed, Some(Vector3::new(50.0, 50.0, 0.0)));
    assert!(approx(faster.magnitude(), MAX_SPEED));
}

#[test]
fn held_key_moves_camera_forward() {
    let mut camera = Camera::new([0.0, 0.0, 0.0]);
    let mut controller = CameraController::new(1.0);
    assert!(controller.process_key(KeyCode::KeyW, true));
    assert!(!controller.process_key(KeyCode::KeyQ, true));

    controller.update(&mut camera, instant::Duration::from_millis(100));
    assert!(camera.position.z < 0.0);

    controller.process_key(KeyCode::KeyW, false);
    let before = camera.speed.magnitude();
    controller.update(&mut camera, instant::Duration::from_millis(100));
    assert!(camera.speed.magnitude() < before);
}

#[test]
fn mouse_only_rotates_while_dragging() {
    let mut camera = Camera::new([0.0, 0.0, 0.0]);
    let mut controller = CameraController::new(1.0);
    controller.handle_mouse(90.0, 0.0);
    controller.update(&mut camera, instant::Duration::from_millis(16));
    assert_eq!(camera.yaw, 0.0);

    controller.set_rotating(true);
    controller.handle_mouse(90.0, 0.0);
    controller.update(&mut camera, instant::Duration::from_millis(16));
    // One degree per pixel.
    assert!(approx(camera.yaw, PI / 2.0));
}

#[test]
fn reset_releases_keys_and_drag() {
    let mut controller = CameraController::new(1.0);
    controller.set_rotating(true);
    controller.process_key(KeyCode::KeyD, true);
    controller.reset();
    assert!(!controller.is_rotating());

    let mut camera = Camera::new([0.0, 0.0, 0.0]);
    controller.update(&mut camera, instant::Duration::from_millis(100));
    assert_eq!(camera.speed, Vector3::zero());
}

#[test]
fn projection_maps_near_and_far_to_wgpu_depth() {
    let projection = Projection::new(800, 600, Deg(60.0), 0.1, 1000.0);
    assert_eq!(projection.zfar(), 1000.0);
    let m = projection.calc_matrix();
    let near = m * shade_ngin::cgmath::Vector4::new(0.0, 0.0, -0.1, 1.0);
    let far = m * shade_ngin::cgmath::Vector4::new(0.0, 0.0, -1000.0, 1.0);
    assert!(approx(near.z / near.w, 0.0));
    assert!(approx(far.z / far.w, 1.0));
}
