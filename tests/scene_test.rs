use shade_ngin::{
    cgmath::{Matrix4, SquareMatrix, Vector3},
    data_structures::{
        scene::{Light, LightType, ObjectKind, Scene},
        transform::Transform,
    },
};

fn assert_vec_eq(a: Vector3<f32>, b: Vector3<f32>) {
    for (x, y) in [(a.x, b.x), (a.y, b.y), (a.z, b.z)] {
        assert!((x - y).abs() < 1e-3, "{a:?} != {b:?}");
    }
}

#[test]
fn transform_round_trips_through_matrix() {
    let transform = Transform::from_position(Vector3::new(4.3, 4.7, 5.2))
        .with_rotation(Vector3::new(30.0, -45.0, 60.0))
        .with_scale(Vector3::new(1.5, 2.0, 0.5));
    let back = Transform::from_matrix(&transform.to_matrix());
    assert_vec_eq(back.position, transform.position);
    assert_vec_eq(back.rotation, transform.rotation);
    assert_vec_eq(back.scale, transform.scale);
}

#[test]
fn translation_is_applied_last() {
    let m = Transform::from_position(Vector3::new(1.0, 0.0, 0.0))
        .with_scale(Vector3::new(25.0, 1.0, 25.0))
        .to_matrix();
    let corner = m * shade_ngin::cgmath::Vector4::new(1.0, 0.0, 1.0, 1.0);
    assert_eq!((corner.x, corner.z), (26.0, 25.0));
}

#[test]
fn identity_decomposes_to_defaults() {
    let t = Transform::from_matrix(&Matrix4::identity());
    assert_eq!(t, Transform::new());
}

#[test]
fn gimbal_lock_still_recomposes() {
    let transform = Transform::new().with_rotation(Vector3::new(20.0, 90.0, 0.0));
    let back = Transform::from_matrix(&transform.to_matrix());
    let (a, b) = (transform.to_matrix(), back.to_matrix());
    for (ca, cb) in [(a.x, b.x), (a.y, b.y), (a.z, b.z)] {
        assert_vec_eq(ca.truncate(), cb.truncate());
    }
}

#[test]
fn scene_objects_point_at_their_arrays() {
    let mut scene = Scene::new();
    let plane = scene.add_entity("Plane", 0, Matrix4::identity());
    let sun = scene.add_light(
        "Directional1",
        Light::directional(Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 1.0, 1.0)),
    );
    let cube = scene.add_entity(
        "Cube",
        1,
        Matrix4::from_translation(Vector3::new(0.0, 6.7, 0.0)),
    );

    assert_ne!(plane, sun);
    assert_ne!(sun, cube);
    assert_eq!(scene.object(sun).map(|o| o.kind), Some(ObjectKind::Light(0)));
    assert_eq!(scene.object(cube).map(|o| o.kind), Some(ObjectKind::Entity(1)));
    assert_eq!(scene.find("Cube").map(|o| o.id), Some(cube));
    assert!(scene.find("Nothing").is_none());

    assert_eq!(scene.world_matrix(cube).w.y, 6.7);
    assert_eq!(scene.world_matrix(sun), Matrix4::identity());
}

#[test]
fn edits_through_the_scene_reach_the_arrays() {
    let mut scene = Scene::new();
    let point = scene.add_light(
        "Point1",
        Light::point(Vector3::new(-1.0, 1.0, -1.5), Vector3::new(1.0, 1.0, 1.0)),
    );
    let Some(ObjectKind::Light(index)) = scene.object(point).map(|o| o.kind) else {
        panic!("light object expected");
    };
    let light = scene.light_mut(index).unwrap();
    assert_eq!(light.kind, LightType::Point);
    light.color = Vector3::new(0.0, 1.0, 0.0);
    assert_eq!(scene.lights[0].color, Vector3::new(0.0, 1.0, 0.0));
}

#[test]
fn light_types_match_shader_constants() {
    assert_eq!(LightType::Directional as u32, 0);
    assert_eq!(LightType::Point as u32, 1);
}
