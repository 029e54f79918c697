use futures::future::LocalBoxFuture;
use shade_ngin::{
    cgmath::Vector3,
    config::EngineConfig,
    data_structures::{scene::Light, transform::Transform},
    flow::{self, Engine},
};

fn place(position: [f32; 3], scale: f32) -> Transform {
    Transform::from_position(position.into()).with_scale(Vector3::new(scale, scale, scale))
}

fn setup(engine: &mut Engine) -> LocalBoxFuture<'_, anyhow::Result<()>> {
    Box::pin(async move {
        let resources = &mut engine.resources;
        let plane = resources
            .load_model("plane.obj")
            .await
            .ok_or_else(|| anyhow::anyhow!("plane.obj did not load"))?;
        let cube = resources
            .load_model("cube.obj")
            .await
            .ok_or_else(|| anyhow::anyhow!("cube.obj did not load"))?;

        let scene = &mut engine.scene;
        let ground = Transform::new().with_scale(Vector3::new(25.0, 1.0, 25.0));
        scene.add_entity("Plane", plane, ground.to_matrix());
        scene.add_entity("Cube1", cube, place([4.3, 4.7, 5.2], 1.0).to_matrix());
        scene.add_entity("Cube2", cube, place([-3.3, 4.5, 5.0], 1.0).to_matrix());
        scene.add_entity("Cube3", cube, place([0.0, 6.7, 0.0], 1.5).to_matrix());

        let white = Vector3::new(1.0, 1.0, 1.0);
        scene.add_light(
            "Directional1",
            Light::directional(Vector3::new(0.0, 1.0, 0.0), white)
                .with_position(Vector3::new(0.0, 5.0, 0.0)),
        );
        scene.add_light("Point1", Light::point(Vector3::new(-1.0, 1.0, -1.5), white));
        scene.add_light("Point2", Light::point(Vector3::new(1.2, 1.1, 1.0), white));
        Ok(())
    })
}

fn main() -> anyhow::Result<()> {
    // Initialised here so config discovery is logged too.
    let _ = env_logger::try_init();
    flow::run(EngineConfig::discover(), setup)
}
