use shade_ngin::{
    config::EngineConfig,
    render::{DebugView, RenderMode},
};

#[test]
fn empty_json_gives_defaults() {
    let config = EngineConfig::from_json("{}").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.camera.position, [0.0, 1.0, 10.0]);
    assert_eq!(config.camera.fovy_degrees, 60.0);
    assert_eq!(config.camera.znear, 0.1);
    assert_eq!(config.camera.zfar, 1000.0);
    assert_eq!(config.render.mode, RenderMode::Deferred);
    assert!(!config.render.bloom.enabled);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = EngineConfig::from_json(
        r#"{ "hot_reload": false, "render": { "mode": "Forward", "bloom": { "threshold": 0.8 } } }"#,
    )
    .unwrap();
    assert!(!config.hot_reload);
    assert_eq!(config.render.mode, RenderMode::Forward);
    assert_eq!(config.render.view, DebugView::Color);
    assert_eq!(config.render.bloom.threshold, 0.8);
    assert_eq!(config.render.bloom.kernel_radius, 1.0);
    assert_eq!(config.window.width, 1280);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(EngineConfig::from_json("{ \"window\": 3 }").is_err());
    assert!(EngineConfig::from_json("not json").is_err());
}

#[test]
fn shipped_config_parses() {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/engine.json");
    let config = EngineConfig::load(&path).unwrap();
    assert!(config.render.bloom.enabled);
    assert_eq!(config.shader_file, "shaders.wgsl");
}

#[test]
fn shader_path_is_inside_assets_dir() {
    let mut config = EngineConfig::default();
    config.assets_dir = "/data/assets".into();
    config.shader_file = "custom.wgsl".to_string();
    assert_eq!(
        config.shader_path(),
        std::path::PathBuf::from("/data/assets/custom.wgsl")
    );
}
