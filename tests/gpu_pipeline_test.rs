#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn every_shipped_program_compiles_and_links() {
    use shade_ngin::{
        data_structures::{
            model::{QuadVertex, VertexLayout, mk_quad_buffer},
            targets::{BLOOM_FORMAT, COLOR_FORMAT, GBUFFER_FORMATS},
            texture::Texture,
        },
        pipelines::{
            PipelineCache, PipelineDesc, deferred::mk_gbuffer_layout, mk_globals_layout,
            mk_locals_layout, opaque_target,
            post::{PostDraw, mk_composite_layout, mk_post_layout},
            program::{
                BLOOM, BLUR, BRIGHTEST_PIXELS, DEFERRED_GEOMETRY, DEFERRED_LIGHTING, DOWNSAMPLE,
                FORWARD_SHADING, ProgramRegistry, TEXTURED_GEOMETRY,
            },
        },
        resources::texture::mk_material_layout,
    };

    use crate::common::test_utils::{headless_device, shader_path};

    let Some((device, _queue)) = headless_device() else {
        eprintln!("no adapter, skipping");
        return;
    };
    let path = shader_path();
    let mut programs = ProgramRegistry::new();
    let ids: Vec<_> = [
        TEXTURED_GEOMETRY,
        FORWARD_SHADING,
        DEFERRED_GEOMETRY,
        DEFERRED_LIGHTING,
        BRIGHTEST_PIXELS,
        DOWNSAMPLE,
        BLUR,
        BLOOM,
    ]
    .into_iter()
    .map(|name| (name, programs.load(&device, &path, name)))
    .collect();
    for (name, id) in &ids {
        let program = programs.get(*id).unwrap();
        assert!(program.modules.is_some(), "{name} failed to compile");
        assert_eq!(program.generation, 1);
    }
    // Loading twice hands back the same program.
    assert_eq!(programs.load(&device, &path, BLUR), ids[6].1);
    assert_eq!(programs.len(), 8);

    let mut pipelines = PipelineCache::new();
    let globals = mk_globals_layout(&device);
    let locals = mk_locals_layout(&device);
    let material = mk_material_layout(&device);
    let gbuffer = mk_gbuffer_layout(&device);
    let post = mk_post_layout(&device);
    let composite = mk_composite_layout(&device);

    let mesh_layout = VertexLayout::default().with(0, 3).with(1, 3).with(2, 2);
    let forward_targets = [opaque_target(COLOR_FORMAT)];
    let gbuffer_targets = GBUFFER_FORMATS.map(opaque_target);
    for (program, targets) in [
        (FORWARD_SHADING, &forward_targets[..]),
        (DEFERRED_GEOMETRY, &gbuffer_targets[..]),
    ] {
        let id = programs.find(program).unwrap();
        let pipeline = pipelines.get_or_create(
            &device,
            &programs,
            id,
            &mesh_layout,
            &PipelineDesc {
                label: program,
                bind_group_layouts: &[&globals, &locals, &material],
                targets,
                depth_format: Some(Texture::DEPTH_FORMAT),
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
            },
        );
        assert!(pipeline.is_some(), "{program}");
    }

    let quad = mk_quad_buffer(&device);
    let draw = PostDraw {
        device: &device,
        programs: &programs,
        quad: &quad,
    };
    let screen: [(&str, Vec<&wgpu::BindGroupLayout>, wgpu::TextureFormat); 6] = [
        (DEFERRED_LIGHTING, vec![&globals, &gbuffer], COLOR_FORMAT),
        (BRIGHTEST_PIXELS, vec![&post], BLOOM_FORMAT),
        (DOWNSAMPLE, vec![&post], BLOOM_FORMAT),
        (BLUR, vec![&post], BLOOM_FORMAT),
        (TEXTURED_GEOMETRY, vec![&post], wgpu::TextureFormat::Bgra8UnormSrgb),
        (BLOOM, vec![&composite], wgpu::TextureFormat::Bgra8UnormSrgb),
    ];
    for (program, layouts, format) in &screen {
        let id = programs.find(program).unwrap();
        let pipeline = draw.pipeline(&mut pipelines, id, program, layouts, *format, None);
        assert!(pipeline.is_some(), "{program}");
    }

    // A mesh without normals cannot feed the shading programs.
    let positions_only = VertexLayout::default().with(0, 3);
    let forward = programs.find(FORWARD_SHADING).unwrap();
    let before = pipelines.len();
    let desc = PipelineDesc {
        label: "positions only",
        bind_group_layouts: &[&globals, &locals, &material],
        targets: &forward_targets,
        depth_format: Some(Texture::DEPTH_FORMAT),
        topology: wgpu::PrimitiveTopology::TriangleList,
        cull_mode: None,
    };
    assert!(pipelines.get_or_create(&device, &programs, forward, &positions_only, &desc).is_none());
    assert_eq!(pipelines.len(), before + 1);
    assert_eq!(QuadVertex::layout().attributes.len(), 2);

    pipelines.invalidate(forward);
    assert!(pipelines.len() < before + 1);
}

#[test]
#[cfg(feature = "integration-tests")]
fn resizing_rebuilds_targets_and_keeps_the_scene() {
    use shade_ngin::{
        cgmath::{Matrix4, SquareMatrix, Vector3},
        data_structures::{
            scene::{Light, Scene},
            targets::{bloom_level_count, bloom_level_size},
        },
        pipelines::program::ProgramRegistry,
        render::Renderer,
    };

    use crate::common::test_utils::{headless_device, shader_path};

    let Some((device, _queue)) = headless_device() else {
        eprintln!("no adapter, skipping");
        return;
    };
    let alignment = device.limits().min_uniform_buffer_offset_alignment;
    let mut programs = ProgramRegistry::new();
    let mut renderer = Renderer::with_device(
        &device,
        wgpu::TextureFormat::Bgra8UnormSrgb,
        (1280, 720),
        alignment,
        &mut programs,
        &shader_path(),
    );
    assert_eq!(renderer.targets.size, (1280, 720));
    assert_eq!(renderer.bloom_chain.levels, bloom_level_count((1280, 720)));

    let mut scene = Scene::new();
    scene.add_entity("Cube", 0, Matrix4::identity());
    let white = Vector3::new(1.0, 1.0, 1.0);
    scene.add_light("Sun", Light::directional(Vector3::new(0.0, 1.0, 0.0), white));
    scene.add_light("Lamp", Light::point(Vector3::new(1.0, 1.0, 1.0), white));
    let lights_before = scene.lights.clone();

    let resized = (300, 200);
    renderer.rebuild_targets(&device, resized);

    assert_eq!(renderer.targets.size, resized);
    let color = renderer.targets.color.texture.size();
    assert_eq!((color.width, color.height), resized);
    let depth = renderer.targets.depth_attachment.texture.size();
    assert_eq!((depth.width, depth.height), resized);

    let chain = &renderer.bloom_chain;
    assert_eq!(chain.levels, bloom_level_count(resized));
    assert_eq!(chain.bright.texture.mip_level_count(), chain.levels);
    assert_eq!(chain.bright_levels.len(), chain.levels as usize);
    assert_eq!(chain.blurred_levels.len(), chain.levels as usize);
    for level in 0..chain.levels {
        let extent = chain
            .bright
            .texture
            .size()
            .mip_level_size(level, wgpu::TextureDimension::D2);
        assert_eq!((extent.width, extent.height), bloom_level_size(resized, level));
    }

    assert_eq!(scene.entities.len(), 1);
    assert_eq!(scene.lights, lights_before);
}
