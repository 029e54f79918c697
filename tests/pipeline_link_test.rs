use shade_ngin::{
    data_structures::model::{QuadVertex, VertexLayout},
    pipelines::{
        PipelineDesc, PipelineKey, link_vertex_layout, opaque_target, present::ADDITIVE,
        program::VertexInput,
    },
};

fn input(location: u32, components: u32) -> VertexInput {
    VertexInput { location, components }
}

#[test]
fn links_inputs_to_interleaved_attributes() {
    let layout = VertexLayout::default().with(0, 3).with(1, 3).with(2, 2);
    let attributes = link_vertex_layout(&[input(0, 3), input(2, 2)], &layout).unwrap();
    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes[0].shader_location, 0);
    assert_eq!(attributes[0].offset, 0);
    assert_eq!(attributes[0].format, wgpu::VertexFormat::Float32x3);
    assert_eq!(attributes[1].shader_location, 2);
    assert_eq!(attributes[1].offset, 24);
    assert_eq!(attributes[1].format, wgpu::VertexFormat::Float32x2);
}

#[test]
fn missing_attribute_fails_the_link() {
    let positions_only = VertexLayout::default().with(0, 3);
    let err = link_vertex_layout(&[input(0, 3), input(1, 3)], &positions_only).unwrap_err();
    assert!(err.to_string().contains("location 1"));
}

#[test]
fn screen_quad_layout_matches_its_vertex() {
    let layout = QuadVertex::layout();
    assert_eq!(layout.stride as usize, std::mem::size_of::<QuadVertex>());
    let attributes = link_vertex_layout(&[input(0, 3), input(1, 2)], &layout).unwrap();
    assert_eq!(attributes[1].offset, 12);
}

fn screen_desc(targets: &[Option<wgpu::ColorTargetState>]) -> PipelineDesc<'_> {
    PipelineDesc {
        label: "screen",
        bind_group_layouts: &[],
        targets,
        depth_format: None,
        topology: wgpu::PrimitiveTopology::TriangleStrip,
        cull_mode: None,
    }
}

#[test]
fn pipeline_key_tells_output_states_apart() {
    let layout = QuadVertex::layout();
    let format = wgpu::TextureFormat::Bgra8UnormSrgb;
    let replace = [Some(wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })];
    let additive = [Some(wgpu::ColorTargetState {
        format,
        blend: Some(ADDITIVE),
        write_mask: wgpu::ColorWrites::ALL,
    })];
    let hdr = [opaque_target(wgpu::TextureFormat::Rgba16Float)];

    let present = PipelineKey::new(0, 1, &layout, &screen_desc(&replace));
    assert_eq!(present, PipelineKey::new(0, 1, &layout, &screen_desc(&replace)));
    assert_ne!(present, PipelineKey::new(0, 1, &layout, &screen_desc(&additive)));
    assert_ne!(present, PipelineKey::new(0, 1, &layout, &screen_desc(&hdr)));
    assert_ne!(present, PipelineKey::new(0, 2, &layout, &screen_desc(&replace)));
    assert_eq!(
        present.targets,
        vec![Some((format, Some(wgpu::BlendState::REPLACE)))]
    );
}
