use shade_ngin::{
    data_structures::targets::{
        BLOOM_MAX_LEVELS, DisplaySizeTracker, TargetKind, bloom_level_count, bloom_level_size,
    },
    pipelines::post::PostParams,
    render::{
        BloomSettings, DebugView, FramePass, RenderMode, RenderSettings, frame_passes,
        post_params,
    },
};

fn bloom_on(mode: RenderMode) -> RenderSettings {
    RenderSettings {
        mode,
        bloom: BloomSettings {
            enabled: true,
            ..BloomSettings::default()
        },
        ..RenderSettings::default()
    }
}

#[test]
fn levels_halve_from_half_resolution() {
    let display = (1280, 720);
    assert_eq!(bloom_level_size(display, 0), (640, 360));
    assert_eq!(bloom_level_size(display, 1), (320, 180));
    assert_eq!(bloom_level_size(display, 4), (40, 22));
    assert_eq!(bloom_level_count(display), BLOOM_MAX_LEVELS);
}

#[test]
fn tiny_displays_get_shorter_chains() {
    assert_eq!(bloom_level_size((3, 3), 3), (1, 1));
    assert_eq!(bloom_level_count((4, 4)), 2);
    assert_eq!(bloom_level_count((1, 1)), 1);
}

#[test]
fn forward_without_bloom() {
    let settings = RenderSettings {
        mode: RenderMode::Forward,
        ..RenderSettings::default()
    };
    assert_eq!(
        frame_passes(&settings, 5),
        vec![FramePass::Forward, FramePass::Present, FramePass::Gui]
    );
}

#[test]
fn deferred_with_bloom_runs_the_whole_chain() {
    let passes = frame_passes(&bloom_on(RenderMode::Deferred), 3);
    assert_eq!(
        passes,
        vec![
            FramePass::DeferredGeometry,
            FramePass::DeferredLighting,
            FramePass::BrightPixels,
            FramePass::Downsample(1),
            FramePass::Downsample(2),
            FramePass::BlurHorizontal(0),
            FramePass::BlurVertical(0),
            FramePass::BlurHorizontal(1),
            FramePass::BlurVertical(1),
            FramePass::BlurHorizontal(2),
            FramePass::BlurVertical(2),
            FramePass::Present,
            FramePass::BloomComposite,
            FramePass::Gui,
        ]
    );
}

#[test]
fn composite_toggle_only_drops_the_composite() {
    let mut settings = bloom_on(RenderMode::Forward);
    settings.bloom.composite = false;
    let passes = frame_passes(&settings, 5);
    assert!(!passes.contains(&FramePass::BloomComposite));
    assert!(passes.contains(&FramePass::BlurVertical(4)));
    assert_eq!(passes.last(), Some(&FramePass::Gui));
}

#[test]
fn blur_directions_are_perpendicular() {
    let settings = bloom_on(RenderMode::Deferred);
    let h = post_params(FramePass::BlurHorizontal(0), &settings, (800, 600), 5).unwrap();
    let v = post_params(FramePass::BlurVertical(0), &settings, (800, 600), 5).unwrap();
    assert_eq!(h.direction, [1.0, 0.0]);
    assert_eq!(v.direction, [0.0, 1.0]);
    assert_eq!(h.kernel_radius, 1.0);
}

#[test]
fn scene_passes_take_no_parameters() {
    let settings = RenderSettings::default();
    for pass in [
        FramePass::Forward,
        FramePass::DeferredGeometry,
        FramePass::DeferredLighting,
        FramePass::Gui,
    ] {
        assert!(post_params(pass, &settings, (800, 600), 5).is_none());
    }
}

#[test]
fn composite_carries_intensities_and_texel_size() {
    let settings = bloom_on(RenderMode::Deferred);
    let params = post_params(FramePass::BloomComposite, &settings, (800, 400), 5).unwrap();
    assert_eq!(params.level_count, 5);
    assert_eq!(params.texel_size, [1.0 / 800.0, 1.0 / 400.0]);
    assert_eq!(params.lod_intensity[0], [1.0, 0.8, 0.6, 0.4]);
    assert_eq!(params.lod_intensity[1][0], 0.2);
}

#[test]
fn present_view_mode_falls_back_to_colour_in_forward() {
    let mut settings = RenderSettings {
        view: DebugView::Normal,
        ..RenderSettings::default()
    };
    let deferred = post_params(FramePass::Present, &settings, (800, 600), 5).unwrap();
    assert_eq!(deferred.view_mode, DebugView::Normal.view_mode());

    settings.mode = RenderMode::Forward;
    assert_eq!(settings.effective_view(), DebugView::Color);
    let forward = post_params(FramePass::Present, &settings, (800, 600), 5).unwrap();
    assert_eq!(forward.view_mode, DebugView::Color.view_mode());
}

#[test]
fn debug_views_map_to_targets() {
    assert_eq!(DebugView::Color.target(), TargetKind::Color);
    assert_eq!(DebugView::Depth.target(), TargetKind::Depth);
    assert_eq!(DebugView::Albedo.target(), TargetKind::Albedo);
    assert_eq!(DebugView::Normal.target(), TargetKind::Normal);
    assert_eq!(DebugView::Position.target(), TargetKind::Position);
}

#[test]
fn post_params_fill_one_uniform_slot() {
    assert_eq!(PostParams::SIZE, 64);
    let params = PostParams::default().with_intensities(&[0.5; 10]);
    assert_eq!(params.lod_intensity, [[0.5; 4]; 2]);
}

#[test]
fn size_tracker_reports_each_change_once() {
    let mut tracker = DisplaySizeTracker::new((800, 600));
    assert!(!tracker.changed((800, 600)));
    assert!(tracker.changed((1024, 768)));
    assert!(!tracker.changed((1024, 768)));
    assert!(!tracker.changed((0, 768)));
    assert_eq!(tracker.last(), (1024, 768));
}
