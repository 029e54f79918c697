use shade_ngin::{gui::FpsCounter, pipelines::gui::GuiFrame};

#[test]
fn fps_updates_once_per_second() {
    let mut fps = FpsCounter::default();
    let frame = instant::Duration::from_millis(250);
    for _ in 0..3 {
        assert_eq!(fps.tick(frame), 0.0);
    }
    assert_eq!(fps.tick(frame), 4.0);
    assert_eq!(fps.fps(), 4.0);
}

#[test]
fn fps_holds_the_last_average_between_updates() {
    let mut fps = FpsCounter::default();
    fps.tick(instant::Duration::from_millis(500));
    assert_eq!(fps.tick(instant::Duration::from_millis(500)), 2.0);
    assert_eq!(fps.tick(instant::Duration::from_millis(100)), 2.0);
}

#[test]
fn screen_descriptor_uses_the_frame_size_and_scale() {
    let frame = GuiFrame {
        pixels_per_point: 1.5,
        size_in_pixels: [1920, 1080],
        ..Default::default()
    };
    let screen = frame.screen_descriptor();
    assert_eq!(screen.size_in_pixels, [1920, 1080]);
    assert_eq!(screen.pixels_per_point, 1.5);
}
