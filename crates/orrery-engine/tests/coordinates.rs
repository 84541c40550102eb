use glam::DVec2;
use orrery_engine::render::{Projection, RecordingBackend, RenderMode, Renderer, RendererConfig};

fn renderer() -> Renderer<RecordingBackend> {
    let mut r = Renderer::new(RendererConfig::default(), RecordingBackend::new());
    r.register_render_mode("world", RenderMode::colored());
    r.init();
    r.resize_viewport(800, 600);
    r
}

fn close(a: DVec2, b: DVec2) -> bool {
    (a - b).length() < 1e-9
}

#[test]
fn screen_world_round_trip_under_camera_motion() {
    let mut r = renderer();
    let cam = r.camera_mut();
    cam.translate_to(DVec2::new(12.0, -3.0));
    cam.rotate_to(0.7);
    cam.zoom_to(2.5);

    for p in [DVec2::ZERO, DVec2::new(400.0, 300.0), DVec2::new(799.0, 17.0), DVec2::new(-50.0, 650.0)] {
        let w = r.screen_to_world(p);
        assert!(close(r.world_to_screen(w), p), "{p} -> {w}");
    }
}

#[test]
fn camera_position_maps_to_screen_center() {
    let mut r = renderer();
    r.camera_mut().translate_by(DVec2::new(5.0, 5.0));
    r.camera_mut().rotate_by(1.0);

    let pos = r.camera().position();
    assert!(close(r.world_to_screen(pos), DVec2::new(400.0, 300.0)));
}

#[test]
fn zoom_scales_resolution() {
    let mut r = renderer();
    let base = r.resolution_px_per_unit();
    assert!((base - 10.0).abs() < 1e-9);

    r.camera_mut().zoom_by(3.0);
    assert!((r.resolution_px_per_unit() - 30.0).abs() < 1e-9);

    // non-positive factors are rejected
    r.camera_mut().zoom_by(0.0);
    assert!((r.resolution_px_per_unit() - 30.0).abs() < 1e-9);
}

#[test]
fn resize_returns_to_world_space() {
    let mut r = renderer();
    r.setup_screen_space();
    assert_eq!(r.camera().projection(), Projection::Screen);

    r.resize_viewport(1024, 768);
    assert_eq!(r.camera().projection(), Projection::World);
    assert_eq!(r.camera().viewport().width_px, 1024);
}
