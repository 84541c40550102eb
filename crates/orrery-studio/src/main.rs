//! Orrery studio: a small orbital scene exercising the batched renderer.
//!
//! Keys: arrows pan, `+`/`-` zoom, `q`/`e` rotate, `r` resets the camera.

use std::collections::VecDeque;
use std::time::Instant;

use anyhow::Result;
use glam::DVec2;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use orrery_engine::core::{App, AppControl, FrameCtx};
use orrery_engine::device::GpuInit;
use orrery_engine::logging::{init_logging, LoggingConfig};
use orrery_engine::paint::Color;
use orrery_engine::render::{LineKind, RenderMode, RenderModeId, Renderer, FULL_QUAD_UV, WgpuBackend};
use orrery_engine::window::{Runtime, RuntimeConfig};

const TRAIL_LEN: usize = 240;
const ORBIT_SEGMENTS: usize = 96;
const STATS_EVERY: u64 = 300;

struct Body {
    name: &'static str,
    orbit: f64,
    radius: f64,
    /// radians per second
    rate: f64,
    color: Color,
    trail: VecDeque<DVec2>,
}

impl Body {
    fn new(name: &'static str, orbit: f64, radius: f64, rate: f64, color: Color) -> Self {
        Self { name, orbit, radius, rate, color, trail: VecDeque::with_capacity(TRAIL_LEN) }
    }

    fn position(&self, t: f64) -> DVec2 {
        DVec2::from_angle(t * self.rate) * self.orbit
    }

    fn velocity(&self, t: f64) -> DVec2 {
        DVec2::from_angle(t * self.rate).perp() * self.orbit * self.rate
    }
}

#[derive(Default, Clone, Copy)]
struct CameraInput {
    pan: DVec2,
    zoom: f64,
    spin: f64,
    reset: bool,
}

struct Studio {
    started: Instant,
    frame: u64,
    bodies: Vec<Body>,
    input: CameraInput,
    world: Option<RenderModeId>,
    hud: Option<RenderModeId>,
}

impl Studio {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            frame: 0,
            bodies: vec![
                Body::new("mercury", 6.0, 0.4, 1.6, Color::from_u8(180, 170, 160, 255)),
                Body::new("venus", 10.0, 0.8, 1.1, Color::from_u8(230, 190, 120, 255)),
                Body::new("earth", 15.0, 0.9, 0.8, Color::from_u8(80, 140, 230, 255)),
                Body::new("mars", 21.0, 0.6, 0.55, Color::from_u8(220, 90, 60, 255)),
            ],
            input: CameraInput::default(),
            world: None,
            hud: None,
        }
    }

    fn draw(&mut self, r: &mut Renderer<WgpuBackend>, t: f64) {
        let (Some(world), Some(hud)) = (self.world, self.hud) else { return };

        let input = std::mem::take(&mut self.input);
        let cam = r.camera_mut();
        if input.reset {
            cam.reset();
        }
        cam.translate_by(input.pan);
        if input.zoom != 0.0 {
            cam.zoom_by(input.zoom);
        }
        cam.rotate_by(input.spin);
        r.setup_world_space();

        r.begin_render_batch(world);

        // orbits
        r.set_color(Color::rgba(1.0, 1.0, 1.0, 0.15));
        for body in &self.bodies {
            r.circle(DVec2::ZERO, body.orbit, ORBIT_SEGMENTS, true);
        }

        // sun
        r.set_color(Color::from_u8(255, 210, 90, 255));
        r.filled_circle(DVec2::ZERO, 2.5, ORBIT_SEGMENTS, true);
        r.set_color(Color::from_u8(255, 240, 180, 255));
        r.circle_dyn(DVec2::ZERO, 2.5);

        for body in &mut self.bodies {
            let p = body.position(t);
            if body.trail.len() == TRAIL_LEN {
                body.trail.pop_front();
            }
            body.trail.push_back(p);

            r.set_color(body.color);
            let trail: Vec<DVec2> = body.trail.iter().copied().collect();
            r.dots(&trail, DVec2::ZERO);
            r.filled_circle(p, body.radius, 24, false);

            r.set_color(Color::rgba(0.6, 1.0, 0.6, 0.8));
            r.show_vec(body.velocity(t) * 0.5, p);
        }

        // a swept sector around earth's orbit
        r.set_color(Color::rgba(0.5, 0.7, 1.0, 0.5));
        let a = t * 0.8;
        r.arc_dyn(DVec2::ZERO, 15.0 + 1.5, a - 0.6, a + 0.6);

        // frame marker in world units
        r.set_color(Color::rgba(1.0, 1.0, 1.0, 0.3));
        r.polygon(
            &[DVec2::new(-25.0, -25.0), DVec2::new(25.0, -25.0), DVec2::new(25.0, 25.0), DVec2::new(-25.0, 25.0)],
            LineKind::Loop,
            DVec2::ZERO,
        );

        r.end_render_batch();

        // screen-space overlay: a textured legend swatch per body
        r.setup_screen_space();
        r.begin_render_batch(hud);
        for (i, body) in self.bodies.iter().enumerate() {
            let y = 16.0 + i as f64 * 22.0;
            r.set_color(body.color);
            r.textured_rect(DVec2::new(16.0, y + 16.0), DVec2::new(32.0, y), &FULL_QUAD_UV);
        }
        r.end_render_batch();
        r.setup_world_space();
    }
}

impl App for Studio {
    fn setup(&mut self, _window_id: WindowId, renderer: &mut Renderer<WgpuBackend>) {
        self.world = Some(renderer.register_render_mode("world", RenderMode::colored()));
        self.hud = Some(renderer.register_render_mode("hud", RenderMode::textured()));
        renderer.cache_sin_cos(ORBIT_SEGMENTS);

        // 4x4 checker for the legend swatches
        let mut pixels = Vec::with_capacity(4 * 4 * 4);
        for y in 0..4 {
            for x in 0..4 {
                let v = if (x + y) % 2 == 0 { 255 } else { 170 };
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let backend = renderer.backend_mut();
        let checker = backend.create_texture_rgba8("studio checker", 4, 4, &pixels);
        backend.bind_texture(0, checker);
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed {
            return AppControl::Continue;
        }

        let input = &mut self.input;
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => return AppControl::Exit,
            Key::Named(NamedKey::ArrowLeft) => input.pan.x -= 1.0,
            Key::Named(NamedKey::ArrowRight) => input.pan.x += 1.0,
            Key::Named(NamedKey::ArrowUp) => input.pan.y += 1.0,
            Key::Named(NamedKey::ArrowDown) => input.pan.y -= 1.0,
            Key::Character(c) => match c.as_str() {
                "+" | "=" => input.zoom = 1.25,
                "-" => input.zoom = 0.8,
                "q" => input.spin += 0.1,
                "e" => input.spin -= 0.1,
                "r" => input.reset = true,
                _ => {}
            },
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let t = self.started.elapsed().as_secs_f64();
        let control = ctx.render(Color::from_u8(8, 10, 20, 255), |r| self.draw(r, t));

        self.frame += 1;
        if self.frame % STATS_EVERY == 0 {
            if let Some(stats) = ctx.stats {
                log::info!(
                    "frame {}: {} flushes, {} draws, {} vertices, {} lines, {} points, {} triangles",
                    self.frame,
                    stats.batches,
                    stats.draw_calls,
                    stats.vertices,
                    stats.lines,
                    stats.points,
                    stats.triangles
                );
            }
            let names: Vec<&str> = self.bodies.iter().map(|b| b.name).collect();
            log::debug!("bodies: {}", names.join(", "));
        }
        control
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Orrery Studio".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), Studio::new())
}
