//! Batch manager: the render-mode stack, physical batch open/flush and the
//! drawing state every emitter writes with.

use glam::DVec2;

use crate::paint::Color;

use super::backend::{FlushData, RenderBackend};
use super::buffers::{GeometryBuffers, Pen};
use super::camera::Camera;
use super::config::RendererConfig;
use super::emit::SinCosCache;
use super::error::RenderError;
use super::line::{LineAssembler, LineKind};
use super::mode::{RenderMode, RenderModeId, RenderModes, VertexLayout};
use super::stats::FrameStats;
use crate::coords::ViewPort;

/// Immediate-mode batched 2D renderer.
///
/// Geometry is accumulated between `begin_render_batch` / `end_render_batch`
/// pairs and handed to the backend in physical flushes. Nested batches of the
/// same vertex layout share one physical batch; a layout change or a full
/// buffer flushes transparently.
pub struct Renderer<B: RenderBackend> {
    backend: B,
    config: RendererConfig,
    modes: RenderModes,

    stack: Vec<RenderModeId>,
    /// Mode of the open physical batch.
    active: Option<RenderModeId>,

    pub(super) buffers: GeometryBuffers,
    pub(super) line: LineAssembler,
    pub(super) pen: Pen,
    pub(super) sin_cos: SinCosCache,

    camera: Camera,
    stats: FrameStats,

    /// A physical batch is open, through the stack or a forced begin.
    batch_open: bool,
    warned_no_batch: bool,
}

impl<B: RenderBackend> Renderer<B> {
    pub fn new(config: RendererConfig, backend: B) -> Self {
        let config = config.validated();
        let viewport = ViewPort::from_screen(1280, 720, config.px_per_unit);

        Self {
            backend,
            modes: RenderModes::new(),
            stack: Vec::new(),
            active: None,
            buffers: GeometryBuffers::new(config.vertex_capacity, config.index_capacity),
            line: LineAssembler::default(),
            pen: Pen::default(),
            sin_cos: SinCosCache::new(config.sin_cos_cache_size),
            camera: Camera::new(viewport),
            stats: FrameStats::default(),
            batch_open: false,
            warned_no_batch: false,
            config,
        }
    }

    /// Selects the first registered mode as the default and resets buffers
    /// and camera projection. Call after registering modes.
    pub fn init(&mut self) {
        self.active = self.modes.first();
        if self.active.is_none() {
            log::info!("renderer initialised without registered render modes");
        } else {
            log::debug!("renderer initialised with {} render mode(s)", self.modes.len());
        }
        self.buffers.clear();
        self.stack.clear();
        self.line = LineAssembler::default();
        self.batch_open = false;
        self.camera.setup_world_space();
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ── render modes ──────────────────────────────────────────────────────

    pub fn register_render_mode(&mut self, name: impl Into<String>, mode: RenderMode) -> RenderModeId {
        self.modes.register(name, mode)
    }

    #[inline]
    pub fn render_mode(&self, name: &str) -> Option<RenderModeId> {
        self.modes.lookup(name)
    }

    #[inline]
    pub fn modes(&self) -> &RenderModes {
        &self.modes
    }

    /// Mode of the open physical batch.
    #[inline]
    pub fn active_mode(&self) -> Option<RenderModeId> {
        self.active
    }

    #[inline]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn layout_of(&self, id: RenderModeId) -> Option<VertexLayout> {
        self.modes.get(id).map(RenderMode::layout)
    }

    fn lookup(&self, name: &str) -> Result<RenderModeId, RenderError> {
        self.modes.lookup(name).ok_or_else(|| {
            log::warn!("render mode \"{name}\" is not registered");
            RenderError::UnknownMode { name: name.to_owned() }
        })
    }

    // ── batch control ─────────────────────────────────────────────────────

    /// Pushes `id` onto the batch stack, flushing first if the current top
    /// has a different vertex layout.
    pub fn begin_render_batch(&mut self, id: RenderModeId) {
        let Some(layout) = self.layout_of(id) else {
            log::warn!("begin_render_batch with unknown render mode {id:?}");
            return;
        };

        let open = match self.stack.last().copied() {
            None => true,
            Some(top) if self.layout_of(top) != Some(layout) => {
                self.flush();
                true
            }
            Some(_) => false,
        };

        self.stack.push(id);
        if open {
            self.open_batch(id);
        }
    }

    pub fn begin_render_batch_named(&mut self, name: &str) -> Result<(), RenderError> {
        let id = self.lookup(name)?;
        self.begin_render_batch(id);
        Ok(())
    }

    /// Opens a physical batch for `id` immediately, bypassing the stack.
    ///
    /// Cursors are reset: geometry not yet flushed is discarded, so pair this
    /// with [`Renderer::force_end_render_batch`].
    pub fn force_begin_render_batch(&mut self, id: RenderModeId) {
        if self.modes.get(id).is_none() {
            log::warn!("force_begin_render_batch with unknown render mode {id:?}");
            return;
        }
        self.open_batch(id);
    }

    /// Pops the batch stack, flushing if the stack empties or the new top has
    /// a different vertex layout (which is then reopened).
    pub fn end_render_batch(&mut self) {
        if self.stack.pop().is_none() {
            #[cfg(debug_assertions)]
            log::warn!("end_render_batch without matching begin_render_batch");
            return;
        }

        match self.stack.last().copied() {
            None => {
                self.flush();
                self.batch_open = false;
            }
            Some(top) => {
                let flushed = self.active.and_then(|id| self.layout_of(id));
                if self.layout_of(top) != flushed {
                    self.flush();
                    self.open_batch(top);
                }
            }
        }
    }

    /// Flushes now; the stack is untouched.
    pub fn force_end_render_batch(&mut self) {
        self.flush();
        self.batch_open = false;
    }

    /// Flushes pending geometry and reopens with `id` so later draws land
    /// after everything emitted so far. No-op unless a batch of the same
    /// layout is open and holds geometry.
    pub fn restart_render_batch(&mut self, id: RenderModeId) {
        let Some(layout) = self.layout_of(id) else { return };
        let active = self.active.and_then(|a| self.layout_of(a));

        if self.stack.is_empty() || active != Some(layout) || self.buffers.is_empty() {
            return;
        }

        self.stack.pop();
        self.flush();
        self.stack.push(id);
        self.open_batch(id);
    }

    pub fn restart_render_batch_named(&mut self, name: &str) -> Result<(), RenderError> {
        let id = self.lookup(name)?;
        self.restart_render_batch(id);
        Ok(())
    }

    /// Overflow flush: same mode, stack untouched.
    pub(crate) fn restart_render_batch_internal(&mut self) {
        self.flush();
        if let Some(id) = self.active {
            self.open_batch(id);
        }
    }

    /// An open line goes on in the new batch, stitched to its last vertex.
    fn open_batch(&mut self, id: RenderModeId) {
        let Some(mode) = self.modes.get(id) else { return };
        self.active = Some(id);
        self.line.split(&mut self.buffers);
        self.buffers.clear();
        self.batch_open = true;
        self.backend.open_batch(id, mode, &self.camera.transform());
    }

    /// An open line is split first so no index outlives the buffer it
    /// points into.
    fn flush(&mut self) {
        self.line.split(&mut self.buffers);

        let Some(id) = self.active else {
            self.buffers.clear();
            return;
        };
        let Some(mode) = self.modes.get(id) else {
            self.buffers.clear();
            return;
        };

        let batch = FlushData { id, mode, buffers: &self.buffers };
        self.backend.flush(&batch);
        self.stats.record(&batch);
        self.buffers.clear();
    }

    /// Ends the frame: returns its counters and resets them.
    pub fn swap_buffers(&mut self) -> FrameStats {
        #[cfg(debug_assertions)]
        if !self.stack.is_empty() {
            log::warn!("swap_buffers with {} render batch(es) still open", self.stack.len());
        }
        std::mem::take(&mut self.stats)
    }

    /// Counters of the frame in progress.
    #[inline]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    // ── drawing state ─────────────────────────────────────────────────────

    /// Color of every vertex emitted from now on.
    pub fn set_color(&mut self, color: Color) {
        self.pen.color = color;
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.pen.color
    }

    /// Painter's-order depth hint written into every vertex.
    pub fn set_depth(&mut self, depth: f64) {
        self.pen.depth = depth as f32;
    }

    #[inline]
    pub fn depth(&self) -> f64 {
        f64::from(self.pen.depth)
    }

    // ── lines ─────────────────────────────────────────────────────────────

    /// Opens a line. Other primitives may be emitted before `end_line`;
    /// the line picks up after them from its last vertex.
    pub fn begin_line(&mut self, kind: LineKind) {
        self.note_emit();
        self.line.begin(kind, &self.buffers);
    }

    pub fn add_vertex(&mut self, p: DVec2) {
        if !self.line.is_active() {
            #[cfg(debug_assertions)]
            log::warn!("add_vertex outside begin_line/end_line");
            return;
        }
        if self.line.must_split(&self.buffers) {
            self.restart_render_batch_internal();
        }
        self.line.push(&mut self.buffers, to_f32(p), &self.pen);
    }

    pub fn end_line(&mut self) {
        if !self.buffers.fits(self.line.end_cost()) {
            self.restart_render_batch_internal();
        }
        if !self.line.end(&mut self.buffers, &self.pen) {
            #[cfg(debug_assertions)]
            log::warn!("end_line without matching begin_line");
        }
    }

    // ── camera ────────────────────────────────────────────────────────────

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Camera changes reach the device at the next physical batch open.
    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// New screen size: recenters the world viewport and selects world space.
    pub fn resize_viewport(&mut self, width_px: u32, height_px: u32) {
        self.camera.resize(width_px, height_px, self.config.px_per_unit);
        let vp = self.camera.viewport();
        log::info!(
            "viewport {}x{} px → [{:.2}, {:.2}] x [{:.2}, {:.2}]",
            vp.width_px,
            vp.height_px,
            vp.left,
            vp.right,
            vp.bottom,
            vp.top
        );
    }

    pub fn setup_screen_space(&mut self) {
        self.camera.setup_screen_space();
    }

    pub fn setup_world_space(&mut self) {
        self.camera.setup_world_space();
    }

    pub fn screen_to_world(&self, p: DVec2) -> DVec2 {
        self.camera.screen_to_world(p)
    }

    pub fn world_to_screen(&self, p: DVec2) -> DVec2 {
        self.camera.world_to_screen(p)
    }

    /// Pixels per world unit at the current zoom.
    pub fn resolution_px_per_unit(&self) -> f64 {
        self.camera.px_per_unit()
    }

    // ── emitter support ───────────────────────────────────────────────────

    /// One-time notice when geometry is emitted with no batch open.
    pub(super) fn note_emit(&mut self) {
        if !self.batch_open && self.stack.is_empty() && !self.warned_no_batch {
            log::debug!("geometry emitted outside begin_render_batch; it is discarded when the next batch opens");
            self.warned_no_batch = true;
        }
    }
}

#[inline]
pub(super) fn to_f32(p: DVec2) -> [f32; 2] {
    [p.x as f32, p.y as f32]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::RecordingBackend;
    use crate::render::buffers::Topology;

    fn renderer() -> (Renderer<RecordingBackend>, RenderModeId, RenderModeId) {
        let mut r = Renderer::new(RendererConfig::default(), RecordingBackend::new());
        let world = r.register_render_mode("world", RenderMode::colored());
        let font = r.register_render_mode("font", RenderMode::textured());
        r.init();
        (r, world, font)
    }

    fn flushes(r: &Renderer<RecordingBackend>) -> usize {
        r.backend().flushes().count()
    }

    // ── stack ─────────────────────────────────────────────────────────────

    #[test]
    fn init_selects_first_mode() {
        let (r, world, _) = renderer();
        assert_eq!(r.active_mode(), Some(world));
        assert_eq!(r.stack_depth(), 0);
    }

    #[test]
    fn layout_change_flushes_and_reopens() {
        let (mut r, world, font) = renderer();

        r.begin_render_batch(world);
        r.begin_render_batch(font);
        assert_eq!(flushes(&r), 1);
        assert_eq!(r.active_mode(), Some(font));

        r.end_render_batch();
        assert_eq!(flushes(&r), 2);
        assert_eq!(r.active_mode(), Some(world));

        r.end_render_batch();
        assert_eq!(flushes(&r), 3);
        assert_eq!(r.stack_depth(), 0);
        assert_eq!(r.backend().opens().collect::<Vec<_>>(), vec![world, font, world]);
    }

    #[test]
    fn same_layout_shares_batch() {
        let (mut r, world, _) = renderer();
        let overlay = r.register_render_mode("overlay", RenderMode::colored());

        r.begin_render_batch(world);
        r.begin_render_batch(overlay);
        r.end_render_batch();
        assert_eq!(flushes(&r), 0);
        r.end_render_batch();
        assert_eq!(flushes(&r), 1);
        assert_eq!(r.active_mode(), Some(world));
    }

    #[test]
    fn unbalanced_end_is_noop() {
        let (mut r, _, _) = renderer();
        r.end_render_batch();
        assert_eq!(r.stack_depth(), 0);
        assert_eq!(flushes(&r), 0);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let (mut r, _, _) = renderer();
        assert_eq!(
            r.begin_render_batch_named("nope"),
            Err(RenderError::UnknownMode { name: "nope".into() })
        );
        assert_eq!(r.stack_depth(), 0);
        assert!(r.begin_render_batch_named("world").is_ok());
        assert_eq!(r.stack_depth(), 1);
    }

    #[test]
    fn forced_calls_bypass_stack() {
        let (mut r, world, _) = renderer();
        r.force_begin_render_batch(world);
        assert_eq!(r.stack_depth(), 0);
        r.force_end_render_batch();
        assert_eq!(flushes(&r), 1);
    }

    // ── restart ───────────────────────────────────────────────────────────

    #[test]
    fn restart_flushes_only_with_pending_geometry() {
        let (mut r, world, font) = renderer();
        r.begin_render_batch(world);

        r.restart_render_batch(world);
        assert_eq!(flushes(&r), 0);

        r.dot(DVec2::ZERO);
        r.restart_render_batch(font);
        assert_eq!(flushes(&r), 0);

        r.restart_render_batch(world);
        assert_eq!(flushes(&r), 1);
        assert_eq!(r.stack_depth(), 1);

        r.end_render_batch();
        assert_eq!(flushes(&r), 2);
    }

    #[test]
    fn restart_named_reports_unknown() {
        let (mut r, _, _) = renderer();
        assert!(r.restart_render_batch_named("missing").is_err());
    }

    // ── frame ─────────────────────────────────────────────────────────────

    #[test]
    fn swap_buffers_returns_and_resets_stats() {
        let (mut r, world, _) = renderer();
        r.begin_render_batch(world);
        r.filled_rect(DVec2::ZERO, DVec2::ONE);
        r.end_render_batch();

        let stats = r.swap_buffers();
        assert_eq!(stats.batches, 1);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.vertices, 4);
        assert_eq!(stats.triangles, 2);
        assert_eq!(*r.stats(), FrameStats::default());
    }

    #[test]
    fn pen_reaches_vertices() {
        let (mut r, world, _) = renderer();
        r.set_color(Color::rgba(1.0, 0.0, 0.0, 0.5));
        r.set_depth(-2.0);
        r.begin_render_batch(world);
        r.dot(DVec2::new(1.0, 2.0));
        r.end_render_batch();

        let f = r.backend().flushes().next().cloned().expect("one flush");
        assert_eq!(f.positions, vec![1.0, 2.0, -2.0]);
        assert_eq!(f.colors, vec![1.0, 0.0, 0.0, 0.5]);
        assert_eq!(f.indices(Topology::Points), &[0]);
    }

    #[test]
    fn emit_before_any_batch_is_noticed() {
        let (mut r, world, _) = renderer();
        r.dot(DVec2::ZERO);
        assert!(r.warned_no_batch);

        // discarded by the open, not drawn
        r.begin_render_batch(world);
        r.end_render_batch();
        assert_eq!(r.swap_buffers().vertices, 0);
    }

    #[test]
    fn emit_inside_batches_is_not_noticed() {
        let (mut r, world, _) = renderer();
        r.begin_render_batch(world);
        r.dot(DVec2::ZERO);
        r.end_render_batch();
        assert!(!r.warned_no_batch);

        r.force_begin_render_batch(world);
        r.dot(DVec2::ZERO);
        r.force_end_render_batch();
        assert!(!r.warned_no_batch);

        r.dot(DVec2::ZERO);
        assert!(r.warned_no_batch);
    }

    #[test]
    fn batch_open_uploads_current_camera() {
        let (mut r, world, _) = renderer();
        r.camera_mut().zoom_to(2.0);
        r.begin_render_batch(world);

        let expect = r.camera().transform();
        match r.backend().events.first() {
            Some(crate::render::BackendEvent::Open { transform, .. }) => assert_eq!(*transform, expect),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resize_viewport_uses_px_per_unit() {
        let (mut r, _, _) = renderer();
        r.setup_screen_space();
        r.resize_viewport(200, 100);
        let vp = *r.camera().viewport();
        assert_eq!((vp.width_px, vp.height_px), (200, 100));
        assert_eq!(vp.right, 100.0 / r.config().px_per_unit);
        assert_eq!(r.camera().projection(), crate::render::Projection::World);
    }
}
