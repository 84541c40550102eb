//! Primitive emitters.
//!
//! Every emitter reserves the space it needs up front; when the buffers are
//! too full the current physical batch is flushed and reopened with the same
//! mode first. Shapes that can outgrow a whole buffer (outlines, fans, point
//! clouds) split themselves across flushes.

use std::f64::consts::TAU;

use glam::DVec2;

use super::backend::RenderBackend;
use super::buffers::{GeometryCost, Pen};
use super::line::LineKind;
use super::renderer::{to_f32, Renderer};

/// Target angle between circle vertices for the dynamic emitters.
pub const SEGMENT_ANGLE: f64 = 0.1;
/// On-screen segment length bounds for the dynamic emitters.
pub const SEGMENT_MIN_PX: f64 = 3.0;
pub const SEGMENT_MAX_PX: f64 = 20.0;
const MAX_DYN_SEGMENTS: usize = 4096;

/// Arrow head of `show_vec`, in pixels.
const ARROW_HEAD_LENGTH_PX: f64 = 5.0;
const ARROW_HEAD_HALF_WIDTH_PX: f64 = 2.0;

/// UV per corner of a quad, in emit order: lower-left, lower-right,
/// upper-left, upper-right.
pub type QuadUv = [[f32; 2]; 4];

/// The whole texture, upright (texture v grows downwards).
pub const FULL_QUAD_UV: QuadUv = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];

// ── sin/cos cache ─────────────────────────────────────────────────────────

/// Precomputed `sin`/`cos` of `i·2π/n` for `i` in `0..=n`.
#[derive(Debug, Clone, PartialEq)]
pub struct SinCosCache {
    sin: Vec<f64>,
    cos: Vec<f64>,
    segments: usize,
    max_segments: usize,
}

impl SinCosCache {
    pub fn new(max_segments: usize) -> Self {
        Self {
            sin: Vec::with_capacity(max_segments + 1),
            cos: Vec::with_capacity(max_segments + 1),
            segments: 0,
            max_segments,
        }
    }

    /// Refills the tables for `segments` segments (clamped to the configured size).
    pub fn refresh(&mut self, segments: usize) {
        let n = if segments > self.max_segments {
            log::warn!(
                "sin/cos cache of {segments} segments exceeds {}; clamped",
                self.max_segments
            );
            self.max_segments
        } else {
            segments
        };

        self.sin.clear();
        self.cos.clear();
        self.segments = n;
        if n == 0 {
            return;
        }
        for i in 0..=n {
            let (s, c) = ring_angle(i, n).sin_cos();
            self.sin.push(s);
            self.cos.push(c);
        }
    }

    /// Segment count the tables currently hold; 0 when empty.
    #[inline]
    pub fn segments(&self) -> usize {
        self.segments
    }

    #[inline]
    pub fn sin(&self) -> &[f64] {
        &self.sin
    }

    #[inline]
    pub fn cos(&self) -> &[f64] {
        &self.cos
    }
}

#[inline]
fn ring_angle(i: usize, n: usize) -> f64 {
    i as f64 * TAU / n as f64
}

// ── emitters ──────────────────────────────────────────────────────────────

impl<B: RenderBackend> Renderer<B> {
    /// Fills the sin/cos tables used by `circle`/`filled_circle` with `cached = true`.
    pub fn cache_sin_cos(&mut self, segments: usize) {
        self.sin_cos.refresh(segments);
    }

    /// Makes room for `cost`, flushing if needed. False if `cost` exceeds an
    /// empty buffer.
    fn reserve(&mut self, cost: GeometryCost) -> bool {
        self.note_emit();
        self.break_line();

        if self.buffers.fits(cost) {
            return true;
        }
        self.restart_render_batch_internal();
        if self.buffers.fits(cost) {
            return true;
        }
        log::warn!("primitive needs {cost:?}, more than the geometry buffers hold; skipped");
        false
    }

    /// Closes the open line's segment before other geometry lands in the
    /// buffer; the line goes on with a stitch vertex after it.
    fn break_line(&mut self) {
        self.line.split(&mut self.buffers);
    }

    /// Unit offset of ring vertex `i` of `n`: x from sin, y from cos, so the
    /// ring starts at the top and runs clockwise.
    fn ring_offset(&self, i: usize, n: usize, cached: bool) -> DVec2 {
        if cached && self.sin_cos.segments() == n {
            DVec2::new(self.sin_cos.sin()[i], self.sin_cos.cos()[i])
        } else {
            let (s, c) = ring_angle(i, n).sin_cos();
            DVec2::new(s, c)
        }
    }

    fn warn_cache_miss(&self, cached: bool, segments: usize) {
        if cached && self.sin_cos.segments() != segments {
            log::debug!(
                "sin/cos cache holds {} segments, {segments} requested; computing directly",
                self.sin_cos.segments()
            );
        }
    }

    pub fn dot(&mut self, p: DVec2) {
        if !self.reserve(GeometryCost::vertices(1).with_points(1)) {
            return;
        }
        let i = self.buffers.push_vertex(to_f32(p), &self.pen);
        self.buffers.push_point(i);
    }

    /// Point cloud; point `i` of `n` gets `i / n` of the current color's
    /// alpha, so the ramp starts at 0 and stops one step short of it.
    pub fn dots(&mut self, points: &[DVec2], offset: DVec2) {
        let n = points.len() as f32;
        let base = self.pen;

        for (i, &p) in points.iter().enumerate() {
            if !self.reserve(GeometryCost::vertices(1).with_points(1)) {
                return;
            }
            let pen = Pen {
                color: base.color.with_alpha(base.color.a * i as f32 / n),
                depth: base.depth,
            };
            let idx = self.buffers.push_vertex(to_f32(p + offset), &pen);
            self.buffers.push_point(idx);
        }
    }

    pub fn line(&mut self, a: DVec2, b: DVec2) {
        if !self.reserve(GeometryCost::vertices(2).with_lines(2)) {
            return;
        }
        let i = self.buffers.push_vertex(to_f32(a), &self.pen);
        let j = self.buffers.push_vertex(to_f32(b), &self.pen);
        self.buffers.push_line(i, j);
    }

    /// Outline of the axis-aligned rectangle spanned by `ll` and `ur`.
    pub fn rect(&mut self, ll: DVec2, ur: DVec2) {
        if !self.reserve(GeometryCost::vertices(4).with_lines(8)) {
            return;
        }
        let pen = self.pen;
        let b = &mut self.buffers;
        let i0 = b.push_vertex(to_f32(ll), &pen);
        let i1 = b.push_vertex([ur.x as f32, ll.y as f32], &pen);
        let i2 = b.push_vertex(to_f32(ur), &pen);
        let i3 = b.push_vertex([ll.x as f32, ur.y as f32], &pen);
        b.push_line(i0, i1);
        b.push_line(i1, i2);
        b.push_line(i2, i3);
        b.push_line(i3, i0);
    }

    pub fn filled_rect(&mut self, ll: DVec2, ur: DVec2) {
        self.quad(ll, ur, &[[0.0; 2]; 4], &[[0.0; 2]; 4]);
    }

    /// Filled rectangle with one UV set.
    pub fn textured_rect(&mut self, ll: DVec2, ur: DVec2, uv: &QuadUv) {
        self.quad(ll, ur, uv, &[[0.0; 2]; 4]);
    }

    /// Filled rectangle with two UV sets.
    pub fn textured_rect2(&mut self, ll: DVec2, ur: DVec2, uv0: &QuadUv, uv1: &QuadUv) {
        self.quad(ll, ur, uv0, uv1);
    }

    fn quad(&mut self, ll: DVec2, ur: DVec2, uv0: &QuadUv, uv1: &QuadUv) {
        if !self.reserve(GeometryCost::vertices(4).with_triangles(6)) {
            return;
        }
        let corners = [
            to_f32(ll),
            [ur.x as f32, ll.y as f32],
            [ll.x as f32, ur.y as f32],
            to_f32(ur),
        ];

        let pen = self.pen;
        let b = &mut self.buffers;
        let base = b.next_index();
        for (k, &c) in corners.iter().enumerate() {
            b.push_textured_vertex(c, &pen, uv0[k], uv1[k]);
        }
        b.push_triangle(base, base + 1, base + 2);
        b.push_triangle(base + 2, base + 1, base + 3);
    }

    pub fn triangle(&mut self, a: DVec2, b: DVec2, c: DVec2) {
        if !self.reserve(GeometryCost::vertices(3).with_lines(6)) {
            return;
        }
        let pen = self.pen;
        let buf = &mut self.buffers;
        let i0 = buf.push_vertex(to_f32(a), &pen);
        let i1 = buf.push_vertex(to_f32(b), &pen);
        let i2 = buf.push_vertex(to_f32(c), &pen);
        buf.push_line(i0, i1);
        buf.push_line(i1, i2);
        buf.push_line(i2, i0);
    }

    pub fn filled_triangle(&mut self, a: DVec2, b: DVec2, c: DVec2) {
        if !self.reserve(GeometryCost::vertices(3).with_triangles(3)) {
            return;
        }
        let pen = self.pen;
        let buf = &mut self.buffers;
        let i0 = buf.push_vertex(to_f32(a), &pen);
        let i1 = buf.push_vertex(to_f32(b), &pen);
        let i2 = buf.push_vertex(to_f32(c), &pen);
        buf.push_triangle(i0, i1, i2);
    }

    /// Circle outline with `segments` ring vertices (at least 3), closed as a
    /// line loop.
    pub fn circle(&mut self, center: DVec2, radius: f64, segments: usize, cached: bool) {
        let n = segments.max(3);
        self.warn_cache_miss(cached, n);

        self.begin_line(LineKind::Loop);
        for i in 0..n {
            let p = center + self.ring_offset(i, n, cached) * radius;
            self.add_vertex(p);
        }
        self.end_line();
    }

    /// Triangle fan around `center`; `segments` triangles, ring closed by
    /// repeating its first vertex.
    pub fn filled_circle(&mut self, center: DVec2, radius: f64, segments: usize, cached: bool) {
        let n = segments.max(3);
        self.warn_cache_miss(cached, n);
        self.note_emit();
        self.break_line();

        let mut done = 0;
        let mut flushed = false;
        while done < n {
            let room = self.buffers.remaining();
            let chunk = (n - done)
                .min(room.vertices.saturating_sub(2))
                .min(room.triangles / 3);

            if chunk == 0 {
                if flushed {
                    log::warn!("filled_circle does not fit an empty buffer; skipped");
                    return;
                }
                self.restart_render_batch_internal();
                flushed = true;
                continue;
            }
            flushed = false;

            let pen = self.pen;
            let c = self.buffers.push_vertex(to_f32(center), &pen);
            let mut prev = {
                let p = center + self.ring_offset(done, n, cached) * radius;
                self.buffers.push_vertex(to_f32(p), &pen)
            };
            for k in 1..=chunk {
                let i = (done + k) % n;
                let p = center + self.ring_offset(i, n, cached) * radius;
                let next = self.buffers.push_vertex(to_f32(p), &pen);
                self.buffers.push_triangle(c, prev, next);
                prev = next;
            }
            done += chunk;
        }
    }

    /// Open arc from `start` to `end` (radians, counter-clockwise from +x)
    /// with `segments` segments.
    pub fn arc(&mut self, center: DVec2, radius: f64, start: f64, end: f64, segments: usize) {
        let n = segments.max(1);

        self.begin_line(LineKind::Strip);
        for i in 0..=n {
            let a = start + (end - start) * i as f64 / n as f64;
            let (s, c) = a.sin_cos();
            self.add_vertex(center + DVec2::new(c, s) * radius);
        }
        self.end_line();
    }

    /// Angle step that keeps on-screen segments within the pixel bounds.
    fn dynamic_step(&self, radius: f64) -> f64 {
        let surf_px = self.resolution_px_per_unit() * radius.abs();
        if !(surf_px.is_finite() && surf_px > 0.0) {
            return SEGMENT_ANGLE;
        }
        let seg_px = (SEGMENT_ANGLE * surf_px).clamp(SEGMENT_MIN_PX, SEGMENT_MAX_PX);
        seg_px / surf_px
    }

    /// Circle outline with a segment count chosen from its on-screen size.
    pub fn circle_dyn(&mut self, center: DVec2, radius: f64) {
        let n = ((TAU / self.dynamic_step(radius)).ceil() as usize).clamp(3, MAX_DYN_SEGMENTS);
        self.circle(center, radius, n, false);
    }

    /// Arc with a segment count chosen from its on-screen size. The angles
    /// may be given in either order.
    pub fn arc_dyn(&mut self, center: DVec2, radius: f64, a0: f64, a1: f64) {
        let (start, end) = if a1 < a0 { (a1, a0) } else { (a0, a1) };
        let n = (((end - start) / self.dynamic_step(radius)).ceil() as usize).clamp(1, MAX_DYN_SEGMENTS);
        self.arc(center, radius, start, end, n);
    }

    /// `vertices` shifted by `offset`, connected as `kind`.
    pub fn polygon(&mut self, vertices: &[DVec2], kind: LineKind, offset: DVec2) {
        self.begin_line(kind);
        for &v in vertices {
            self.add_vertex(v + offset);
        }
        self.end_line();
    }

    /// Arrow from `pos` to `pos + v`; the head keeps its pixel size under zoom.
    pub fn show_vec(&mut self, v: DVec2, pos: DVec2) {
        let len = v.length();
        if len == 0.0 || !len.is_finite() {
            return;
        }

        let px = self.resolution_px_per_unit();
        let dir = v / len;
        let front = pos + v;
        let back = front - dir * (ARROW_HEAD_LENGTH_PX / px);
        let side = dir.perp() * (ARROW_HEAD_HALF_WIDTH_PX / px);

        self.line(pos, back);
        self.filled_triangle(back + side, front, back - side);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;
    use crate::render::backend::{RecordedFlush, RecordingBackend};
    use crate::render::buffers::Topology;
    use crate::render::config::RendererConfig;
    use crate::render::mode::RenderMode;

    fn renderer(vertex_capacity: usize, index_capacity: usize) -> Renderer<RecordingBackend> {
        let config = RendererConfig { vertex_capacity, index_capacity, ..RendererConfig::default() };
        let mut r = Renderer::new(config, RecordingBackend::new());
        let id = r.register_render_mode("world", RenderMode::colored());
        r.init();
        r.begin_render_batch(id);
        r
    }

    fn finish(mut r: Renderer<RecordingBackend>) -> Vec<RecordedFlush> {
        r.end_render_batch();
        r.backend().flushes().cloned().collect()
    }

    // ── cache ─────────────────────────────────────────────────────────────

    #[test]
    fn cache_refresh_is_idempotent() {
        let mut a = SinCosCache::new(64);
        a.refresh(12);
        let snapshot = a.clone();
        a.refresh(12);
        assert_eq!(a, snapshot);
        assert_eq!(a.sin().len(), 13);
        assert_eq!(a.segments(), 12);
    }

    #[test]
    fn cache_is_clamped() {
        let mut a = SinCosCache::new(8);
        a.refresh(100);
        assert_eq!(a.segments(), 8);
        assert_eq!(a.cos().len(), 9);
    }

    #[test]
    fn cached_and_uncached_circles_match() {
        let mut cached = renderer(1024, 2048);
        cached.cache_sin_cos(24);
        cached.circle(DVec2::new(1.0, -2.0), 3.0, 24, true);
        cached.filled_circle(DVec2::new(1.0, -2.0), 3.0, 24, true);

        let mut plain = renderer(1024, 2048);
        plain.circle(DVec2::new(1.0, -2.0), 3.0, 24, false);
        plain.filled_circle(DVec2::new(1.0, -2.0), 3.0, 24, false);

        assert_eq!(finish(cached), finish(plain));
    }

    // ── shapes ────────────────────────────────────────────────────────────

    #[test]
    fn circle_starts_at_top() {
        let mut r = renderer(256, 256);
        r.circle(DVec2::ZERO, 2.0, 4, false);
        let f = &finish(r)[0];

        assert_eq!(f.vertex_count(), 4);
        let top = f.position(0);
        assert!((top[0]).abs() < 1e-6 && (top[1] - 2.0).abs() < 1e-6);
        let right = f.position(1);
        assert!((right[0] - 2.0).abs() < 1e-6 && right[1].abs() < 1e-6);
        assert_eq!(f.indices(Topology::Lines), &[0, 1, 1, 2, 2, 3, 3, 0]);
    }

    #[test]
    fn rect_is_a_four_line_loop() {
        let mut r = renderer(256, 256);
        r.rect(DVec2::new(0.0, 0.0), DVec2::new(2.0, 1.0));
        let f = &finish(r)[0];
        assert_eq!(f.positions, vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(f.indices(Topology::Lines), &[0, 1, 1, 2, 2, 3, 3, 0]);
    }

    #[test]
    fn filled_rect_triangles() {
        let mut r = renderer(256, 256);
        r.filled_rect(DVec2::new(0.0, 0.0), DVec2::new(2.0, 1.0));
        let f = &finish(r)[0];
        assert_eq!(f.position(1), [2.0, 0.0]);
        assert_eq!(f.position(2), [0.0, 1.0]);
        assert_eq!(f.indices(Topology::Triangles), &[0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn filled_circle_fans_from_center() {
        let mut r = renderer(256, 256);
        r.filled_circle(DVec2::new(5.0, 5.0), 1.0, 6, false);
        let f = &finish(r)[0];

        assert_eq!(f.vertex_count(), 1 + 6 + 1);
        assert_eq!(f.position(0), [5.0, 5.0]);
        assert_eq!(f.position(1), f.position(7));
        let tris = f.indices(Topology::Triangles);
        assert_eq!(tris.len(), 6 * 3);
        assert!(tris.chunks(3).all(|t| t[0] == 0));
    }

    #[test]
    fn filled_circle_splits_across_flushes() {
        let mut r = renderer(16, 32);
        r.filled_circle(DVec2::ZERO, 1.0, 40, false);
        let flushes = finish(r);

        assert!(flushes.len() >= 2);
        let tris: usize = flushes.iter().map(|f| f.indices(Topology::Triangles).len() / 3).sum();
        assert_eq!(tris, 40);
        assert!(flushes.iter().all(|f| f.vertex_count() <= 16));
    }

    #[test]
    fn dots_ramp_alpha() {
        let mut r = renderer(256, 256);
        r.set_color(Color::rgba(1.0, 1.0, 1.0, 0.8));
        r.dots(&[DVec2::ZERO, DVec2::X, DVec2::Y, DVec2::ONE], DVec2::new(10.0, 0.0));
        let f = &finish(r)[0];

        assert_eq!(f.indices(Topology::Points), &[0, 1, 2, 3]);
        assert_eq!(f.position(1), [11.0, 0.0]);
        let alphas: Vec<f32> = f.colors.chunks(4).map(|c| c[3]).collect();
        assert_eq!(alphas[0], 0.0);
        assert!((alphas[2] - 0.4).abs() < 1e-6);
        assert!((alphas[3] - 0.6).abs() < 1e-6);
        assert!(alphas.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn arc_includes_both_ends() {
        let mut r = renderer(256, 256);
        r.arc(DVec2::ZERO, 1.0, 0.0, std::f64::consts::PI, 4);
        let f = &finish(r)[0];

        assert_eq!(f.vertex_count(), 5);
        assert_eq!(f.indices(Topology::Lines).len(), 4 * 2);
        let end = f.position(4);
        assert!((end[0] + 1.0).abs() < 1e-6 && end[1].abs() < 1e-6);
    }

    #[test]
    fn dynamic_segments_follow_zoom() {
        let mut far = renderer(1 << 14, 1 << 15);
        far.circle_dyn(DVec2::ZERO, 1.0);
        let far_n = finish(far)[0].vertex_count();

        let mut near = renderer(1 << 14, 1 << 15);
        near.camera_mut().zoom_to(50.0);
        near.circle_dyn(DVec2::ZERO, 1.0);
        let near_n = finish(near)[0].vertex_count();

        assert!(far_n >= 3);
        assert!(near_n > far_n);
    }

    #[test]
    fn arc_dyn_accepts_reversed_angles() {
        let mut a = renderer(1024, 1024);
        a.arc_dyn(DVec2::ZERO, 2.0, 1.0, 0.0);
        let mut b = renderer(1024, 1024);
        b.arc_dyn(DVec2::ZERO, 2.0, 0.0, 1.0);
        assert_eq!(finish(a), finish(b));
    }

    #[test]
    fn show_vec_draws_shaft_and_head() {
        let mut r = renderer(256, 256);
        r.show_vec(DVec2::new(10.0, 0.0), DVec2::ZERO);
        r.show_vec(DVec2::ZERO, DVec2::ONE);
        let f = &finish(r)[0];

        assert_eq!(f.indices(Topology::Lines).len(), 2);
        assert_eq!(f.indices(Topology::Triangles).len(), 3);
        assert_eq!(f.position(3), [10.0, 0.0]);
    }

    #[test]
    fn polygon_applies_offset() {
        let mut r = renderer(256, 256);
        r.polygon(&[DVec2::ZERO, DVec2::X, DVec2::Y], LineKind::Loop, DVec2::new(1.0, 1.0));
        let f = &finish(r)[0];
        assert_eq!(f.position(0), [1.0, 1.0]);
        assert_eq!(f.indices(Topology::Lines), &[0, 1, 1, 2, 2, 0]);
    }
}
