//! 2D camera: world position, rotation and zoom over an orthographic
//! viewport, plus the screen-space projection used for overlays.

use glam::{DMat2, DVec2, Mat4, Vec3};

use crate::coords::ViewPort;

/// Which projection the transform uses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Projection {
    /// Viewport planes, camera position/rotation/zoom applied.
    World,
    /// Pixel coordinates, origin top-left, +Y down. Camera state is ignored.
    Screen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: DVec2,
    angle: f64,
    zoom: f64,
    projection: Projection,
    viewport: ViewPort,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(ViewPort::default())
    }
}

impl Camera {
    pub fn new(viewport: ViewPort) -> Self {
        Self {
            position: DVec2::ZERO,
            angle: 0.0,
            zoom: 1.0,
            projection: Projection::World,
            viewport,
        }
    }

    /// Back to origin, no rotation, zoom 1. Viewport and projection are kept.
    pub fn reset(&mut self) {
        self.position = DVec2::ZERO;
        self.angle = 0.0;
        self.zoom = 1.0;
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Rotation in radians.
    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    #[inline]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[inline]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    #[inline]
    pub fn viewport(&self) -> &ViewPort {
        &self.viewport
    }

    // ── movement ──────────────────────────────────────────────────────────

    pub fn rotate_by(&mut self, inc: f64) {
        self.angle += inc;
    }

    pub fn rotate_to(&mut self, angle: f64) {
        self.angle = angle;
    }

    /// Moves by `inc` expressed in the camera's rotated frame.
    pub fn translate_by(&mut self, inc: DVec2) {
        self.position += DMat2::from_angle(self.angle) * inc;
    }

    /// Places the camera at `pos` expressed in the camera's rotated frame.
    pub fn translate_to(&mut self, pos: DVec2) {
        self.position = DMat2::from_angle(self.angle) * pos;
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom_to(self.zoom * factor);
    }

    pub fn zoom_to(&mut self, zoom: f64) {
        if !(zoom.is_finite() && zoom > 0.0) {
            log::warn!("ignoring invalid zoom {zoom}");
            return;
        }
        self.zoom = zoom;
    }

    // ── viewport ──────────────────────────────────────────────────────────

    pub fn setup_screen_space(&mut self) {
        self.projection = Projection::Screen;
    }

    pub fn setup_world_space(&mut self) {
        self.projection = Projection::World;
    }

    /// Overrides the world planes; screen size and depth range are kept.
    pub fn set_viewport(&mut self, left: f64, right: f64, bottom: f64, top: f64) {
        self.viewport.left = left;
        self.viewport.right = right;
        self.viewport.bottom = bottom;
        self.viewport.top = top;
    }

    /// Recenters the viewport for a new screen size and selects world space.
    pub fn resize(&mut self, width_px: u32, height_px: u32, px_per_unit: f64) {
        self.viewport.resize(width_px, height_px, px_per_unit);
        self.projection = Projection::World;
    }

    /// Pixels per world unit at the current zoom.
    pub fn px_per_unit(&self) -> f64 {
        f64::from(self.viewport.width_px) / self.viewport.width() * self.zoom
    }

    // ── transform ─────────────────────────────────────────────────────────

    pub fn projection_matrix(&self) -> Mat4 {
        let vp = &self.viewport;
        match self.projection {
            Projection::World => Mat4::orthographic_rh(
                vp.left as f32,
                vp.right as f32,
                vp.bottom as f32,
                vp.top as f32,
                vp.near as f32,
                vp.far as f32,
            ),
            Projection::Screen => Mat4::orthographic_rh(
                0.0,
                vp.width_px as f32,
                vp.height_px as f32,
                0.0,
                vp.near as f32,
                vp.far as f32,
            ),
        }
    }

    /// Full transform uploaded when a physical batch opens.
    pub fn transform(&self) -> Mat4 {
        let proj = self.projection_matrix();
        if self.projection == Projection::Screen {
            return proj;
        }

        let zoom = self.zoom as f32;
        proj * Mat4::from_scale(Vec3::new(zoom, zoom, 1.0))
            * Mat4::from_rotation_z(-self.angle as f32)
            * Mat4::from_translation(Vec3::new(-self.position.x as f32, -self.position.y as f32, 0.0))
    }

    // ── mapping ───────────────────────────────────────────────────────────

    /// World → pixel coordinates (origin top-left, +Y down).
    pub fn world_to_screen(&self, p: DVec2) -> DVec2 {
        let vp = &self.viewport;
        let v = DMat2::from_angle(-self.angle) * (p - self.position) * self.zoom;
        DVec2::new(
            (v.x - vp.left) / vp.width() * f64::from(vp.width_px),
            (vp.top - v.y) / vp.height() * f64::from(vp.height_px),
        )
    }

    /// Pixel → world coordinates; inverse of [`Camera::world_to_screen`].
    pub fn screen_to_world(&self, p: DVec2) -> DVec2 {
        let vp = &self.viewport;
        let v = DVec2::new(
            vp.left + p.x / f64::from(vp.width_px) * vp.width(),
            vp.top - p.y / f64::from(vp.height_px) * vp.height(),
        );
        DMat2::from_angle(self.angle) * (v / self.zoom) + self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPS: f64 = 1e-9;

    fn approx(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < EPS * (1.0 + a.length().max(b.length()))
    }

    fn moved_camera() -> Camera {
        let mut cam = Camera::new(ViewPort::from_screen(800, 600, 20.0));
        cam.translate_to(DVec2::new(3.5, -1.25));
        cam.rotate_to(0.7);
        cam.zoom_to(2.5);
        cam
    }

    // ── mapping ───────────────────────────────────────────────────────────

    #[test]
    fn origin_maps_to_screen_center() {
        let cam = Camera::new(ViewPort::from_screen(800, 600, 20.0));
        assert!(approx(cam.world_to_screen(DVec2::ZERO), DVec2::new(400.0, 300.0)));
        assert!(approx(cam.screen_to_world(DVec2::new(0.0, 0.0)), DVec2::new(-20.0, 15.0)));
    }

    #[test]
    fn round_trip_screen_world_screen() {
        let cam = moved_camera();
        for &(x, y) in &[(0.0, 0.0), (400.0, 300.0), (799.0, 1.0), (12.5, 577.25)] {
            let p = DVec2::new(x, y);
            assert!(approx(cam.world_to_screen(cam.screen_to_world(p)), p), "{p:?}");
        }
    }

    #[test]
    fn round_trip_world_screen_world() {
        let cam = moved_camera();
        for &(x, y) in &[(0.0, 0.0), (3.5, -1.25), (-7.0, 4.0), (10.0, 10.0)] {
            let p = DVec2::new(x, y);
            assert!(approx(cam.screen_to_world(cam.world_to_screen(p)), p), "{p:?}");
        }
    }

    #[test]
    fn transform_agrees_with_world_to_screen() {
        let cam = moved_camera();
        let p = DVec2::new(4.0, -2.0);

        let clip = cam.transform() * Vec4::new(p.x as f32, p.y as f32, 0.0, 1.0);
        let vp = cam.viewport();
        let sx = (f64::from(clip.x) + 1.0) * 0.5 * f64::from(vp.width_px);
        let sy = (1.0 - f64::from(clip.y)) * 0.5 * f64::from(vp.height_px);

        let expect = cam.world_to_screen(p);
        assert!((sx - expect.x).abs() < 1e-2, "{sx} vs {}", expect.x);
        assert!((sy - expect.y).abs() < 1e-2, "{sy} vs {}", expect.y);
    }

    // ── movement ──────────────────────────────────────────────────────────

    #[test]
    fn translate_by_uses_rotated_frame() {
        let mut cam = Camera::default();
        cam.rotate_to(std::f64::consts::FRAC_PI_2);
        cam.translate_by(DVec2::new(1.0, 0.0));
        assert!(approx(cam.position(), DVec2::new(0.0, 1.0)));
    }

    #[test]
    fn zoom_by_multiplies_and_rejects_invalid() {
        let mut cam = Camera::default();
        cam.zoom_by(2.0);
        cam.zoom_by(1.5);
        assert_eq!(cam.zoom(), 3.0);
        cam.zoom_to(0.0);
        cam.zoom_by(f64::NAN);
        assert_eq!(cam.zoom(), 3.0);
    }

    #[test]
    fn reset_keeps_viewport_and_projection() {
        let mut cam = moved_camera();
        cam.setup_screen_space();
        let vp = *cam.viewport();
        cam.reset();
        assert_eq!(cam.position(), DVec2::ZERO);
        assert_eq!(cam.zoom(), 1.0);
        assert_eq!(cam.projection(), Projection::Screen);
        assert_eq!(*cam.viewport(), vp);
    }

    #[test]
    fn px_per_unit_scales_with_zoom() {
        let mut cam = Camera::new(ViewPort::from_screen(800, 600, 20.0));
        assert!((cam.px_per_unit() - 20.0).abs() < EPS);
        cam.zoom_to(0.5);
        assert!((cam.px_per_unit() - 10.0).abs() < EPS);
    }

    #[test]
    fn screen_projection_maps_pixels_to_ndc() {
        let mut cam = Camera::new(ViewPort::from_screen(800, 600, 20.0));
        cam.setup_screen_space();
        let m = cam.transform();
        let tl = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let br = m * Vec4::new(800.0, 600.0, 0.0, 1.0);
        assert!((tl.x + 1.0).abs() < 1e-6 && (tl.y - 1.0).abs() < 1e-6);
        assert!((br.x - 1.0).abs() < 1e-6 && (br.y + 1.0).abs() < 1e-6);
    }
}
