/// Orthographic view volume in world units plus the screen size in pixels.
///
/// The planes are stored in `f64`; only the final projection matrix is
/// narrowed to `f32`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewPort {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub near: f64,
    pub far: f64,

    /// Screen width in pixels.
    pub width_px: u32,
    /// Screen height in pixels.
    pub height_px: u32,
}

impl Default for ViewPort {
    fn default() -> Self {
        Self::from_screen(1280, 720, 1.0)
    }
}

impl ViewPort {
    pub const DEFAULT_NEAR: f64 = -10.0;
    pub const DEFAULT_FAR: f64 = 10.0;

    /// Viewport centered on the origin, `px_per_unit` pixels per world unit.
    pub fn from_screen(width_px: u32, height_px: u32, px_per_unit: f64) -> Self {
        let mut vp = Self {
            left: 0.0,
            right: 0.0,
            bottom: 0.0,
            top: 0.0,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
            width_px,
            height_px,
        };
        vp.resize(width_px, height_px, px_per_unit);
        vp
    }

    /// Recomputes the planes for a new screen size, keeping the view centered.
    pub fn resize(&mut self, width_px: u32, height_px: u32, px_per_unit: f64) {
        let width_px = width_px.max(1);
        let height_px = height_px.max(1);
        let px_per_unit = if px_per_unit > 0.0 { px_per_unit } else { 1.0 };

        self.width_px = width_px;
        self.height_px = height_px;
        self.right = f64::from(width_px) * 0.5 / px_per_unit;
        self.top = f64::from(height_px) * 0.5 / px_per_unit;
        self.left = -self.right;
        self.bottom = -self.top;
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0
            && self.height() > 0.0
            && self.width().is_finite()
            && self.height().is_finite()
            && self.width_px > 0
            && self.height_px > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_screen_is_centered() {
        let vp = ViewPort::from_screen(800, 600, 10.0);
        assert_eq!(vp.left, -40.0);
        assert_eq!(vp.right, 40.0);
        assert_eq!(vp.bottom, -30.0);
        assert_eq!(vp.top, 30.0);
        assert!(vp.is_valid());
    }

    #[test]
    fn resize_keeps_depth_planes() {
        let mut vp = ViewPort::from_screen(100, 100, 1.0);
        vp.near = -2.0;
        vp.far = 3.0;
        vp.resize(200, 50, 2.0);
        assert_eq!(vp.width(), 100.0);
        assert_eq!(vp.height(), 25.0);
        assert_eq!((vp.near, vp.far), (-2.0, 3.0));
    }

    #[test]
    fn zero_size_is_clamped() {
        let vp = ViewPort::from_screen(0, 0, 0.0);
        assert_eq!((vp.width_px, vp.height_px), (1, 1));
        assert!(vp.is_valid());
    }
}
