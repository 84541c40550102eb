/// Smallest vertex capacity the batcher accepts. A flush must always leave
/// room for the largest fixed-size primitive plus line-closing headroom.
pub const MIN_VERTEX_CAPACITY: usize = 16;

/// Smallest per-stream index capacity.
pub const MIN_INDEX_CAPACITY: usize = 32;

/// Renderer construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    /// Vertices held by the geometry buffers before a forced flush.
    pub vertex_capacity: usize,
    /// Indices held by each index stream (lines, points, triangles).
    pub index_capacity: usize,
    /// World units → pixels at zoom 1.
    pub px_per_unit: f64,
    /// Upper bound for `cache_sin_cos` segment counts.
    pub sin_cos_cache_size: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            vertex_capacity: 1 << 16,
            index_capacity: 1 << 17,
            px_per_unit: 10.0,
            sin_cos_cache_size: 1024,
        }
    }
}

impl RendererConfig {
    /// Clamps out-of-range values to usable ones.
    pub fn validated(mut self) -> Self {
        if self.vertex_capacity < MIN_VERTEX_CAPACITY {
            log::warn!(
                "vertex_capacity {} too small; using {MIN_VERTEX_CAPACITY}",
                self.vertex_capacity
            );
            self.vertex_capacity = MIN_VERTEX_CAPACITY;
        }
        if self.index_capacity < MIN_INDEX_CAPACITY {
            log::warn!(
                "index_capacity {} too small; using {MIN_INDEX_CAPACITY}",
                self.index_capacity
            );
            self.index_capacity = MIN_INDEX_CAPACITY;
        }
        if !(self.px_per_unit.is_finite() && self.px_per_unit > 0.0) {
            log::warn!("px_per_unit {} invalid; using 1.0", self.px_per_unit);
            self.px_per_unit = 1.0;
        }
        if self.sin_cos_cache_size < 3 {
            self.sin_cos_cache_size = 3;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_already_valid() {
        let c = RendererConfig::default();
        assert_eq!(c.validated(), c);
    }

    #[test]
    fn tiny_capacities_are_raised() {
        let c = RendererConfig {
            vertex_capacity: 1,
            index_capacity: 0,
            px_per_unit: -3.0,
            sin_cos_cache_size: 0,
        }
        .validated();

        assert_eq!(c.vertex_capacity, MIN_VERTEX_CAPACITY);
        assert_eq!(c.index_capacity, MIN_INDEX_CAPACITY);
        assert_eq!(c.px_per_unit, 1.0);
        assert_eq!(c.sin_cos_cache_size, 3);
    }
}
