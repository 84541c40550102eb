use super::backend::FlushData;
use super::buffers::Topology;

/// Per-frame debug counters, accumulated on every physical flush and reset
/// by `Renderer::swap_buffers`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Physical flushes, including empty ones.
    pub batches: u32,
    pub draw_calls: u32,
    pub vertices: u32,
    pub lines: u32,
    pub points: u32,
    pub triangles: u32,
}

impl FrameStats {
    pub(crate) fn record(&mut self, flush: &FlushData<'_>) {
        self.batches += 1;
        self.vertices += flush.buffers.vertex_count() as u32;

        for (topology, indices) in flush.draws() {
            self.draw_calls += 1;
            let n = indices.len() as u32;
            match topology {
                Topology::Lines => self.lines += n / 2,
                Topology::Points => self.points += n,
                Topology::Triangles => self.triangles += n / 3,
            }
        }
    }
}
