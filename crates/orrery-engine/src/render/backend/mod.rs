//! Device seam of the renderer.
//!
//! The batcher decides *when* a physical batch opens and flushes; a backend
//! decides *how* that reaches a device.

mod recording;
mod gpu;

pub use gpu::WgpuBackend;
pub use recording::{BackendEvent, RecordedFlush, RecordingBackend};

use glam::Mat4;

use super::buffers::{GeometryBuffers, Topology};
use super::mode::{RenderMode, RenderModeId};

/// One physical flush: the accumulated geometry and the mode that draws it.
#[derive(Debug)]
pub struct FlushData<'a> {
    pub id: RenderModeId,
    pub mode: &'a RenderMode,
    pub buffers: &'a GeometryBuffers,
}

impl<'a> FlushData<'a> {
    /// Non-empty index streams drawn for this mode's layout, one draw call each.
    pub fn draws(&self) -> impl Iterator<Item = (Topology, &'a [u32])> + 'a {
        let buffers = self.buffers;
        self.mode
            .layout()
            .topologies()
            .iter()
            .map(move |&t| (t, buffers.indices(t)))
            .filter(|(_, indices)| !indices.is_empty())
    }
}

pub trait RenderBackend {
    /// A physical batch opens for `mode`; `transform` is the camera transform
    /// in effect for every flush until the next open.
    fn open_batch(&mut self, id: RenderModeId, mode: &RenderMode, transform: &Mat4);

    /// Uploads `batch`'s attribute arrays up to the vertex cursor and issues
    /// one draw per entry of [`FlushData::draws`].
    fn flush(&mut self, batch: &FlushData<'_>);
}
