use glam::Mat4;

use super::{FlushData, RenderBackend};
use crate::render::buffers::Topology;
use crate::render::mode::{RenderMode, RenderModeId, VertexLayout};

/// Copy of a flushed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFlush {
    pub mode: RenderModeId,
    pub layout: VertexLayout,
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub uv0: Vec<f32>,
    pub uv1: Vec<f32>,
    /// Draw calls in issue order.
    pub draws: Vec<(Topology, Vec<u32>)>,
}

impl RecordedFlush {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn indices(&self, topology: Topology) -> &[u32] {
        self.draws
            .iter()
            .find(|(t, _)| *t == topology)
            .map(|(_, i)| i.as_slice())
            .unwrap_or(&[])
    }

    /// xy of vertex `i`.
    pub fn position(&self, i: u32) -> [f32; 2] {
        let i = i as usize * 3;
        [self.positions[i], self.positions[i + 1]]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Open { mode: RenderModeId, transform: Mat4 },
    Flush(RecordedFlush),
}

/// Headless backend that records every open and flush.
///
/// Used by tests and for inspecting what a frame would submit.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub events: Vec<BackendEvent>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flushes(&self) -> impl Iterator<Item = &RecordedFlush> {
        self.events.iter().filter_map(|e| match e {
            BackendEvent::Flush(f) => Some(f),
            BackendEvent::Open { .. } => None,
        })
    }

    pub fn opens(&self) -> impl Iterator<Item = RenderModeId> + '_ {
        self.events.iter().filter_map(|e| match e {
            BackendEvent::Open { mode, .. } => Some(*mode),
            BackendEvent::Flush(_) => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn open_batch(&mut self, id: RenderModeId, _mode: &RenderMode, transform: &Mat4) {
        self.events.push(BackendEvent::Open { mode: id, transform: *transform });
    }

    fn flush(&mut self, batch: &FlushData<'_>) {
        let b = batch.buffers;
        let layout = batch.mode.layout();
        let uv_sets = layout.uv_sets();

        self.events.push(BackendEvent::Flush(RecordedFlush {
            mode: batch.id,
            layout,
            positions: b.positions().to_vec(),
            colors: b.colors().to_vec(),
            uv0: if uv_sets >= 1 { b.uv0().to_vec() } else { Vec::new() },
            uv1: if uv_sets >= 2 { b.uv1().to_vec() } else { Vec::new() },
            draws: batch.draws().map(|(t, i)| (t, i.to_vec())).collect(),
        }));
    }
}
