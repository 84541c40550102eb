//! Polyline assembly across forced flushes.
//!
//! Vertices are written as they arrive; line indices for a physical segment
//! are written when the segment closes (at `end` or before a flush). A line
//! that outlives a flush is stitched by re-emitting its last vertex in the new
//! buffer, and a closed line whose first vertex has been flushed away is
//! closed against a copy of that vertex.

use super::buffers::{GeometryBuffers, GeometryCost, Pen};

/// How consecutive vertices of a line connect.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LineKind {
    /// Independent segments: vertices pair up (0-1, 2-3, ...).
    Single,
    /// Open polyline.
    Strip,
    /// Closed polyline.
    Loop,
    /// Closed outline of a filled shape; tessellated like `Loop`.
    Filled,
}

impl LineKind {
    #[inline]
    pub fn closes(self) -> bool {
        matches!(self, LineKind::Loop | LineKind::Filled)
    }
}

#[derive(Debug, Default)]
pub(crate) struct LineAssembler {
    kind: Option<LineKind>,
    /// Buffer index of the first vertex of the current physical segment.
    base: u32,
    /// Vertices in the current physical segment.
    count: u32,
    /// The line's first vertex, kept once its segment has been split off.
    first: Option<[f32; 2]>,
    last: [f32; 2],
    /// The line has been split at least once.
    continued: bool,
    /// `last` is re-emitted before the next vertex of the line.
    stitch: bool,
}

impl LineAssembler {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }

    pub fn begin(&mut self, kind: LineKind, buffers: &GeometryBuffers) {
        #[cfg(debug_assertions)]
        if self.kind.is_some() {
            log::warn!("begin_line while a line is open; the open line is dropped");
        }

        *self = Self {
            kind: Some(kind),
            base: buffers.next_index(),
            ..Self::default()
        };
    }

    /// True if the buffer must be flushed before the next vertex.
    ///
    /// Keeps room for the vertex, a stitch vertex and the closing segment.
    /// Independent segments only split on a pair boundary.
    pub fn must_split(&self, buffers: &GeometryBuffers) -> bool {
        let Some(kind) = self.kind else { return false };

        let next = GeometryCost::vertices(3).with_lines(2 * self.count as usize + 4);
        if buffers.fits(next) {
            return false;
        }
        kind != LineKind::Single || self.count % 2 == 0
    }

    /// Closes the current physical segment, ahead of a flush or of other
    /// geometry written into the buffer.
    ///
    /// The next segment starts with a copy of the last vertex, written along
    /// with the line's next vertex into whatever buffer is current by then.
    pub fn split(&mut self, buffers: &mut GeometryBuffers) {
        let Some(kind) = self.kind else { return };
        if self.count == 0 {
            return;
        }
        if !self.continued {
            self.first = Some(buffers.position(self.base));
        }
        self.emit_segment(buffers);
        self.continued = true;
        self.stitch = kind != LineKind::Single || self.count % 2 == 1;
        self.count = 0;
    }

    pub fn push(&mut self, buffers: &mut GeometryBuffers, pos: [f32; 2], pen: &Pen) {
        self.write_stitch(buffers, pen);
        if self.count == 0 {
            self.base = buffers.next_index();
        }
        buffers.push_vertex(pos, pen);
        self.last = pos;
        self.count += 1;
    }

    /// Room `end` needs: a pending stitch vertex and, for closed lines, the
    /// closing segment plus the copy of the first vertex it may add.
    pub fn end_cost(&self) -> GeometryCost {
        let Some(kind) = self.kind else { return GeometryCost::vertices(0) };
        if !kind.closes() {
            return GeometryCost::vertices(0);
        }

        let stitch = usize::from(self.stitch);
        let n = self.count as usize + stitch;
        GeometryCost::vertices(stitch + usize::from(self.continued)).with_lines(2 * n.saturating_sub(1) + 2)
    }

    /// Finishes the line. Returns false if no line was open.
    pub fn end(&mut self, buffers: &mut GeometryBuffers, pen: &Pen) -> bool {
        let Some(kind) = self.kind else { return false };

        if kind.closes() {
            self.write_stitch(buffers, pen);
        }
        self.emit_segment(buffers);

        if kind.closes() {
            let last = self.base + self.count.saturating_sub(1);
            match self.first {
                Some(first) if self.continued => {
                    if self.count > 0 {
                        let i = buffers.push_vertex(first, pen);
                        buffers.push_line(last, i);
                    }
                }
                _ => {
                    if self.count >= 2 {
                        buffers.push_line(last, self.base);
                    }
                }
            }
        }

        *self = Self::default();
        true
    }

    fn write_stitch(&mut self, buffers: &mut GeometryBuffers, pen: &Pen) {
        if !self.stitch {
            return;
        }
        self.stitch = false;
        self.base = buffers.next_index();
        buffers.push_vertex(self.last, pen);
        self.count = 1;
    }

    fn emit_segment(&self, buffers: &mut GeometryBuffers) {
        let Some(kind) = self.kind else { return };
        if self.count < 2 {
            return;
        }

        match kind {
            LineKind::Single => {
                for i in (0..self.count - 1).step_by(2) {
                    buffers.push_line(self.base + i, self.base + i + 1);
                }
            }
            LineKind::Strip | LineKind::Loop | LineKind::Filled => {
                for i in 0..self.count - 1 {
                    buffers.push_line(self.base + i, self.base + i + 1);
                }
            }
        }
    }
}
