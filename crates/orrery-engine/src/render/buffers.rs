//! CPU-side geometry accumulated between flushes.
//!
//! Attributes live in parallel arrays sharing one vertex cursor; every vertex
//! carries both UV sets so any layout can upload a prefix of the arrays
//! without re-packing. Index streams are separate per primitive kind.

use crate::paint::Color;

pub const POSITION_COMPONENTS: usize = 3;
pub const COLOR_COMPONENTS: usize = 4;
pub const UV_COMPONENTS: usize = 2;

/// Primitive kind of an index stream.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Lines,
    Points,
    Triangles,
}

/// Space requested by an emitter. Index counts are raw indices, not primitives.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct GeometryCost {
    pub vertices: usize,
    pub lines: usize,
    pub points: usize,
    pub triangles: usize,
}

impl GeometryCost {
    #[inline]
    pub const fn vertices(n: usize) -> Self {
        Self { vertices: n, lines: 0, points: 0, triangles: 0 }
    }

    #[inline]
    pub const fn with_lines(mut self, indices: usize) -> Self {
        self.lines = indices;
        self
    }

    #[inline]
    pub const fn with_points(mut self, indices: usize) -> Self {
        self.points = indices;
        self
    }

    #[inline]
    pub const fn with_triangles(mut self, indices: usize) -> Self {
        self.triangles = indices;
        self
    }
}

/// Attributes written with every vertex besides its position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub depth: f32,
}

impl Default for Pen {
    fn default() -> Self {
        Self { color: Color::WHITE, depth: 0.0 }
    }
}

#[derive(Debug)]
pub struct GeometryBuffers {
    positions: Vec<f32>,
    colors: Vec<f32>,
    uv0: Vec<f32>,
    uv1: Vec<f32>,

    lines: Vec<u32>,
    points: Vec<u32>,
    triangles: Vec<u32>,

    vertex_capacity: usize,
    index_capacity: usize,
}

impl GeometryBuffers {
    pub fn new(vertex_capacity: usize, index_capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_capacity * POSITION_COMPONENTS),
            colors: Vec::with_capacity(vertex_capacity * COLOR_COMPONENTS),
            uv0: Vec::with_capacity(vertex_capacity * UV_COMPONENTS),
            uv1: Vec::with_capacity(vertex_capacity * UV_COMPONENTS),
            lines: Vec::with_capacity(index_capacity),
            points: Vec::with_capacity(index_capacity),
            triangles: Vec::with_capacity(index_capacity),
            vertex_capacity,
            index_capacity,
        }
    }

    /// Resets all cursors; allocations are kept.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.uv0.clear();
        self.uv1.clear();
        self.lines.clear();
        self.points.clear();
        self.triangles.clear();
    }

    #[inline]
    pub fn vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    #[inline]
    pub fn index_capacity(&self) -> usize {
        self.index_capacity
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / POSITION_COMPONENTS
    }

    /// Index the next pushed vertex will get.
    #[inline]
    pub fn next_index(&self) -> u32 {
        self.vertex_count() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Space left before any cursor hits its capacity.
    pub fn remaining(&self) -> GeometryCost {
        GeometryCost {
            vertices: self.vertex_capacity - self.vertex_count(),
            lines: self.index_capacity - self.lines.len(),
            points: self.index_capacity - self.points.len(),
            triangles: self.index_capacity - self.triangles.len(),
        }
    }

    /// True if `cost` can be written without exceeding any capacity.
    pub fn fits(&self, cost: GeometryCost) -> bool {
        let r = self.remaining();
        cost.vertices <= r.vertices
            && cost.lines <= r.lines
            && cost.points <= r.points
            && cost.triangles <= r.triangles
    }

    pub fn push_vertex(&mut self, pos: [f32; 2], pen: &Pen) -> u32 {
        self.push_textured_vertex(pos, pen, [0.0; 2], [0.0; 2])
    }

    pub fn push_textured_vertex(&mut self, pos: [f32; 2], pen: &Pen, uv0: [f32; 2], uv1: [f32; 2]) -> u32 {
        debug_assert!(self.vertex_count() < self.vertex_capacity, "vertex buffer overflow");
        let index = self.next_index();
        self.positions.extend_from_slice(&[pos[0], pos[1], pen.depth]);
        self.colors.extend_from_slice(&pen.color.to_array());
        self.uv0.extend_from_slice(&uv0);
        self.uv1.extend_from_slice(&uv1);
        index
    }

    pub fn push_line(&mut self, a: u32, b: u32) {
        debug_assert!(self.lines.len() + 2 <= self.index_capacity, "line index overflow");
        self.lines.extend_from_slice(&[a, b]);
    }

    pub fn push_point(&mut self, i: u32) {
        debug_assert!(self.points.len() < self.index_capacity, "point index overflow");
        self.points.push(i);
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        debug_assert!(self.triangles.len() + 3 <= self.index_capacity, "triangle index overflow");
        self.triangles.extend_from_slice(&[a, b, c]);
    }

    /// xy of an already written vertex.
    #[inline]
    pub fn position(&self, index: u32) -> [f32; 2] {
        let i = index as usize * POSITION_COMPONENTS;
        [self.positions[i], self.positions[i + 1]]
    }

    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    #[inline]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    #[inline]
    pub fn uv0(&self) -> &[f32] {
        &self.uv0
    }

    #[inline]
    pub fn uv1(&self) -> &[f32] {
        &self.uv1
    }

    #[inline]
    pub fn indices(&self, topology: Topology) -> &[u32] {
        match topology {
            Topology::Lines => &self.lines,
            Topology::Points => &self.points,
            Topology::Triangles => &self.triangles,
        }
    }
}
