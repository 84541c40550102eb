//! Immediate-mode batched 2D renderer.
//!
//! Application code brackets drawing with `begin_render_batch` /
//! `end_render_batch` and emits primitives in between. Geometry accumulates
//! in fixed-capacity buffers and reaches the device in physical flushes,
//! triggered by the outermost `end_render_batch`, a vertex layout change or
//! a full buffer.
//!
//! Convention:
//! - World space is Y-up; the camera maps it through the viewport planes.
//! - Screen space is in pixels, top-left origin, +Y down.

mod buffers;
mod camera;
mod config;
mod ctx;
mod emit;
mod error;
mod line;
mod mode;
mod renderer;
mod stats;

pub mod backend;

pub use backend::{BackendEvent, FlushData, RecordedFlush, RecordingBackend, RenderBackend, WgpuBackend};
pub use buffers::{GeometryBuffers, GeometryCost, Pen, Topology};
pub use camera::{Camera, Projection};
pub use config::{RendererConfig, MIN_INDEX_CAPACITY, MIN_VERTEX_CAPACITY};
pub use ctx::RenderCtx;
pub use emit::{QuadUv, SinCosCache, FULL_QUAD_UV, SEGMENT_ANGLE, SEGMENT_MAX_PX, SEGMENT_MIN_PX};
pub use error::RenderError;
pub use line::LineKind;
pub use mode::{RenderMode, RenderModeId, RenderModes, ShaderSource, VertexLayout};
pub use renderer::Renderer;
pub use stats::FrameStats;
