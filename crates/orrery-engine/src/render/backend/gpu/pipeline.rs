//! Pipeline, bind group layout and vertex layout construction.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};

use crate::render::buffers::{Topology, COLOR_COMPONENTS, POSITION_COMPONENTS, UV_COMPONENTS};
use crate::render::mode::{RenderMode, ShaderSource, VertexLayout};

// ── uniforms ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct TransformUniform {
    pub matrix: [[f32; 4]; 4],
}

// ── vertex attributes ─────────────────────────────────────────────────────

/// Each attribute lives in its own buffer slot; slot == shader location.
const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x4];
const UV0_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];
const UV1_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x2];

pub(super) const FLOAT: u64 = std::mem::size_of::<f32>() as u64;

/// Bytes per vertex in slots 0..4.
pub(super) const SLOT_STRIDES: [u64; 4] = [
    POSITION_COMPONENTS as u64 * FLOAT,
    COLOR_COMPONENTS as u64 * FLOAT,
    UV_COMPONENTS as u64 * FLOAT,
    UV_COMPONENTS as u64 * FLOAT,
];

fn slot_layout(slot: usize, attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: SLOT_STRIDES[slot],
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// Vertex buffer slots a layout binds: position, color, then its UV sets.
pub(super) fn slot_count(layout: VertexLayout) -> usize {
    2 + layout.uv_sets()
}

fn vertex_layouts(layout: VertexLayout) -> Vec<wgpu::VertexBufferLayout<'static>> {
    let all = [
        slot_layout(0, &POSITION_ATTRS),
        slot_layout(1, &COLOR_ATTRS),
        slot_layout(2, &UV0_ATTRS),
        slot_layout(3, &UV1_ATTRS),
    ];
    all.into_iter().take(slot_count(layout)).collect()
}

// ── shaders ───────────────────────────────────────────────────────────────

fn shader_source(mode: &RenderMode) -> Cow<'static, str> {
    match mode.shader() {
        ShaderSource::Wgsl(src) => src.clone(),
        ShaderSource::Builtin => Cow::Borrowed(match mode.layout() {
            VertexLayout::Colored => include_str!("shaders/colored.wgsl"),
            VertexLayout::Textured => include_str!("shaders/textured.wgsl"),
            VertexLayout::MultiTextured => include_str!("shaders/multi_textured.wgsl"),
        }),
    }
}

pub(super) fn primitive_topology(t: Topology) -> wgpu::PrimitiveTopology {
    match t {
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
        Topology::Points => wgpu::PrimitiveTopology::PointList,
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
    }
}

// ── bind group layouts ────────────────────────────────────────────────────

pub(super) fn transform_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("orrery transform bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<TransformUniform>() as u64),
            },
            count: None,
        }],
    })
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Group 1: unit 0 at binding 0, the sampler at 1, unit 1 (if any) at 2.
pub(super) fn texture_bgl(device: &wgpu::Device, units: usize) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        texture_entry(0),
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ];
    if units > 1 {
        entries.push(texture_entry(2));
    }

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(if units > 1 { "orrery texture bgl x2" } else { "orrery texture bgl" }),
        entries: &entries,
    })
}

// ── pipelines ─────────────────────────────────────────────────────────────

pub(super) fn create_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    layout: &wgpu::PipelineLayout,
    mode: &RenderMode,
    topology: Topology,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("orrery mode shader"),
        source: wgpu::ShaderSource::Wgsl(shader_source(mode)),
    });
    let buffers = vertex_layouts(mode.layout());

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("orrery mode pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: primitive_topology(topology),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_layout() {
        assert_eq!(slot_count(VertexLayout::Colored), 2);
        assert_eq!(vertex_layouts(VertexLayout::MultiTextured).len(), 4);
        assert_eq!(vertex_layouts(VertexLayout::Textured)[2].attributes[0].shader_location, 2);
    }

    #[test]
    fn strides_match_components() {
        assert_eq!(SLOT_STRIDES, [12, 16, 8, 8]);
        assert_eq!(std::mem::size_of::<TransformUniform>(), 64);
    }

    #[test]
    fn custom_wgsl_overrides_builtin() {
        let mode = RenderMode::Colored(ShaderSource::Wgsl(Cow::Borrowed("// custom")));
        assert_eq!(shader_source(&mode), "// custom");
        assert!(shader_source(&RenderMode::textured()).contains("t_unit0"));
    }
}
