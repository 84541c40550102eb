//! wgpu implementation of [`RenderBackend`].
//!
//! Attribute arrays are uploaded into capacity-sized vertex buffers (one per
//! attribute, slot == shader location) and index streams into three index
//! buffers. Every flush records and submits its own render pass that loads
//! the target, so flushes land on screen in call order.

mod pipeline;

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use super::{FlushData, RenderBackend};
use crate::paint::Color;
use crate::render::buffers::{Topology, COLOR_COMPONENTS, POSITION_COMPONENTS, UV_COMPONENTS};
use crate::render::config::RendererConfig;
use crate::render::ctx::RenderCtx;
use crate::render::mode::{RenderMode, RenderModeId, VertexLayout};

use pipeline::{TransformUniform, FLOAT, SLOT_STRIDES};

/// Texture units available to textured modes.
pub const TEXTURE_UNITS: usize = 2;

fn ibo_slot(t: Topology) -> usize {
    match t {
        Topology::Lines => 0,
        Topology::Points => 1,
        Topology::Triangles => 2,
    }
}

/// Pipelines built for one registered mode; rebuilt if the mode is replaced.
struct ModePipelines {
    mode: RenderMode,
    by_topology: HashMap<Topology, wgpu::RenderPipeline>,
}

pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    format: wgpu::TextureFormat,

    target: Option<wgpu::TextureView>,

    transform_ubo: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,

    /// One pipeline layout per vertex layout (0, 1 or 2 texture units).
    pipeline_layouts: [wgpu::PipelineLayout; 3],
    texture_bgls: [wgpu::BindGroupLayout; TEXTURE_UNITS],
    pipelines: HashMap<RenderModeId, ModePipelines>,

    sampler: wgpu::Sampler,
    white: wgpu::TextureView,
    textures: [Option<wgpu::TextureView>; TEXTURE_UNITS],
    /// Cached group 1 per unit count; dropped whenever a texture changes.
    texture_bind_groups: [Option<wgpu::BindGroup>; TEXTURE_UNITS],

    vbos: [wgpu::Buffer; 4],
    ibos: [wgpu::Buffer; 3],

    warned_no_target: bool,
}

impl WgpuBackend {
    pub fn new(ctx: &RenderCtx, config: &RendererConfig) -> Self {
        let device = &ctx.device;
        let config = config.validated();

        let transform_bgl = pipeline::transform_bgl(device);
        let texture_bgls = [pipeline::texture_bgl(device, 1), pipeline::texture_bgl(device, 2)];

        let pipeline_layout = |label: &str, groups: &[&wgpu::BindGroupLayout]| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: groups,
                immediate_size: 0,
            })
        };
        let pipeline_layouts = [
            pipeline_layout("orrery colored layout", &[&transform_bgl]),
            pipeline_layout("orrery textured layout", &[&transform_bgl, &texture_bgls[0]]),
            pipeline_layout("orrery multi-textured layout", &[&transform_bgl, &texture_bgls[1]]),
        ];

        let transform_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("orrery transform ubo"),
            size: std::mem::size_of::<TransformUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orrery transform bind group"),
            layout: &transform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_ubo.as_entire_binding(),
            }],
        });

        let vertices = config.vertex_capacity as u64;
        let vbo = |label: &str, components: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: vertices * components as u64 * FLOAT,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let vbos = [
            vbo("orrery positions vbo", POSITION_COMPONENTS),
            vbo("orrery colors vbo", COLOR_COMPONENTS),
            vbo("orrery uv0 vbo", UV_COMPONENTS),
            vbo("orrery uv1 vbo", UV_COMPONENTS),
        ];

        let ibo = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: config.index_capacity as u64 * std::mem::size_of::<u32>() as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let ibos = [
            ibo("orrery lines ibo"),
            ibo("orrery points ibo"),
            ibo("orrery triangles ibo"),
        ];

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("orrery sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let white = upload_rgba8(device, &ctx.queue, "orrery white texture", 1, 1, &[255; 4]);

        Self {
            device: Arc::clone(&ctx.device),
            queue: Arc::clone(&ctx.queue),
            format: ctx.surface_format,
            target: None,
            transform_ubo,
            transform_bind_group,
            pipeline_layouts,
            texture_bgls,
            pipelines: HashMap::new(),
            sampler,
            white,
            textures: [None, None],
            texture_bind_groups: [None, None],
            vbos,
            ibos,
            warned_no_target: false,
        }
    }

    // ── target ────────────────────────────────────────────────────────────

    /// Color target of every following flush.
    pub fn set_target(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    pub fn take_target(&mut self) -> Option<wgpu::TextureView> {
        self.target.take()
    }

    /// Clears the target; ordered with the flushes around it.
    pub fn clear(&mut self, color: Color) {
        let Some(target) = self.target.as_ref() else { return };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("orrery clear encoder"),
        });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("orrery clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    // ── textures ──────────────────────────────────────────────────────────

    /// Binds `view` to texture `unit` (0 or 1) for textured modes.
    ///
    /// Takes effect at the next flush; restart the batch first if geometry
    /// already emitted must keep the previous texture.
    pub fn bind_texture(&mut self, unit: usize, view: wgpu::TextureView) {
        let Some(slot) = self.textures.get_mut(unit) else {
            log::warn!("texture unit {unit} out of range (0..{TEXTURE_UNITS})");
            return;
        };
        *slot = Some(view);
        self.texture_bind_groups = [None, None];
    }

    /// Reverts `unit` to the built-in 1x1 white texture.
    pub fn unbind_texture(&mut self, unit: usize) {
        if let Some(slot) = self.textures.get_mut(unit) {
            *slot = None;
            self.texture_bind_groups = [None, None];
        }
    }

    /// Uploads tightly packed RGBA8 pixels into a new sampled texture.
    pub fn create_texture_rgba8(&self, label: &str, width: u32, height: u32, pixels: &[u8]) -> wgpu::TextureView {
        upload_rgba8(&self.device, &self.queue, label, width, height, pixels)
    }

    // ── private helpers ───────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, id: RenderModeId, mode: &RenderMode) {
        if self.pipelines.get(&id).is_some_and(|p| p.mode == *mode) {
            return;
        }

        let layout = &self.pipeline_layouts[mode.layout().uv_sets()];
        let by_topology = mode
            .layout()
            .topologies()
            .iter()
            .map(|&t| (t, pipeline::create_pipeline(&self.device, self.format, layout, mode, t)))
            .collect();

        log::debug!("built pipelines for render mode {id:?} ({:?})", mode.layout());
        self.pipelines.insert(id, ModePipelines { mode: mode.clone(), by_topology });
    }

    /// Group 1 for textured layouts, built on demand.
    fn ensure_texture_bind_group(&mut self, layout: VertexLayout) {
        let units = layout.uv_sets();
        if units == 0 || self.texture_bind_groups[units - 1].is_some() {
            return;
        }

        let unit0 = self.textures[0].as_ref().unwrap_or(&self.white);
        let unit1 = self.textures[1].as_ref().unwrap_or(&self.white);

        let mut entries = vec![
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(unit0) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
        ];
        if units > 1 {
            entries.push(wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(unit1) });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orrery texture bind group"),
            layout: &self.texture_bgls[units - 1],
            entries: &entries,
        });
        self.texture_bind_groups[units - 1] = Some(bind_group);
    }
}

impl RenderBackend for WgpuBackend {
    fn open_batch(&mut self, id: RenderModeId, mode: &RenderMode, transform: &Mat4) {
        self.ensure_pipelines(id, mode);
        self.queue.write_buffer(
            &self.transform_ubo,
            0,
            bytemuck::bytes_of(&TransformUniform { matrix: transform.to_cols_array_2d() }),
        );
    }

    fn flush(&mut self, batch: &FlushData<'_>) {
        let buffers = batch.buffers;
        if buffers.is_empty() {
            return;
        }
        if self.target.is_none() {
            if !self.warned_no_target {
                log::debug!("flush without a render target; geometry dropped");
                self.warned_no_target = true;
            }
            return;
        }

        let layout = batch.mode.layout();
        self.ensure_pipelines(batch.id, batch.mode);
        self.ensure_texture_bind_group(layout);

        let (Some(target), Some(pipelines)) = (self.target.as_ref(), self.pipelines.get(&batch.id)) else {
            return;
        };

        let slots = pipeline::slot_count(layout);
        let arrays: [&[f32]; 4] = [buffers.positions(), buffers.colors(), buffers.uv0(), buffers.uv1()];
        for (vbo, data) in self.vbos.iter().zip(arrays).take(slots) {
            self.queue.write_buffer(vbo, 0, bytemuck::cast_slice(data));
        }
        for (t, indices) in batch.draws() {
            self.queue.write_buffer(&self.ibos[ibo_slot(t)], 0, bytemuck::cast_slice(indices));
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("orrery flush encoder"),
        });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("orrery flush pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &self.transform_bind_group, &[]);
            if let Some(units) = layout.uv_sets().checked_sub(1) {
                if let Some(bg) = self.texture_bind_groups[units].as_ref() {
                    rpass.set_bind_group(1, bg, &[]);
                }
            }

            let vertices = buffers.vertex_count() as u64;
            for (slot, vbo) in self.vbos.iter().enumerate().take(slots) {
                rpass.set_vertex_buffer(slot as u32, vbo.slice(..vertices * SLOT_STRIDES[slot]));
            }

            for (t, indices) in batch.draws() {
                let Some(pipeline) = pipelines.by_topology.get(&t) else { continue };
                let count = indices.len() as u32;
                rpass.set_pipeline(pipeline);
                rpass.set_index_buffer(
                    self.ibos[ibo_slot(t)].slice(..u64::from(count) * 4),
                    wgpu::IndexFormat::Uint32,
                );
                rpass.draw_indexed(0..count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn upload_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> wgpu::TextureView {
    let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_slots_are_distinct() {
        let mut slots: Vec<usize> = [Topology::Lines, Topology::Points, Topology::Triangles]
            .into_iter()
            .map(ibo_slot)
            .collect();
        slots.sort_unstable();
        assert_eq!(slots, vec![0, 1, 2]);
    }
}
