use std::sync::Arc;

/// Device handles a GPU backend is built from.
#[derive(Clone)]
pub struct RenderCtx {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub surface_format: wgpu::TextureFormat,
}

impl RenderCtx {
    #[inline]
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, surface_format: wgpu::TextureFormat) -> Self {
        Self { device, queue, surface_format }
    }
}
