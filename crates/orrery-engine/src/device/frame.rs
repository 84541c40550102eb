/// An acquired swapchain image.
///
/// Holding it blocks acquisition of the next one; hand it back through
/// `Gpu::present` once the renderer has flushed into it.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl GpuFrame {
    /// Another view of the frame's texture, for handing to a backend.
    pub fn target_view(&self) -> wgpu::TextureView {
        self.surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default())
    }
}
