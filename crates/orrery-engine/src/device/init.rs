/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: renderer colors are written to the target unconverted.
    pub prefer_srgb: bool,

    /// FIFO is supported everywhere and caps the loop at the display rate.
    pub present_mode: wgpu::PresentMode,

    /// Alpha mode preference; an unsupported choice falls back to the first
    /// mode the surface reports.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Hint only; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
