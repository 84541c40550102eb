use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::paint::Color;
use crate::render::{FrameStats, Renderer, WgpuBackend};
use crate::window::RuntimeCtx;

use super::app::AppControl;

pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in physical pixels.
    pub fn size_px(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// `'a` is the callback invocation, `'w` the window borrow carried by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub renderer: &'a mut Renderer<WgpuBackend>,
    pub runtime: &'a mut RuntimeCtx,
    /// Counters of the last frame drawn through [`FrameCtx::render`].
    pub stats: Option<FrameStats>,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the next swapchain image, clears it to `clear`, runs `draw`
    /// against the renderer and presents.
    ///
    /// Batches left open by `draw` are flushed before presenting.
    pub fn render<F>(&mut self, clear: Color, draw: F) -> AppControl
    where
        F: FnOnce(&mut Renderer<WgpuBackend>),
    {
        let frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface acquisition failed: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => AppControl::Continue,
                };
            }
        };

        let backend = self.renderer.backend_mut();
        backend.set_target(frame.target_view());
        backend.clear(clear);

        draw(&mut *self.renderer);

        let open = self.renderer.stack_depth();
        if open > 0 {
            log::warn!("{open} render batch(es) left open at end of frame");
            for _ in 0..open {
                self.renderer.end_render_batch();
            }
        }
        let stats = self.renderer.swap_buffers();
        log::trace!("frame: {stats:?}");
        self.stats = Some(stats);

        self.renderer.backend_mut().take_target();
        self.window.window.pre_present_notify();
        self.gpu.present(frame);

        AppControl::Continue
    }
}
