use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;
use crate::render::{Renderer, WgpuBackend};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called once per window after its renderer is created and before
    /// `Renderer::init`. Register render modes here.
    fn setup(&mut self, window_id: WindowId, renderer: &mut Renderer<WgpuBackend>) {
        let _ = (window_id, renderer);
    }

    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per rendered frame per window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
