use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::time::FrameTime;

use super::app::AppControl;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback; `'w` is the window borrow held by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Framebuffer size in physical pixels.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.gpu.size();
        (size.width, size.height)
    }

    /// Acquires a frame, lets `encode` record into it and presents it.
    ///
    /// `encode` receives the frame encoder and the color target. Surface
    /// errors skip the frame, except fatal ones which end the app.
    pub fn render<F>(&mut self, encode: F) -> AppControl
    where
        F: FnOnce(&mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::warn!("surface error: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    _ => AppControl::Continue,
                };
            }
        };

        encode(&mut frame.encoder, &frame.view);

        self.window.pre_present_notify();
        self.gpu.submit(frame);
        AppControl::Continue
    }
}
