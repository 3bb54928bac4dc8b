//! Window Presenter
//!
//! Shows frames in a winit window through a softbuffer surface.

use std::num::NonZeroU32;
use std::sync::Arc;

use dwp_canvas::FrameView;
use winit::window::Window;

use crate::frame_loop::Presenter;
use crate::PlayerError;

/// CPU presenter for one window
pub struct WindowPresenter {
    surface: softbuffer::Surface<Arc<Window>, Arc<Window>>,
    window: Arc<Window>,
    /// Scaled frame in softbuffer's `0x00RRGGBB` layout
    staging: Vec<u32>,
    staged_size: (u32, u32),
    quit: bool,
}

impl WindowPresenter {
    pub fn new(window: Arc<Window>) -> Result<Self, PlayerError> {
        let context =
            softbuffer::Context::new(window.clone()).map_err(|e| PlayerError::Surface(e.to_string()))?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(|e| PlayerError::Surface(e.to_string()))?;

        Ok(Self {
            surface,
            window,
            staging: Vec::new(),
            staged_size: (0, 0),
            quit: false,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Make the next `poll_quit` report true
    pub fn request_quit(&mut self) {
        self.quit = true;
    }
}

impl Presenter for WindowPresenter {
    fn update(&mut self, frame: &FrameView<'_>) -> Result<(), PlayerError> {
        let size = self.window.inner_size();
        self.staged_size = (size.width, size.height);
        self.staging.resize(size.width as usize * size.height as usize, 0);
        scale_nearest(frame, &mut self.staging, size.width, size.height);
        Ok(())
    }

    fn present(&mut self) -> Result<(), PlayerError> {
        let (width, height) = self.staged_size;
        // Minimized
        let (Some(width), Some(height)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return Ok(());
        };

        self.surface
            .resize(width, height)
            .map_err(|e| PlayerError::Surface(e.to_string()))?;
        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|e| PlayerError::Surface(e.to_string()))?;
        buffer.copy_from_slice(&self.staging);
        buffer.present().map_err(|e| PlayerError::Surface(e.to_string()))
    }

    fn poll_quit(&mut self) -> bool {
        self.quit
    }
}

/// Nearest-neighbour copy of `frame` into a `dst_width` x `dst_height`
/// buffer of `0x00RRGGBB` pixels
pub fn scale_nearest(frame: &FrameView<'_>, dst: &mut [u32], dst_width: u32, dst_height: u32) {
    if dst_width == 0 || dst_height == 0 {
        return;
    }
    let (src_width, src_height) = (u64::from(frame.width()), u64::from(frame.height()));
    let columns: Vec<u32> = (0..u64::from(dst_width))
        .map(|dx| (dx * src_width / u64::from(dst_width)) as u32)
        .collect();

    for (dy, row) in dst.chunks_exact_mut(dst_width as usize).enumerate() {
        if dy as u32 >= dst_height {
            break;
        }
        let sy = (dy as u64 * src_height / u64::from(dst_height)) as u32;
        for (pixel, &sx) in row.iter_mut().zip(&columns) {
            *pixel = frame.pixel(sx, sy) & 0x00FF_FFFF;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwp_canvas::Canvas;

    fn split_canvas() -> Canvas {
        // Left half black, right half red
        let mut canvas = Canvas::new(4, 2).unwrap();
        let ctx = canvas.get_context("2d").unwrap().unwrap();
        ctx.fill_rect(0.0, 0.0, 2.0, 2.0);
        ctx.set_fill_style("#ff0000");
        ctx.fill_rect(2.0, 0.0, 2.0, 2.0);
        canvas
    }

    #[test]
    fn test_downscale() {
        let canvas = split_canvas();
        let mut dst = vec![0xDEAD; 2];
        scale_nearest(&canvas.frame().unwrap(), &mut dst, 2, 1);
        assert_eq!(dst, [0x000000, 0xFF0000]);
    }

    #[test]
    fn test_upscale() {
        let canvas = split_canvas();
        let mut dst = vec![0; 8 * 4];
        scale_nearest(&canvas.frame().unwrap(), &mut dst, 8, 4);
        for row in dst.chunks(8) {
            assert_eq!(row, [0, 0, 0, 0, 0xFF0000, 0xFF0000, 0xFF0000, 0xFF0000]);
        }
    }

    #[test]
    fn test_empty_target() {
        let canvas = split_canvas();
        let mut dst: Vec<u32> = Vec::new();
        scale_nearest(&canvas.frame().unwrap(), &mut dst, 0, 0);
        assert!(dst.is_empty());
    }
}
