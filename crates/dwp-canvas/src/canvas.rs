//! Canvas Element
//!
//! Fixed-size canvas owning at most one 2D context.

use std::path::Path as FsPath;

use crate::context::RenderingContext;
use crate::surface::FrameView;
use crate::CanvasError;

/// Context types accepted by `getContext`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    TwoD,
}

impl ContextKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "2d" => Some(ContextKind::TwoD),
            _ => None,
        }
    }
}

/// Canvas element
#[derive(Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    context: Option<RenderingContext>,
}

impl Canvas {
    /// Create a canvas; the context is allocated on first request
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidSize { width, height });
        }
        Ok(Self {
            width,
            height,
            context: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `width` setter. The size is fixed; writing it only resets the context.
    pub fn set_width(&mut self, _width: f64) {
        self.reset_context();
    }

    /// `height` setter, same as `set_width`
    pub fn set_height(&mut self, _height: f64) {
        self.reset_context();
    }

    /// `getContext(type)`.
    ///
    /// Returns `Ok(None)` for unsupported types. Repeated requests return
    /// the same context.
    pub fn get_context(&mut self, kind: &str) -> Result<Option<&mut RenderingContext>, CanvasError> {
        if ContextKind::parse(kind).is_none() {
            tracing::warn!(kind, "Unsupported context type");
            return Ok(None);
        }

        if self.context.is_none() {
            self.context = Some(RenderingContext::new(self.width, self.height)?);
            tracing::debug!(width = self.width, height = self.height, "Created 2d context");
        }
        Ok(self.context.as_mut())
    }

    pub fn context(&self) -> Option<&RenderingContext> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut RenderingContext> {
        self.context.as_mut()
    }

    /// Pixels of the last drawn frame, if a context exists
    pub fn frame(&self) -> Option<FrameView<'_>> {
        self.context.as_ref().map(RenderingContext::frame)
    }

    /// Write the current pixels as PNG
    pub fn save_png(&self, path: impl AsRef<FsPath>) -> Result<(), CanvasError> {
        let context = self.context.as_ref().ok_or(CanvasError::NoContext)?;
        context.surface().save_png(path)
    }

    fn reset_context(&mut self) {
        if let Some(context) = self.context.as_mut() {
            context.reset();
        }
    }
}
