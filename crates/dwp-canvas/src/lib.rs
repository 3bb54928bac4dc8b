//! dwplay Canvas
//!
//! Canvas 2D drawing-state shim on top of tiny-skia.
//!
//! Features:
//! - CSS color literals (hex, rgb/rgba, hsl/hsla, a few names)
//! - Stateful 2D context: styles, globalAlpha, lineWidth, transforms
//! - Paths with arcs, fill and stroke (stroke keeps the path)
//! - Basic glyph fill for `fillText`
//! - Frame access with an explicit stride

mod canvas;
mod color;
mod context;
mod path;
mod surface;
mod text;
mod transform;

pub use canvas::{Canvas, ContextKind};
pub use color::{hsl_to_rgb, parse_color, Color};
pub use context::{ContextState, RenderingContext};
pub use path::{arc_sweep, Path, PathCommand, Point};
pub use surface::{Composite, DrawingSurface, FrameView};
pub use text::{Font, FontBook};
pub use transform::TransformMatrix;

/// Page background; `clearRect` and context resets paint this color
pub const BACKGROUND: Color = Color::WHITE;

/// Canvas error
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("Invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Canvas has no rendering context")]
    NoContext,

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
