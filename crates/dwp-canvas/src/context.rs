//! Canvas 2D Rendering Context
//!
//! The subset of `CanvasRenderingContext2D` that short generative scripts
//! use. The context owns the drawing state; the surface underneath keeps its
//! own rasterizer state, so every draw call pushes the colors, opacity and
//! transform it needs right before drawing.

use crate::color::{parse_color, Color};
use crate::path::Path;
use crate::surface::{Composite, DrawingSurface, FrameView};
use crate::text::{Font, FontBook};
use crate::transform::TransformMatrix;
use crate::{CanvasError, BACKGROUND};

/// Drawing state saved and restored by `save()`/`restore()`
#[derive(Debug, Clone, PartialEq)]
pub struct ContextState {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub global_alpha: f64,
    pub line_width: f64,
    pub transform: TransformMatrix,
    pub font: Font,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            global_alpha: 1.0,
            line_width: 1.0,
            transform: TransformMatrix::identity(),
            font: Font::default(),
        }
    }
}

/// Canvas 2D rendering context
#[derive(Debug)]
pub struct RenderingContext {
    surface: DrawingSurface,
    state: ContextState,
    saved: Vec<ContextState>,
    path: Path,
    fonts: FontBook,
}

impl RenderingContext {
    /// Create a context with a surface cleared to the background
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        Ok(Self {
            surface: DrawingSurface::new(width, height, BACKGROUND)?,
            state: ContextState::default(),
            saved: Vec::new(),
            path: Path::new(),
            fonts: FontBook::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    /// Current drawing state
    pub fn state(&self) -> &ContextState {
        &self.state
    }

    /// Current path, in device space
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn frame(&self) -> FrameView<'_> {
        self.surface.frame()
    }

    /// Restore every default and clear the pixels to the background
    pub fn reset(&mut self) {
        self.state = ContextState::default();
        self.saved.clear();
        self.path = Path::new();

        self.surface.set_color(Color::BLACK);
        self.surface.set_opacity(1.0);
        self.surface.set_composite(Composite::SourceOver);
        self.surface.set_line_width(1.0);
        self.surface.set_transform(TransformMatrix::identity());
        self.surface.clear(BACKGROUND);

        tracing::debug!("Context reset");
    }

    // Style properties

    /// `fillStyle` getter
    pub fn fill_style(&self) -> String {
        self.state.fill_color.to_string()
    }

    /// `fillStyle` setter; unrecognized literals become black
    pub fn set_fill_style(&mut self, value: &str) {
        self.state.fill_color = parse_color(value);
    }

    pub fn stroke_style(&self) -> String {
        self.state.stroke_color.to_string()
    }

    pub fn set_stroke_style(&mut self, value: &str) {
        self.state.stroke_color = parse_color(value);
    }

    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    /// `globalAlpha` setter: clamps to [0, 1], ignores NaN
    pub fn set_global_alpha(&mut self, value: f64) {
        if value.is_nan() {
            tracing::trace!("Ignoring NaN globalAlpha");
            return;
        }
        self.state.global_alpha = value.clamp(0.0, 1.0);
    }

    pub fn line_width(&self) -> f64 {
        self.state.line_width
    }

    /// `lineWidth` setter; passed through as is except for non-finite values
    pub fn set_line_width(&mut self, value: f64) {
        if !value.is_finite() {
            tracing::trace!(value, "Ignoring non-finite lineWidth");
            return;
        }
        self.state.line_width = value;
    }

    pub fn font(&self) -> String {
        self.state.font.to_string()
    }

    /// `font` setter; values that don't parse are ignored
    pub fn set_font(&mut self, value: &str) {
        match Font::parse(value) {
            Some(font) => self.state.font = font,
            None => tracing::trace!(value, "Ignoring unparsable font"),
        }
    }

    // State stack

    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    /// Pop the last saved state; no-op when nothing was saved
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    // Transforms

    pub fn transform(&self) -> TransformMatrix {
        self.state.transform
    }

    pub fn scale(&mut self, x: f64, y: f64) {
        if finite(&[x, y]) {
            self.apply_transform(TransformMatrix::scale(x, y));
        }
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        if finite(&[x, y]) {
            self.apply_transform(TransformMatrix::translate(x, y));
        }
    }

    pub fn rotate(&mut self, angle: f64) {
        if finite(&[angle]) {
            self.apply_transform(TransformMatrix::rotate(angle));
        }
    }

    pub fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        if finite(&[a, b, c, d, e, f]) {
            self.state.transform = TransformMatrix::new(a, b, c, d, e, f);
        }
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = TransformMatrix::identity();
    }

    fn apply_transform(&mut self, m: TransformMatrix) {
        self.state.transform = self.state.transform.multiply(&m);
    }

    // Rectangles

    /// Fill a rectangle with the fill color at the current globalAlpha
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        if !finite(&[x, y, w, h]) {
            return;
        }
        self.sync_surface(self.state.fill_color);
        self.surface.fill_rect(x, y, w, h);
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        if !finite(&[x, y, w, h]) {
            return;
        }
        self.sync_surface(self.state.stroke_color);
        self.surface.set_line_width(self.state.line_width);
        self.surface.stroke_rect(x, y, w, h);
    }

    /// Paint the rectangle with the opaque page background.
    ///
    /// This deliberately does not clear to transparency. Opacity and the
    /// composition mode are forced for the call and restored afterwards.
    pub fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        if !finite(&[x, y, w, h]) {
            return;
        }
        self.surface.set_transform(self.state.transform);

        let opacity = self.surface.opacity();
        self.surface.set_opacity(1.0);
        self.surface.set_color(BACKGROUND);
        self.surface.set_composite(Composite::Copy);
        self.surface.fill_rect(x, y, w, h);
        self.surface.set_composite(Composite::SourceOver);
        self.surface.set_opacity(opacity);
    }

    // Paths

    pub fn begin_path(&mut self) {
        self.path = Path::new();
    }

    pub fn close_path(&mut self) {
        self.path.close_path();
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        if finite(&[x, y]) {
            self.path.move_to(&self.state.transform, x, y);
        }
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        if finite(&[x, y]) {
            self.path.line_to(&self.state.transform, x, y);
        }
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        if finite(&[x, y, w, h]) {
            self.path.rect(&self.state.transform, x, y, w, h);
        }
    }

    /// Append a circular arc; a negative radius is ignored
    pub fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, counterclockwise: bool) {
        if !finite(&[x, y, radius, start, end]) || radius < 0.0 {
            tracing::trace!(radius, "Ignoring arc");
            return;
        }
        self.path
            .arc(&self.state.transform, x, y, radius, start, end, counterclockwise);
    }

    /// Fill the current path (non-zero winding); the path is kept
    pub fn fill(&mut self) {
        self.sync_surface(self.state.fill_color);
        self.surface.fill_path(&self.path);
    }

    /// Stroke the current path; the path is kept for later calls
    pub fn stroke(&mut self) {
        self.sync_surface(self.state.stroke_color);
        self.surface.set_line_width(self.state.line_width);
        self.surface.stroke_path(&self.path);
    }

    // Text

    /// Fill `text` with its alphabetic baseline at `(x, y)`
    pub fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        if text.is_empty() || !finite(&[x, y]) {
            return;
        }
        let Some(outline) = self.fonts.outline(&self.state.font, text, x, y) else {
            return;
        };
        self.sync_surface(self.state.fill_color);
        self.surface.fill_user_path(&outline);
    }

    /// Push color, globalAlpha and transform into the rasterizer
    fn sync_surface(&mut self, color: Color) {
        self.surface.set_color(color);
        self.surface.set_opacity(self.state.global_alpha);
        self.surface.set_composite(Composite::SourceOver);
        self.surface.set_transform(self.state.transform);
    }
}

fn finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}
