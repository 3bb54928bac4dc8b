//! Drawing Surface
//!
//! Thin stateful wrapper over a tiny-skia `Pixmap`. Like most immediate-mode
//! rasterizers it keeps its own current color, opacity, blend mode, line
//! width and transform; callers reassert whatever they need before each draw.

use std::path::Path as FsPath;

use tiny_skia::{FillRule, Paint, Pixmap, Rect, Stroke};

use crate::color::Color;
use crate::path::Path;
use crate::transform::TransformMatrix;
use crate::CanvasError;

/// Composition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    /// Blend over the destination
    #[default]
    SourceOver,
    /// Overwrite the destination
    Copy,
}

impl Composite {
    fn to_tiny_skia(self) -> tiny_skia::BlendMode {
        match self {
            Composite::SourceOver => tiny_skia::BlendMode::SourceOver,
            Composite::Copy => tiny_skia::BlendMode::Source,
        }
    }
}

/// Pixel surface plus rasterizer state
pub struct DrawingSurface {
    pixmap: Pixmap,
    color: Color,
    opacity: f64,
    composite: Composite,
    line_width: f64,
    transform: TransformMatrix,
}

impl DrawingSurface {
    /// Allocate a surface cleared to `background`
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, CanvasError> {
        let pixmap = Pixmap::new(width, height).ok_or(CanvasError::InvalidSize { width, height })?;

        let mut surface = Self {
            pixmap,
            color: Color::BLACK,
            opacity: 1.0,
            composite: Composite::SourceOver,
            line_width: 1.0,
            transform: TransformMatrix::identity(),
        };
        surface.clear(background);
        Ok(surface)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    // Rasterizer state

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Set the opacity multiplier, clamped to [0, 1]
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn set_composite(&mut self, composite: Composite) {
        self.composite = composite;
    }

    pub fn composite(&self) -> Composite {
        self.composite
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn set_transform(&mut self, transform: TransformMatrix) {
        self.transform = transform;
    }

    pub fn transform(&self) -> TransformMatrix {
        self.transform
    }

    // Primitives

    /// Fill every pixel with `color`, ignoring all other state
    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(color.to_tiny_skia());
    }

    /// Fill a rectangle given in user space
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let Some(rect) = normalized_rect(x, y, width, height) else {
            return;
        };
        let paint = self.create_paint();
        self.pixmap
            .fill_rect(rect, &paint, self.transform.to_tiny_skia(), None);
    }

    /// Stroke a rectangle outline given in user space
    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let mut outline = Path::new();
        outline.rect(&TransformMatrix::identity(), x, y, width, height);
        self.stroke_user_path(&outline);
    }

    /// Fill a device-space path with the non-zero winding rule
    pub fn fill_path(&mut self, path: &Path) {
        let Some(skia_path) = path.to_skia() else {
            return;
        };
        let paint = self.create_paint();
        self.pixmap.fill_path(
            &skia_path,
            &paint,
            FillRule::Winding,
            tiny_skia::Transform::identity(),
            None,
        );
    }

    /// Stroke a device-space path.
    ///
    /// The path is mapped back to user space so the current transform also
    /// scales the line width. Nothing is drawn under a singular transform.
    pub fn stroke_path(&mut self, path: &Path) {
        let Some(inverse) = self.transform.invert() else {
            return;
        };
        self.stroke_user_path(&path.transformed(&inverse));
    }

    /// Fill an already built path given in user space
    pub(crate) fn fill_user_path(&mut self, path: &tiny_skia::Path) {
        let paint = self.create_paint();
        self.pixmap.fill_path(
            path,
            &paint,
            FillRule::Winding,
            self.transform.to_tiny_skia(),
            None,
        );
    }

    fn stroke_user_path(&mut self, path: &Path) {
        if self.line_width <= 0.0 || !self.line_width.is_finite() {
            return;
        }
        let Some(skia_path) = path.to_skia() else {
            return;
        };
        let paint = self.create_paint();
        let stroke = Stroke {
            width: self.line_width as f32,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &skia_path,
            &paint,
            &stroke,
            self.transform.to_tiny_skia(),
            None,
        );
    }

    fn create_paint(&self) -> Paint<'static> {
        let mut color = self.color.to_tiny_skia();
        color.apply_opacity(self.opacity as f32);

        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        paint.blend_mode = self.composite.to_tiny_skia();
        paint
    }

    // Output

    /// Borrow the finished pixels
    pub fn frame(&self) -> FrameView<'_> {
        FrameView {
            data: self.pixmap.data(),
            width: self.pixmap.width(),
            height: self.pixmap.height(),
            stride: self.pixmap.width() as usize * 4,
        }
    }

    /// Encode the surface as PNG at `path`
    pub fn save_png(&self, path: impl AsRef<FsPath>) -> Result<(), CanvasError> {
        self.pixmap
            .save_png(path)
            .map_err(|e| CanvasError::Encode(e.to_string()))
    }
}

impl std::fmt::Debug for DrawingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("color", &self.color)
            .field("opacity", &self.opacity)
            .field("composite", &self.composite)
            .finish()
    }
}

/// Canvas semantics allow negative extents; tiny-skia does not
fn normalized_rect(x: f64, y: f64, width: f64, height: f64) -> Option<Rect> {
    let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
    let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
    Rect::from_xywh(x as f32, y as f32, width as f32, height as f32)
}

/// Read-only view of a finished frame.
///
/// Rows are `stride` bytes apart; a row may be longer than `width * 4`.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> FrameView<'a> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row length in bytes
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw premultiplied RGBA bytes
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Premultiplied pixel as `0xAARRGGBB`; transparent black outside the frame
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let offset = y as usize * self.stride + x as usize * 4;
        match self.data.get(offset..offset + 4) {
            Some(&[r, g, b, a]) => u32::from_be_bytes([a, r, g, b]),
            _ => 0,
        }
    }

    /// Pixel as a straight-alpha color
    pub fn color_at(&self, x: u32, y: u32) -> Color {
        let argb = self.pixel(x, y);
        let a = (argb >> 24) as u8;
        if a == 0 {
            return Color::TRANSPARENT;
        }
        let unmultiply = |channel: u32| -> u8 {
            let c = channel & 0xFF;
            ((c * 255 + a as u32 / 2) / a as u32).min(255) as u8
        };
        Color::rgba(unmultiply(argb >> 16), unmultiply(argb >> 8), unmultiply(argb), a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> DrawingSurface {
        DrawingSurface::new(20, 20, Color::WHITE).unwrap()
    }

    #[test]
    fn test_new_surface_is_background() {
        let s = surface();
        assert_eq!(s.frame().pixel(0, 0), 0xFFFFFFFF);
        assert_eq!(s.frame().pixel(19, 19), 0xFFFFFFFF);
        assert_eq!(s.frame().stride(), 80);
    }

    #[test]
    fn test_zero_size_is_error() {
        assert!(matches!(
            DrawingSurface::new(0, 10, Color::WHITE),
            Err(CanvasError::InvalidSize { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_fill_rect_uses_current_color() {
        let mut s = surface();
        s.set_color(Color::rgb(255, 0, 0));
        s.fill_rect(5.0, 5.0, 10.0, 10.0);
        assert_eq!(s.frame().pixel(10, 10), 0xFFFF0000);
        assert_eq!(s.frame().pixel(2, 2), 0xFFFFFFFF);
    }

    #[test]
    fn test_negative_extent_rect() {
        let mut s = surface();
        s.set_color(Color::BLACK);
        s.fill_rect(15.0, 15.0, -10.0, -10.0);
        assert_eq!(s.frame().pixel(10, 10), 0xFF000000);
    }

    #[test]
    fn test_opacity_blends_over_background() {
        let mut s = surface();
        s.set_color(Color::BLACK);
        s.set_opacity(0.5);
        s.fill_rect(0.0, 0.0, 20.0, 20.0);
        let c = s.frame().color_at(10, 10);
        assert_eq!(c.a, 255);
        assert!((126..=129).contains(&c.r), "got {}", c.r);
    }

    #[test]
    fn test_copy_composite_overwrites() {
        let mut s = surface();
        s.set_color(Color::rgba(0, 0, 255, 0));
        s.set_composite(Composite::Copy);
        s.fill_rect(0.0, 0.0, 20.0, 20.0);
        assert_eq!(s.frame().pixel(10, 10), 0);
    }

    #[test]
    fn test_pixel_outside_frame() {
        assert_eq!(surface().frame().pixel(20, 0), 0);
    }
}
