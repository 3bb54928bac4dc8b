//! Text
//!
//! `font` property parsing and basic glyph fill. Glyph outlines come from a
//! system font found with fontdb and are converted to tiny-skia paths. There
//! is no shaping and no metrics API: one glyph per `char`, advanced by its
//! horizontal advance.

use std::cell::OnceCell;
use std::fmt;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

/// Parsed `font` property (`"<size>px <family>"`)
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub size: f64,
    pub family: String,
}

impl Font {
    /// Parse a CSS font shorthand, keeping only size and family.
    ///
    /// Style and weight keywords before the size are skipped.
    pub fn parse(text: &str) -> Option<Font> {
        let mut rest = text.trim();
        loop {
            let (token, tail) = match rest.split_once(char::is_whitespace) {
                Some((token, tail)) => (token, tail.trim_start()),
                None => return None,
            };
            if let Some(size) = token.strip_suffix("px").and_then(|n| n.parse::<f64>().ok()) {
                let family = tail.trim();
                if !size.is_finite() || size < 0.0 || family.is_empty() {
                    return None;
                }
                return Some(Font {
                    size,
                    family: family.to_string(),
                });
            }
            rest = tail;
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Font {
            size: 10.0,
            family: "sans-serif".to_string(),
        }
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size, self.family)
    }
}

/// Lazily loaded system font database
pub struct FontBook {
    db: OnceCell<Database>,
    warned: bool,
}

impl FontBook {
    /// Fonts are loaded from the system on first use
    pub fn new() -> Self {
        Self {
            db: OnceCell::new(),
            warned: false,
        }
    }

    /// Use an already populated database
    pub fn with_database(db: Database) -> Self {
        Self {
            db: OnceCell::from(db),
            warned: false,
        }
    }

    fn database(&self) -> &Database {
        self.db.get_or_init(|| {
            let mut db = Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "Loaded system fonts");
            db
        })
    }

    /// Outline `text` with its baseline origin at `(x, y)` in user space.
    ///
    /// Returns `None` when nothing can be drawn; a missing font is reported
    /// once per book.
    pub fn outline(&mut self, font: &Font, text: &str, x: f64, y: f64) -> Option<tiny_skia::Path> {
        let db = self.database();
        let families: Vec<Family> = font
            .family
            .split(',')
            .map(|name| generic_family(name.trim().trim_matches(|c| c == '"' || c == '\'')))
            .chain(std::iter::once(Family::SansSerif))
            .collect();
        let id = db.query(&Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        });

        let Some(id) = id else {
            if !self.warned {
                tracing::warn!(font = %font, "No usable font found, fillText draws nothing");
                self.warned = true;
            }
            return None;
        };

        db.with_face_data(id, |data, index| {
            let face = Face::parse(data, index).ok()?;
            outline_run(&face, text, font.size as f32, x as f32, y as f32)
        })
        .flatten()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontBook")
            .field("loaded", &self.db.get().is_some())
            .finish()
    }
}

fn generic_family(name: &str) -> Family<'_> {
    match name {
        "serif" => Family::Serif,
        "sans-serif" => Family::SansSerif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

/// Lay out one line of glyphs left to right and collect their outlines
fn outline_run(face: &Face<'_>, text: &str, size: f32, x: f32, y: f32) -> Option<tiny_skia::Path> {
    let units_per_em = face.units_per_em();
    if units_per_em == 0 {
        return None;
    }
    let scale = size / units_per_em as f32;

    let mut builder = tiny_skia::PathBuilder::new();
    let mut pen_x = x;
    for ch in text.chars() {
        let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
        let mut outline = GlyphOutline {
            builder: &mut builder,
            scale,
            origin_x: pen_x,
            baseline: y,
        };
        face.outline_glyph(glyph, &mut outline);
        pen_x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
    }
    builder.finish()
}

/// Converts ttf-parser outlines (font units, Y up) to canvas space (Y down)
struct GlyphOutline<'a> {
    builder: &'a mut tiny_skia::PathBuilder,
    scale: f32,
    origin_x: f32,
    baseline: f32,
}

impl GlyphOutline<'_> {
    fn x(&self, x: f32) -> f32 {
        self.origin_x + x * self.scale
    }

    fn y(&self, y: f32) -> f32 {
        self.baseline - y * self.scale // Flip Y axis
    }
}

impl OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.x(x), self.y(y));
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.x(x), self.y(y));
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1, x, y) = (self.x(x1), self.y(y1), self.x(x), self.y(y));
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = (self.x(x1), self.y(y1));
        let (x2, y2) = (self.x(x2), self.y(y2));
        let (x, y) = (self.x(x), self.y(y));
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_font() {
        let font = Font::parse("40px Arial").unwrap();
        assert_eq!(font.size, 40.0);
        assert_eq!(font.family, "Arial");
    }

    #[test]
    fn test_parse_font_with_keywords() {
        let font = Font::parse("bold italic 12.5px  Times New Roman").unwrap();
        assert_eq!(font.size, 12.5);
        assert_eq!(font.family, "Times New Roman");
    }

    #[test]
    fn test_parse_font_rejects_garbage() {
        assert!(Font::parse("huge").is_none());
        assert!(Font::parse("12px").is_none());
        assert!(Font::parse("").is_none());
        assert!(Font::parse("-3px serif").is_none());
    }

    #[test]
    fn test_font_display() {
        assert_eq!(Font::default().to_string(), "10px sans-serif");
        assert_eq!(Font::parse("9.5px mono").unwrap().to_string(), "9.5px mono");
    }

    #[test]
    fn test_empty_book_draws_nothing() {
        let mut book = FontBook::with_database(Database::new());
        assert!(book.outline(&Font::default(), "hi", 0.0, 10.0).is_none());
        assert!(book.warned);
    }

    #[test]
    fn test_outline_flips_y() {
        let mut builder = tiny_skia::PathBuilder::new();
        let mut outline = GlyphOutline {
            builder: &mut builder,
            scale: 0.5,
            origin_x: 10.0,
            baseline: 100.0,
        };
        outline.move_to(0.0, 0.0);
        outline.line_to(20.0, 40.0);
        outline.line_to(20.0, 0.0);
        outline.close();

        let path = builder.finish().unwrap();
        let bounds = path.bounds();
        assert_eq!(bounds.left(), 10.0);
        assert_eq!(bounds.right(), 20.0);
        assert_eq!(bounds.top(), 80.0);
        assert_eq!(bounds.bottom(), 100.0);
    }
}
