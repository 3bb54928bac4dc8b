//! CSS Color Literals
//!
//! Parses the color strings scripts assign to `fillStyle` and `strokeStyle`.
//! Parsing is total: a literal that is not understood resolves to opaque
//! black instead of failing, so a typo never stops a running animation.

use std::fmt;

/// Color (RGBA, straight alpha)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build a color from unclamped channel values and a float alpha.
    ///
    /// Channels are clamped to `0..=255` and truncated; alpha is clamped to
    /// `0.0..=1.0` before being scaled to the nearest byte.
    pub fn from_channels(r: f64, g: f64, b: f64, alpha: f64) -> Self {
        Self {
            r: channel_to_byte(r),
            g: channel_to_byte(g),
            b: channel_to_byte(b),
            a: unit_to_byte(alpha),
        }
    }

    /// Unpack a `0xAARRGGBB` word
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Pack into a `0xAARRGGBB` word
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Alpha as a float in `0.0..=1.0`
    pub fn alpha(self) -> f64 {
        byte_to_unit(self.a)
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Convert to tiny-skia color
    pub fn to_tiny_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Serializes the way a browser reports `fillStyle`: `#rrggbb` for opaque
/// colors, `rgba(r, g, b, a)` otherwise.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let alpha = (self.alpha() * 1000.0).round() / 1000.0;
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
        }
    }
}

fn channel_to_byte(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0) as u8
}

/// Rounds to nearest so exact bytes survive any number of float round trips.
pub(crate) fn unit_to_byte(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub(crate) fn byte_to_unit(byte: u8) -> f64 {
    byte as f64 / 255.0
}

/// Parse a CSS color literal.
///
/// Recognized forms, checked in this order: `rgba()`, `rgb()`, `hsla()`,
/// `hsl()`, `#rrggbb`, `#rgb`, and the names `black`, `white`, `red`,
/// `green` and `blue`. Anything else is opaque black.
pub fn parse_color(text: &str) -> Color {
    let text = text.trim();

    if let Some(body) = text.strip_prefix("rgba(") {
        let [r, g, b, a] = components(body);
        return Color::from_channels(integer(r), integer(g), integer(b), a.unwrap_or(1.0));
    }

    if let Some(body) = text.strip_prefix("rgb(") {
        let [r, g, b] = components(body);
        return Color::from_channels(integer(r), integer(g), integer(b), 1.0);
    }

    if let Some(body) = text.strip_prefix("hsla(") {
        let [h, s, l, a] = components(body);
        let (r, g, b) = hsl_to_rgb(h.unwrap_or(0.0), percent(s), percent(l));
        return Color::from_channels(r, g, b, a.unwrap_or(1.0));
    }

    if let Some(body) = text.strip_prefix("hsl(") {
        let [h, s, l] = components(body);
        let (r, g, b) = hsl_to_rgb(h.unwrap_or(0.0), percent(s), percent(l));
        return Color::from_channels(r, g, b, 1.0);
    }

    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex);
    }

    named_color(text).unwrap_or(Color::BLACK)
}

fn named_color(name: &str) -> Option<Color> {
    const NAMED: [(&str, Color); 5] = [
        ("black", Color::rgb(0, 0, 0)),
        ("white", Color::rgb(255, 255, 255)),
        ("red", Color::rgb(255, 0, 0)),
        ("green", Color::rgb(0, 128, 0)),
        ("blue", Color::rgb(0, 0, 255)),
    ];

    NAMED
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, color)| *color)
}

/// `#rrggbb` or `#rgb`; other lengths are black. Channels after the first
/// bad digit stay zero.
fn parse_hex(hex: &str) -> Color {
    let (width, scale) = match hex.len() {
        6 => (2, 1),
        3 => (1, 17),
        _ => return Color::BLACK,
    };

    let mut channels = [0u8; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        let digits = hex.get(i * width..(i + 1) * width);
        match digits.and_then(|d| u8::from_str_radix(d, 16).ok()) {
            Some(value) => *channel = value * scale,
            None => break,
        }
    }

    Color::rgb(channels[0], channels[1], channels[2])
}

/// Split the comma separated arguments of a functional notation.
///
/// Parsing stops at the first component that is not a number; it and every
/// later slot stay `None`.
fn components<const N: usize>(body: &str) -> [Option<f64>; N] {
    let body = match body.find(')') {
        Some(end) => &body[..end],
        None => body,
    };

    let mut out = [None; N];
    for (slot, part) in out.iter_mut().zip(body.split(',')) {
        match leading_number(part.trim_start()) {
            Some(value) => *slot = Some(value),
            None => break,
        }
    }
    out
}

fn integer(value: Option<f64>) -> f64 {
    value.map(f64::trunc).unwrap_or(0.0)
}

fn percent(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0) / 100.0
}

/// Parse the longest decimal number at the start of `text`, ignoring any
/// trailing unit such as `%`.
fn leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

/// Convert HSL to RGB channels in `0.0..=255.0`.
///
/// Hue is in degrees and wraps into `[0, 360)`; saturation and lightness are
/// fractions clamped to `[0, 1]`.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let h = if h.is_finite() { h.rem_euclid(360.0) } else { 0.0 };
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let offset = chroma * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let matched = l - chroma / 2.0;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (chroma, offset, 0.0),
        1 => (offset, chroma, 0.0),
        2 => (0.0, chroma, offset),
        3 => (0.0, offset, chroma),
        4 => (offset, 0.0, chroma),
        _ => (chroma, 0.0, offset),
    };

    ((r + matched) * 255.0, (g + matched) * 255.0, (b + matched) * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_six_digits() {
        assert_eq!(parse_color("#ff8000"), Color::rgb(255, 128, 0));
        assert_eq!(parse_color("#0A0b0C"), Color::rgb(10, 11, 12));
    }

    #[test]
    fn test_hex_three_digits() {
        assert_eq!(parse_color("#1ab"), Color::rgb(0x11, 0xaa, 0xbb));
        assert_eq!(parse_color("#fff"), Color::WHITE);
    }

    #[test]
    fn test_hex_bad_lengths() {
        assert_eq!(parse_color("#"), Color::BLACK);
        assert_eq!(parse_color("#12345"), Color::BLACK);
        assert_eq!(parse_color("#1234567"), Color::BLACK);
    }

    #[test]
    fn test_hex_stops_at_bad_digit() {
        assert_eq!(parse_color("#12zz56"), Color::rgb(0x12, 0, 0));
    }

    #[test]
    fn test_rgb_and_rgba() {
        assert_eq!(parse_color("rgb(1,2,3)"), Color::rgb(1, 2, 3));
        assert_eq!(parse_color("rgb(10, 20, 30)"), Color::rgb(10, 20, 30));
        assert_eq!(parse_color("rgba(255,0,0,0.5)"), Color::rgba(255, 0, 0, 128));
        assert_eq!(parse_color("rgba(0,0,0,0)"), Color::TRANSPARENT);
    }

    #[test]
    fn test_rgb_clamps_on_store() {
        assert_eq!(parse_color("rgb(300,-5,12.9)"), Color::rgb(255, 0, 12));
        assert_eq!(parse_color("rgba(1,2,3,7)"), Color::rgb(1, 2, 3));
        assert_eq!(parse_color("rgba(1,2,3,-1)"), Color::rgba(1, 2, 3, 0));
    }

    #[test]
    fn test_rgb_partial_keeps_defaults() {
        assert_eq!(parse_color("rgb(9,x,4)"), Color::rgb(9, 0, 0));
        assert_eq!(parse_color("rgba(9,8,7)"), Color::rgb(9, 8, 7));
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(parse_color("hsl(0,100%,50%)"), Color::rgb(255, 0, 0));
        assert_eq!(parse_color("hsl(120,100%,50%)"), Color::rgb(0, 255, 0));
        assert_eq!(parse_color("hsl(240,100%,50%)"), Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_hsl_wraps_hue() {
        assert_eq!(parse_color("hsl(360,100%,50%)"), parse_color("hsl(0,100%,50%)"));
        assert_eq!(parse_color("hsl(-120,100%,50%)"), parse_color("hsl(240,100%,50%)"));
        assert_eq!(parse_color("hsl(480,100%,50%)"), parse_color("hsl(120,100%,50%)"));
    }

    #[test]
    fn test_hsla_alpha() {
        let color = parse_color("hsla(0,100%,50%,.2)");
        assert_eq!((color.r, color.g, color.b), (255, 0, 0));
        assert_eq!(color.a, 51);
    }

    #[test]
    fn test_hsl_lightness_extremes() {
        assert_eq!(parse_color("hsl(77,40%,100%)"), Color::WHITE);
        assert_eq!(parse_color("hsl(77,40%,0%)"), Color::BLACK);
        assert_eq!(parse_color("hsl(0,0%,150%)"), Color::WHITE);
    }

    #[test]
    fn test_named() {
        assert_eq!(parse_color("white"), Color::WHITE);
        assert_eq!(parse_color("red"), Color::rgb(255, 0, 0));
        assert_eq!(parse_color("green"), Color::rgb(0, 128, 0));
        assert_eq!(parse_color("Blue"), Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_unknown_is_black() {
        assert_eq!(parse_color(""), Color::BLACK);
        assert_eq!(parse_color("rebeccapurple"), Color::BLACK);
        assert_eq!(parse_color("[object Object]"), Color::BLACK);
        assert_eq!(parse_color("#ééé"), Color::BLACK);
    }

    #[test]
    fn test_argb_round_trip() {
        let color = Color::rgba(1, 2, 3, 4);
        assert_eq!(color.to_argb(), 0x04010203);
        assert_eq!(Color::from_argb(color.to_argb()), color);
    }

    #[test]
    fn test_unit_round_trip_is_stable() {
        for byte in 0..=255u8 {
            assert_eq!(unit_to_byte(byte_to_unit(byte)), byte);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::rgb(255, 128, 0).to_string(), "#ff8000");
        assert_eq!(Color::rgba(1, 2, 3, 0).to_string(), "rgba(1, 2, 3, 0)");
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("12px"), Some(12.0));
        assert_eq!(leading_number("-.5"), Some(-0.5));
        assert_eq!(leading_number("1e2%"), Some(100.0));
        assert_eq!(leading_number("3e"), Some(3.0));
        assert_eq!(leading_number("."), None);
        assert_eq!(leading_number("abc"), None);
    }
}
