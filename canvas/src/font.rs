//! Text measurement and glyph outlines.
//!
//! Layout only needs advance widths; drawing additionally needs glyph
//! outlines. Both go through [`FontProvider`] so layout can be tested with the
//! deterministic [`ApproxMetrics`] while the renderer uses real faces from a
//! [`FontBook`]. [`FontBook::bundled`] always carries DejaVu Sans, so text is
//! painted even when no font directory is configured.

#[cfg(test)]
#[path = "font_test.rs"]
mod font_test;

use std::path::Path;
use std::sync::Arc;

use tiny_skia::PathBuilder;
use tracing::{debug, warn};
use ttf_parser::{Face, OutlineBuilder};

use crate::consts::{FALLBACK_ADVANCE_RATIO, FALLBACK_ASCENT_RATIO};

/// DejaVu Sans, shipped with the crate (license in `fonts/LICENSE-DejaVu.txt`).
pub const BUNDLED_FACE: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

/// Error returned when registering a font face.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("font face could not be parsed: {0}")]
    Parse(#[from] ttf_parser::FaceParsingError),
    #[error("font face has no family name")]
    MissingFamily,
    #[error("cannot read font file: {0}")]
    Io(#[from] std::io::Error),
}

/// A concrete font request in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size_px: f64,
    pub bold: bool,
    pub italic: bool,
}

impl FontSpec {
    #[must_use]
    pub fn new(family: impl Into<String>, size_px: f64) -> Self {
        Self { family: family.into(), size_px, bold: false, italic: false }
    }

    #[must_use]
    pub fn with_style(mut self, bold: bool, italic: bool) -> Self {
        self.bold = bold;
        self.italic = italic;
        self
    }
}

/// Measures text and produces glyph outlines in device pixels.
pub trait FontProvider {
    /// Advance width of `text` set in `font`.
    fn measure(&self, text: &str, font: &FontSpec) -> f64;

    /// Distance from the top of the em box to the baseline.
    fn ascent(&self, font: &FontSpec) -> f64 {
        font.size_px * FALLBACK_ASCENT_RATIO
    }

    /// Filled outline of `text` with its pen starting at `(x, baseline)`.
    ///
    /// Providers without glyph data return `None`; the text is then laid out
    /// but not painted.
    fn outline(&self, _text: &str, _font: &FontSpec, _x: f64, _baseline: f64) -> Option<tiny_skia::Path> {
        None
    }
}

/// Fixed-advance metrics: every character advances `advance_ratio` of the font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxMetrics {
    pub advance_ratio: f64,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self { advance_ratio: FALLBACK_ADVANCE_RATIO }
    }
}

impl FontProvider for ApproxMetrics {
    fn measure(&self, text: &str, font: &FontSpec) -> f64 {
        text.chars().count() as f64 * font.size_px * self.advance_ratio
    }
}

struct RegisteredFace {
    family: String,
    bold: bool,
    italic: bool,
    data: Arc<Vec<u8>>,
}

/// Registry of font faces keyed by lowercase family and style.
///
/// Lookups fall back from the exact style to any face of the family, then to
/// the first registered face, then to [`ApproxMetrics`].
#[derive(Default)]
pub struct FontBook {
    faces: Vec<RegisteredFace>,
    fallback: ApproxMetrics,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook").field("faces", &self.faces.len()).finish()
    }
}

impl FontBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A book holding only the bundled face. Every family resolves to it
    /// until more faces are registered.
    #[must_use]
    pub fn bundled() -> Self {
        let mut book = Self::new();
        match book.register_face(BUNDLED_FACE.to_vec()) {
            Ok(family) => debug!(family, "registered bundled font face"),
            Err(e) => warn!(error = %e, "bundled font face unusable; text will not be painted"),
        }
        book
    }

    /// Number of registered faces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Register a face under an explicit family and style.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Parse`] if the bytes are not a usable face.
    pub fn register(&mut self, family: &str, bold: bool, italic: bool, data: Vec<u8>) -> Result<(), FontError> {
        Face::parse(&data, 0)?;
        self.faces.push(RegisteredFace { family: family.to_lowercase(), bold, italic, data: Arc::new(data) });
        Ok(())
    }

    /// Register a face using the family name and style flags stored in the face itself.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Parse`] for unparsable data and
    /// [`FontError::MissingFamily`] when the face has no family name.
    pub fn register_face(&mut self, data: Vec<u8>) -> Result<String, FontError> {
        let (family, bold, italic) = {
            let face = Face::parse(&data, 0)?;
            let family = face
                .names()
                .into_iter()
                .filter(|name| name.name_id == ttf_parser::name_id::FAMILY)
                .find_map(|name| name.to_string())
                .ok_or(FontError::MissingFamily)?;
            (family, face.is_bold(), face.is_italic())
        };
        self.faces.push(RegisteredFace { family: family.to_lowercase(), bold, italic, data: Arc::new(data) });
        Ok(family)
    }

    /// Register every `.ttf` / `.otf` file in `dir`. Unusable files are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Io`] if the directory cannot be listed.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, FontError> {
        let mut loaded = 0;
        for entry in std::fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
            if !is_font {
                continue;
            }
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable font");
                    continue;
                }
            };
            match self.register_face(bytes) {
                Ok(family) => {
                    debug!(path = %path.display(), family, "registered font face");
                    loaded += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unusable font"),
            }
        }
        Ok(loaded)
    }

    fn resolve(&self, font: &FontSpec) -> Option<&RegisteredFace> {
        let family = font.family.to_lowercase();
        self.faces
            .iter()
            .find(|f| f.family == family && f.bold == font.bold && f.italic == font.italic)
            .or_else(|| self.faces.iter().find(|f| f.family == family))
            .or_else(|| self.faces.first())
    }

    fn with_face<T>(&self, font: &FontSpec, f: impl FnOnce(&Face<'_>) -> T) -> Option<T> {
        let registered = self.resolve(font)?;
        match Face::parse(&registered.data, 0) {
            Ok(face) => Some(f(&face)),
            Err(_) => None,
        }
    }
}

impl FontProvider for FontBook {
    fn measure(&self, text: &str, font: &FontSpec) -> f64 {
        let fallback_advance = font.size_px * self.fallback.advance_ratio;
        self.with_face(font, |face| {
            let scale = font.size_px / f64::from(face.units_per_em());
            text.chars()
                .map(|ch| {
                    face.glyph_index(ch)
                        .and_then(|g| face.glyph_hor_advance(g))
                        .map_or(fallback_advance, |adv| f64::from(adv) * scale)
                })
                .sum()
        })
        .unwrap_or_else(|| self.fallback.measure(text, font))
    }

    fn ascent(&self, font: &FontSpec) -> f64 {
        self.with_face(font, |face| f64::from(face.ascender()) * font.size_px / f64::from(face.units_per_em()))
            .unwrap_or(font.size_px * FALLBACK_ASCENT_RATIO)
    }

    fn outline(&self, text: &str, font: &FontSpec, x: f64, baseline: f64) -> Option<tiny_skia::Path> {
        self.with_face(font, |face| {
            let scale = (font.size_px / f64::from(face.units_per_em())) as f32;
            let fallback_advance = (font.size_px * self.fallback.advance_ratio) as f32;
            let mut builder = GlyphPathBuilder { builder: PathBuilder::new(), origin_x: x as f32, origin_y: baseline as f32, scale };
            for ch in text.chars() {
                let Some(glyph) = face.glyph_index(ch) else {
                    builder.origin_x += fallback_advance;
                    continue;
                };
                face.outline_glyph(glyph, &mut builder);
                builder.origin_x += face
                    .glyph_hor_advance(glyph)
                    .map_or(fallback_advance, |adv| f32::from(adv) * scale);
            }
            builder.builder.finish()
        })
        .flatten()
    }
}

/// Glyph outline sink mapping font units (y up) to device pixels (y down).
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
