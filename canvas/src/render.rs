//! Scene rendering onto a `tiny_skia::Pixmap`.
//!
//! Every frame is a full redraw: white fill, card background, components in
//! z-order, then the selection overlay. A component that cannot be drawn is
//! logged and replaced by its placeholder so it never blanks the surface.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, Path, PathBuilder, Pattern, Pixmap, PixmapPaint, SpreadMode, Stroke, StrokeDash,
    Transform,
};
use tracing::warn;

use crate::assets::CardImage;
use crate::consts::{
    PLACEHOLDER_FILL, PLACEHOLDER_FONT, PLACEHOLDER_LABEL, PLACEHOLDER_LABEL_COLOR, SELECTION_COLOR,
    UNDERLINE_OFFSET_RATIO, UNDERLINE_WIDTH_DIVISOR,
};
use crate::doc::{BackgroundFit, Card, Component, ComponentId, DocStore, ImageComponent, TextAlign, TextComponent};
use crate::fit::cover_placement;
use crate::font::FontSpec;
use crate::hit::{handle_size, handles_for};
use crate::layout::{Geometry, TextLayout};
use crate::units::{Point, Rect};

/// Control-point distance for a quarter circle drawn with one cubic.
const KAPPA: f64 = 0.552_284_749_8;

/// Why a component could not be drawn.
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("component {0} has non-finite geometry")]
    NonFinite(ComponentId),
    #[error("component {0} has an empty box")]
    Empty(ComponentId),
}

/// Everything needed to draw one frame.
pub struct Scene<'a> {
    pub card: &'a Card,
    pub background: Option<&'a CardImage>,
    pub doc: &'a DocStore,
    pub geometry: Geometry<'a>,
    /// Component to draw the selection overlay for, if any.
    pub selected: Option<ComponentId>,
}

/// Redraw the whole surface.
pub fn draw(pixmap: &mut Pixmap, scene: &Scene<'_>) {
    pixmap.fill(Color::TRANSPARENT);
    pixmap.fill(Color::WHITE);

    if let Some(background) = scene.background {
        draw_background(pixmap, background, scene.card.background_fit);
    }

    for component in scene.doc.iter() {
        let bounds = scene.geometry.bounds(component);
        let result = match component {
            Component::Text(text) => draw_text(pixmap, scene, text, bounds),
            Component::Image(image) => draw_image(pixmap, scene, image, bounds),
        };
        if let Err(e) = result {
            warn!(id = component.id(), error = %e, "component draw failed; drawing placeholder");
            draw_placeholder(pixmap, scene, bounds, 0.0);
        }
    }

    if let Some(selected) = scene.selected.and_then(|id| scene.doc.get(id)) {
        draw_selection(pixmap, scene, selected);
    }
}

// =============================================================
// Background
// =============================================================

fn draw_background(pixmap: &mut Pixmap, image: &CardImage, fit: BackgroundFit) {
    let (src_w, src_h) = (f64::from(image.width()), f64::from(image.height()));
    let (dst_w, dst_h) = (f64::from(pixmap.width()), f64::from(pixmap.height()));
    let transform = match fit {
        BackgroundFit::Cover => {
            let p = cover_placement(src_w, src_h, Rect::new(0.0, 0.0, dst_w, dst_h), Point::default(), 1.0);
            Transform::from_row(p.scale as f32, 0.0, 0.0, p.scale as f32, p.x as f32, p.y as f32)
        }
        BackgroundFit::Stretch => {
            Transform::from_row((dst_w / src_w) as f32, 0.0, 0.0, (dst_h / src_h) as f32, 0.0, 0.0)
        }
    };
    pixmap.draw_pixmap(0, 0, image.pixmap().as_ref(), &pixmap_paint(), transform, None);
}

// =============================================================
// Text
// =============================================================

fn draw_text(pixmap: &mut Pixmap, scene: &Scene<'_>, text: &TextComponent, bounds: Rect) -> Result<(), DrawError> {
    check_bounds(text.id, bounds)?;
    let units = scene.geometry.units;
    let padding = units.pt_to_px(text.padding);

    if text.bg_opacity > 0.0 {
        let mut color = color_or(&text.bg_color, Color::WHITE);
        color.apply_opacity(text.bg_opacity.clamp(0.0, 1.0) as f32);
        if let Some(rect) = to_skia_rect(bounds) {
            pixmap.fill_rect(rect, &solid(color), Transform::identity(), None);
        }
    }
    if text.border_width > 0.0 {
        let bw = units.pt_to_px(text.border_width);
        let inset = Rect::new(bounds.x + bw / 2.0, bounds.y + bw / 2.0, bounds.w - bw, bounds.h - bw);
        if let Some(path) = rounded_rect_path(inset, 0.0) {
            stroke(pixmap, &path, color_or(&text.border_color, Color::BLACK), bw, None);
        }
    }

    let fonts = scene.geometry.fonts;
    let layout = scene.geometry.text_layout(text);
    match layout.as_ref() {
        TextLayout::Plain(plain) => {
            let color = color_or(&text.color, Color::BLACK);
            let ascent = fonts.ascent(&plain.font);
            for (i, line) in plain.lines.iter().enumerate() {
                let x = match text.align {
                    TextAlign::Left => bounds.x + padding,
                    TextAlign::Center => bounds.x + (bounds.w - line.width) / 2.0,
                    TextAlign::Right => bounds.right() - padding - line.width,
                };
                let baseline = bounds.y + padding + i as f64 * plain.line_height + ascent;
                fill_glyphs(pixmap, scene, &line.text, &plain.font, x, baseline, color);
                if text.underline {
                    underline(pixmap, x, baseline, line.width, plain.font.size_px, color);
                }
            }
        }
        TextLayout::Rich(rich) => {
            for line in &rich.lines {
                let baseline = bounds.y + padding + line.baseline;
                for segment in &line.segments {
                    let x = bounds.x + padding + segment.x;
                    let color = color_or(&segment.style.color, Color::BLACK);
                    fill_glyphs(pixmap, scene, &segment.text, &segment.style.font, x, baseline, color);
                    if segment.style.underline {
                        underline(pixmap, x, baseline, segment.width, segment.style.font.size_px, color);
                    }
                }
            }
        }
    }
    Ok(())
}

fn fill_glyphs(pixmap: &mut Pixmap, scene: &Scene<'_>, text: &str, font: &FontSpec, x: f64, baseline: f64, color: Color) {
    if text.is_empty() {
        return;
    }
    if let Some(path) = scene.geometry.fonts.outline(text, font, x, baseline) {
        pixmap.fill_path(&path, &solid(color), FillRule::Winding, Transform::identity(), None);
    }
}

fn underline(pixmap: &mut Pixmap, x: f64, baseline: f64, width: f64, size_px: f64, color: Color) {
    let thickness = (size_px / UNDERLINE_WIDTH_DIVISOR).max(1.0);
    let y = baseline + size_px * UNDERLINE_OFFSET_RATIO;
    if let Some(rect) = to_skia_rect(Rect::new(x, y - thickness / 2.0, width, thickness)) {
        pixmap.fill_rect(rect, &solid(color), Transform::identity(), None);
    }
}

// =============================================================
// Image
// =============================================================

fn draw_image(pixmap: &mut Pixmap, scene: &Scene<'_>, image: &ImageComponent, bounds: Rect) -> Result<(), DrawError> {
    check_bounds(image.id, bounds)?;
    let units = scene.geometry.units;
    let radius = if image.corner_radius > 0.0 { units.pt_to_px(image.corner_radius) } else { 0.0 };

    match &image.image {
        Some(source) => {
            let clip = rounded_rect_path(bounds, radius).ok_or(DrawError::Empty(image.id))?;
            let placement = cover_placement(
                f64::from(source.width()),
                f64::from(source.height()),
                bounds,
                Point::new(image.image_offset_x, image.image_offset_y),
                image.image_scale,
            );
            let scale = placement.scale as f32;
            let transform = Transform::from_row(scale, 0.0, 0.0, scale, placement.x as f32, placement.y as f32);
            // The clip path is filled with the placed image, so no per-image mask is allocated.
            let paint = Paint {
                shader: Pattern::new(
                    source.pixmap().as_ref(),
                    SpreadMode::Pad,
                    FilterQuality::Bilinear,
                    1.0,
                    transform,
                ),
                anti_alias: true,
                ..Paint::default()
            };
            pixmap.fill_path(&clip, &paint, FillRule::Winding, Transform::identity(), None);
        }
        None => draw_placeholder(pixmap, scene, bounds, radius),
    }

    if image.border_width > 0.0 {
        let bw = units.pt_to_px(image.border_width);
        let inset = Rect::new(bounds.x + bw / 2.0, bounds.y + bw / 2.0, bounds.w - bw, bounds.h - bw);
        if let Some(path) = rounded_rect_path(inset, (radius - bw / 2.0).max(0.0)) {
            stroke(pixmap, &path, color_or(&image.border_color, Color::BLACK), bw, None);
        }
    }
    Ok(())
}

/// Gray box with a centered "Image" label.
fn draw_placeholder(pixmap: &mut Pixmap, scene: &Scene<'_>, bounds: Rect, radius: f64) {
    let Some(path) = rounded_rect_path(bounds, radius) else {
        return;
    };
    pixmap.fill_path(
        &path,
        &solid(color_or(PLACEHOLDER_FILL, Color::WHITE)),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
    let size = (bounds.w.min(bounds.h) * 0.08).max(14.0);
    let font = FontSpec::new(PLACEHOLDER_FONT, size);
    let fonts = scene.geometry.fonts;
    let width = fonts.measure(PLACEHOLDER_LABEL, &font);
    let x = bounds.x + (bounds.w - width) / 2.0;
    let baseline = bounds.y + bounds.h / 2.0 + fonts.ascent(&font) - size / 2.0;
    fill_glyphs(pixmap, scene, PLACEHOLDER_LABEL, &font, x, baseline, color_or(PLACEHOLDER_LABEL_COLOR, Color::BLACK));
}

// =============================================================
// Selection overlay
// =============================================================

fn draw_selection(pixmap: &mut Pixmap, scene: &Scene<'_>, component: &Component) {
    let bounds = scene.geometry.bounds(component);
    let dpi = scene.geometry.units.dpi;
    let color = color_or(SELECTION_COLOR, Color::BLACK);

    let dash = (dpi / 40.0).max(4.0) as f32;
    let line_width = (dpi / 120.0).max(2.0);
    if let Some(outline) = rounded_rect_path(bounds, 0.0) {
        stroke(pixmap, &outline, color, line_width, StrokeDash::new(vec![dash, dash * 0.6], 0.0));
    }

    let hs = handle_size(dpi);
    for handle in handles_for(component) {
        let c = handle.anchor(bounds);
        let Some(square) = rounded_rect_path(Rect::new(c.x - hs / 2.0, c.y - hs / 2.0, hs, hs), 0.0) else {
            continue;
        };
        pixmap.fill_path(&square, &solid(Color::WHITE), FillRule::Winding, Transform::identity(), None);
        stroke(pixmap, &square, color, (hs / 5.0).max(1.0), None);
    }
}

// =============================================================
// Primitives
// =============================================================

fn check_bounds(id: ComponentId, bounds: Rect) -> Result<(), DrawError> {
    if [bounds.x, bounds.y, bounds.w, bounds.h].iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(DrawError::NonFinite(id))
    }
}

fn to_skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.x as f32, rect.y as f32, rect.w as f32, rect.h as f32)
}

/// Rectangle path with corners of radius `min(r, w/2, h/2)`; `r <= 0` gives square corners.
pub fn rounded_rect_path(rect: Rect, radius: f64) -> Option<Path> {
    let Rect { x, y, w, h } = rect;
    let r = radius.min(w / 2.0).min(h / 2.0);
    if r <= 0.0 || !r.is_finite() {
        return to_skia_rect(rect).map(PathBuilder::from_rect);
    }
    let k = r * (1.0 - KAPPA);
    let mut pb = PathBuilder::new();
    let p = |v: f64| v as f32;
    pb.move_to(p(x + r), p(y));
    pb.line_to(p(x + w - r), p(y));
    pb.cubic_to(p(x + w - k), p(y), p(x + w), p(y + k), p(x + w), p(y + r));
    pb.line_to(p(x + w), p(y + h - r));
    pb.cubic_to(p(x + w), p(y + h - k), p(x + w - k), p(y + h), p(x + w - r), p(y + h));
    pb.line_to(p(x + r), p(y + h));
    pb.cubic_to(p(x + k), p(y + h), p(x), p(y + h - k), p(x), p(y + h - r));
    pb.line_to(p(x), p(y + r));
    pb.cubic_to(p(x), p(y + k), p(x + k), p(y), p(x + r), p(y));
    pb.close();
    pb.finish()
}

fn stroke(pixmap: &mut Pixmap, path: &Path, color: Color, width: f64, dash: Option<StrokeDash>) {
    let stroke = Stroke { width: width as f32, dash, ..Stroke::default() };
    pixmap.stroke_path(path, &solid(color), &stroke, Transform::identity(), None);
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

fn pixmap_paint() -> PixmapPaint {
    PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() }
}

/// Parse `#rgb` or `#rrggbb`.
#[must_use]
pub fn parse_color(hex: &str) -> Option<Color> {
    let digits = hex.trim().strip_prefix('#').filter(|d| d.is_ascii())?;
    let channel = |s: &str| match u8::from_str_radix(s, 16) {
        Ok(v) => Some(v),
        Err(_) => None,
    };
    let (r, g, b) = match digits.len() {
        3 => {
            let expand = |i: usize| channel(&digits[i..=i]).map(|v| v * 17);
            (expand(0)?, expand(1)?, expand(2)?)
        }
        6 => (channel(&digits[0..2])?, channel(&digits[2..4])?, channel(&digits[4..6])?),
        _ => return None,
    };
    Some(Color::from_rgba8(r, g, b, 255))
}

fn color_or(hex: &str, fallback: Color) -> Color {
    parse_color(hex).unwrap_or(fallback)
}
