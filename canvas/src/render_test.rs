#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::TextComponent;
use crate::font::ApproxMetrics;
use crate::layout::LayoutCache;

fn rgb(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
    let px = pixmap.pixel(x, y).unwrap();
    (px.red(), px.green(), px.blue())
}

/// 100x100 px card (1in at 100 dpi).
fn card() -> Card {
    Card { width_inches: 1.0, height_inches: 1.0, dpi: 100.0, ..Card::default() }
}

fn render(card: &Card, doc: &DocStore, background: Option<&CardImage>, selected: Option<ComponentId>) -> Pixmap {
    let fonts = ApproxMetrics::default();
    let cache = LayoutCache::new();
    let scene = Scene {
        card,
        background,
        doc,
        geometry: Geometry::new(card.units(), &fonts, &cache),
        selected,
    };
    let mut pixmap = Pixmap::new(card.pixel_width(), card.pixel_height()).unwrap();
    draw(&mut pixmap, &scene);
    pixmap
}

fn red_image(w: u32, h: u32) -> CardImage {
    CardImage::solid(w, h, Color::from_rgba8(255, 0, 0, 255)).unwrap()
}

// =============================================================
// Colors / paths
// =============================================================

#[test]
fn parse_color_accepts_short_and_long_hex() {
    assert_eq!(parse_color("#ff0000"), Some(Color::from_rgba8(255, 0, 0, 255)));
    assert_eq!(parse_color("#0f0"), Some(Color::from_rgba8(0, 255, 0, 255)));
    assert_eq!(parse_color(" #4a90d9 "), Some(Color::from_rgba8(0x4a, 0x90, 0xd9, 255)));
}

#[test]
fn parse_color_rejects_garbage() {
    assert_eq!(parse_color("red"), None);
    assert_eq!(parse_color("#12345"), None);
    assert_eq!(parse_color("#gggggg"), None);
    assert_eq!(parse_color("#éé"), None);
}

#[test]
fn rounded_rect_radius_is_clamped_to_half_min_side() {
    let path = rounded_rect_path(Rect::new(0.0, 0.0, 40.0, 20.0), 500.0).unwrap();
    let b = path.bounds();
    assert!((b.width() - 40.0).abs() < 1e-3);
    assert!((b.height() - 20.0).abs() < 1e-3);
}

#[test]
fn zero_size_rect_has_no_path() {
    assert!(rounded_rect_path(Rect::new(0.0, 0.0, 0.0, 10.0), 0.0).is_none());
}

// =============================================================
// Layering
// =============================================================

#[test]
fn empty_card_is_white() {
    let pixmap = render(&card(), &DocStore::new(), None, None);
    assert_eq!(rgb(&pixmap, 50, 50), (255, 255, 255));
    assert_eq!(pixmap.pixel(0, 0).unwrap().alpha(), 255);
}

#[test]
fn background_stretch_fills_card() {
    let mut card = card();
    card.background_fit = BackgroundFit::Stretch;
    let bg = red_image(3, 7);
    let pixmap = render(&card, &DocStore::new(), Some(&bg), None);
    assert_eq!(rgb(&pixmap, 1, 1), (255, 0, 0));
    assert_eq!(rgb(&pixmap, 98, 98), (255, 0, 0));
}

#[test]
fn background_cover_fills_card() {
    let bg = red_image(10, 1);
    let pixmap = render(&card(), &DocStore::new(), Some(&bg), None);
    assert_eq!(rgb(&pixmap, 2, 2), (255, 0, 0));
    assert_eq!(rgb(&pixmap, 97, 97), (255, 0, 0));
}

#[test]
fn image_is_clipped_to_its_box() {
    let mut doc = DocStore::new();
    let mut image = ImageComponent::new(1, 0.2, 0.2, 0.5, 0.5);
    image.image = Some(red_image(50, 10));
    image.image_scale = 3.0;
    image.image_offset_x = 1e6;
    doc.push(Component::Image(image));
    let pixmap = render(&card(), &doc, None, None);
    assert_eq!(rgb(&pixmap, 45, 45), (255, 0, 0));
    assert_eq!(rgb(&pixmap, 21, 21), (255, 0, 0));
    assert_eq!(rgb(&pixmap, 10, 10), (255, 255, 255));
    assert_eq!(rgb(&pixmap, 80, 45), (255, 255, 255));
}

#[test]
fn rounded_image_corners_stay_clear() {
    let mut doc = DocStore::new();
    for (id, x) in [(1, 0.0), (2, 0.5)] {
        let mut image = ImageComponent::new(id, x, 0.2, 0.5, 0.5);
        image.image = Some(red_image(20, 20));
        image.corner_radius = 20.0;
        doc.push(Component::Image(image));
    }
    let pixmap = render(&card(), &doc, None, None);
    for origin in [0, 50] {
        assert_eq!(rgb(&pixmap, origin + 1, 21), (255, 255, 255));
        assert_eq!(rgb(&pixmap, origin + 25, 45), (255, 0, 0));
        assert_eq!(rgb(&pixmap, origin + 25, 21), (255, 0, 0));
    }
}

#[test]
fn missing_image_draws_placeholder() {
    let mut doc = DocStore::new();
    doc.push(Component::Image(ImageComponent::new(1, 0.0, 0.0, 1.0, 1.0)));
    let pixmap = render(&card(), &doc, None, None);
    assert_eq!(rgb(&pixmap, 5, 5), (0xe0, 0xe0, 0xe0));
}

#[test]
fn later_components_draw_over_earlier() {
    let mut doc = DocStore::new();
    doc.push(Component::Image(ImageComponent::new(1, 0.0, 0.0, 1.0, 1.0)));
    let mut top = ImageComponent::new(2, 0.0, 0.0, 0.5, 0.5);
    top.image = Some(red_image(2, 2));
    doc.push(Component::Image(top));
    let pixmap = render(&card(), &doc, None, None);
    assert_eq!(rgb(&pixmap, 10, 10), (255, 0, 0));
    assert_eq!(rgb(&pixmap, 80, 80), (0xe0, 0xe0, 0xe0));
}

#[test]
fn non_finite_component_does_not_blank_the_surface() {
    let mut doc = DocStore::new();
    doc.push(Component::Image(ImageComponent::new(1, f64::NAN, 0.0, 1.0, 1.0)));
    let mut ok = ImageComponent::new(2, 0.0, 0.0, 0.5, 0.5);
    ok.image = Some(red_image(2, 2));
    doc.push(Component::Image(ok));
    let pixmap = render(&card(), &doc, None, None);
    assert_eq!(rgb(&pixmap, 10, 10), (255, 0, 0));
}

#[test]
fn text_background_uses_opacity() {
    let mut doc = DocStore::new();
    let mut text = TextComponent::new(1, 0.0, 0.0, 1.0);
    text.height = Some(1.0);
    text.bg_color = "#0000ff".into();
    text.bg_opacity = 1.0;
    text.text = String::new();
    doc.push(Component::Text(text));
    let pixmap = render(&card(), &doc, None, None);
    assert_eq!(rgb(&pixmap, 50, 50), (0, 0, 255));
}

#[test]
fn transparent_text_background_is_not_drawn() {
    let mut doc = DocStore::new();
    let mut text = TextComponent::new(1, 0.0, 0.0, 1.0);
    text.height = Some(1.0);
    text.bg_color = "#0000ff".into();
    text.text = String::new();
    doc.push(Component::Text(text));
    let pixmap = render(&card(), &doc, None, None);
    assert_eq!(rgb(&pixmap, 50, 50), (255, 255, 255));
}

// =============================================================
// Selection overlay
// =============================================================

#[test]
fn selection_draws_handles_only_when_requested() {
    let mut doc = DocStore::new();
    let mut image = ImageComponent::new(1, 0.2, 0.2, 0.6, 0.6);
    image.image = Some(red_image(2, 2));
    doc.push(Component::Image(image));

    let plain = render(&card(), &doc, None, None);
    assert_eq!(rgb(&plain, 19, 19), (255, 255, 255));

    // The top-left handle square spans 15..25 with its stroked edge at x = 15.
    let selected = render(&card(), &doc, None, Some(1));
    assert_ne!(rgb(&selected, 15, 20), (255, 255, 255));
    assert_eq!(rgb(&selected, 50, 50), (255, 0, 0));
}
