#![allow(clippy::float_cmp)]

use super::*;
use crate::rich_text::TextRun;

fn text(id: ComponentId) -> Component {
    Component::Text(TextComponent::new(id, 0.25, 0.25, 2.0))
}

fn image(id: ComponentId) -> Component {
    Component::Image(ImageComponent::new(id, 0.5, 0.5, 1.0, 1.0))
}

// =============================================================
// Card
// =============================================================

#[test]
fn card_defaults() {
    let card = Card::default();
    assert_eq!(card.width_inches, 2.5);
    assert_eq!(card.height_inches, 3.5);
    assert_eq!(card.dpi, 300.0);
    assert_eq!(card.pixel_width(), 750);
    assert_eq!(card.pixel_height(), 1050);
    assert_eq!(card.background_fit, BackgroundFit::Cover);
}

#[test]
fn card_sanitize_replaces_invalid_dimensions() {
    let mut card = Card { width_inches: f64::NAN, height_inches: -1.0, dpi: 0.0, ..Card::default() };
    card.sanitize();
    assert_eq!((card.width_inches, card.height_inches, card.dpi), (2.5, 3.5, 300.0));
}

#[test]
fn card_accepts_background_ref_alias() {
    let card: Card = serde_json::from_str(
        r#"{"widthInches":2,"heightInches":3,"dpi":150,"backgroundImageRef":"bg.png","backgroundFit":"stretch"}"#,
    )
    .unwrap();
    assert_eq!(card.background_image_data.as_deref(), Some("bg.png"));
    assert_eq!(card.background_fit, BackgroundFit::Stretch);
    assert_eq!(card.name, "Untitled");
}

// =============================================================
// ComponentPatch
// =============================================================

#[test]
fn patch_applies_only_present_fields() {
    let mut c = text(1);
    c.apply_patch(&ComponentPatch { x: Some(1.5), bold: Some(true), ..ComponentPatch::default() });
    let t = c.as_text().unwrap();
    assert_eq!(t.x, 1.5);
    assert_eq!(t.y, 0.25);
    assert!(t.bold);
    assert_eq!(t.font_size, 24.0);
}

#[test]
fn patch_keeps_last_good_value_for_non_finite() {
    let mut c = text(1);
    c.apply_patch(&ComponentPatch { x: Some(f64::NAN), width: Some(f64::INFINITY), ..ComponentPatch::default() });
    let t = c.as_text().unwrap();
    assert_eq!(t.x, 0.25);
    assert_eq!(t.width, 2.0);
}

#[test]
fn patch_clamps_ranges() {
    let mut c = text(1);
    c.apply_patch(&ComponentPatch {
        width: Some(0.01),
        font_size: Some(1000.0),
        bg_opacity: Some(3.0),
        padding: Some(-5.0),
        border_width: Some(-1.0),
        ..ComponentPatch::default()
    });
    let t = c.as_text().unwrap();
    assert_eq!(t.width, 0.25);
    assert_eq!(t.font_size, 400.0);
    assert_eq!(t.bg_opacity, 1.0);
    assert_eq!(t.padding, 0.0);
    assert_eq!(t.border_width, 0.0);

    let mut i = image(2);
    i.apply_patch(&ComponentPatch {
        width: Some(0.0),
        height: Some(-3.0),
        image_scale: Some(50.0),
        corner_radius: Some(-2.0),
        ..ComponentPatch::default()
    });
    let img = i.as_image().unwrap();
    assert_eq!(img.width, 0.1);
    assert_eq!(img.height, 0.1);
    assert_eq!(img.image_scale, 10.0);
    assert_eq!(img.corner_radius, 0.0);
}

#[test]
fn sanitize_repairs_imported_values() {
    let mut c = text(1);
    if let Component::Text(t) = &mut c {
        t.x = f64::NAN;
        t.height = Some(-1.0);
        t.font_size = -24.0;
        t.padding = f64::INFINITY;
        t.bg_opacity = -0.5;
    }
    c.sanitize();
    let t = c.as_text().unwrap();
    assert_eq!(t.x, 0.0);
    assert_eq!(t.height, None);
    assert_eq!(t.font_size, 4.0);
    assert_eq!(t.padding, 4.0);
    assert_eq!(t.bg_opacity, 0.0);

    let mut i = image(2);
    if let Component::Image(img) = &mut i {
        img.corner_radius = -3.0;
        img.border_width = f64::NAN;
        img.image_scale = f64::NAN;
    }
    i.sanitize();
    let img = i.as_image().unwrap();
    assert_eq!(img.corner_radius, 0.0);
    assert_eq!(img.border_width, 0.0);
    assert_eq!(img.image_scale, 1.0);
}

#[test]
fn text_height_patch_non_positive_means_auto() {
    let mut c = text(1);
    c.apply_patch(&ComponentPatch { height: Some(1.2), ..ComponentPatch::default() });
    assert_eq!(c.as_text().unwrap().height, Some(1.2));
    c.apply_patch(&ComponentPatch { height: Some(0.0), ..ComponentPatch::default() });
    assert_eq!(c.as_text().unwrap().height, None);
    c.apply_patch(&ComponentPatch { height: Some(f64::NAN), ..ComponentPatch::default() });
    assert_eq!(c.as_text().unwrap().height, None);
}

#[test]
fn plain_text_patch_drops_rich_content() {
    let mut c = text(1);
    if let Component::Text(t) = &mut c {
        t.rich = Some(RichText::new(vec![TextRun::plain("rich")]));
    }
    c.apply_patch(&ComponentPatch { text: Some("plain".into()), ..ComponentPatch::default() });
    let t = c.as_text().unwrap();
    assert_eq!(t.text, "plain");
    assert!(t.rich.is_none());
}

#[test]
fn patch_ignores_fields_of_other_variant() {
    let mut i = image(1);
    i.apply_patch(&ComponentPatch { font_size: Some(12.0), text: Some("x".into()), ..ComponentPatch::default() });
    assert!(i.is_image());
    let mut t = text(2);
    t.apply_patch(&ComponentPatch { image_scale: Some(2.0), ..ComponentPatch::default() });
    assert!(t.as_text().is_some());
}

// =============================================================
// component_bounds
// =============================================================

#[test]
fn text_bounds_fall_back_to_one_line() {
    let units = Units::new(72.0);
    let mut t = TextComponent::new(1, 1.0, 2.0, 3.0);
    t.font_size = 10.0;
    let b = component_bounds(&Component::Text(t.clone()), units, None);
    assert_eq!((b.x, b.y, b.w), (72.0, 144.0, 216.0));
    assert!((b.h - 13.5).abs() < 1e-9);
    let b = component_bounds(&Component::Text(t), units, Some(40.0));
    assert_eq!(b.h, 40.0);
}

// =============================================================
// DocStore
// =============================================================

#[test]
fn store_allocates_monotonic_ids() {
    let mut doc = DocStore::new();
    let a = doc.allocate_id();
    let b = doc.allocate_id();
    assert_eq!((a, b), (1, 2));
    doc.push(text(a));
    doc.remove(a);
    assert_eq!(doc.allocate_id(), 3);
}

#[test]
fn push_raises_next_id_above_existing() {
    let mut doc = DocStore::new();
    doc.push(text(10));
    assert_eq!(doc.next_id(), 11);
}

#[test]
fn move_by_swaps_adjacent_only() {
    let mut doc = DocStore::new();
    for id in 1..=3 {
        doc.push(image(id));
    }
    assert!(doc.move_by(1, ZMove::Forward));
    assert_eq!(doc.ids(), vec![2, 1, 3]);
    assert!(doc.move_by(3, ZMove::Backward));
    assert_eq!(doc.ids(), vec![2, 3, 1]);
    assert!(!doc.move_by(2, ZMove::Backward));
    assert!(!doc.move_by(1, ZMove::Forward));
    assert!(!doc.move_by(99, ZMove::Forward));
}

#[test]
fn z_order_stays_a_permutation() {
    let mut doc = DocStore::new();
    for id in 1..=5 {
        doc.push(text(id));
    }
    let moves = [(3, ZMove::Forward), (5, ZMove::Forward), (1, ZMove::Backward), (2, ZMove::Forward), (4, ZMove::Backward)];
    for _ in 0..7 {
        for (id, dir) in moves {
            doc.move_by(id, dir);
        }
    }
    let mut ids = doc.ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn topmost_first_iterates_in_reverse() {
    let mut doc = DocStore::new();
    doc.push(text(1));
    doc.push(image(2));
    let ids: Vec<ComponentId> = doc.iter_topmost_first().map(Component::id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[test]
fn load_keeps_next_id_above_loaded_ids() {
    let mut doc = DocStore::new();
    doc.load(vec![text(4), image(9)], 2);
    assert_eq!(doc.next_id(), 10);
    assert_eq!(doc.len(), 2);
}

// =============================================================
// Document
// =============================================================

const DOC: &str = r##"{
  "version": 2,
  "card": {"name": "Hero", "widthInches": 2.5, "heightInches": 3.5, "dpi": 300, "backgroundImageData": null, "backgroundFit": "cover"},
  "components": [
    {"id": 1, "type": "text", "x": 0.25, "y": 0.25, "width": 2, "height": null, "text": "Hello", "font": "Arial", "fontSize": 24,
     "color": "#000000", "bold": false, "italic": false, "underline": false, "align": "center", "bgColor": "#ffffff",
     "bgOpacity": 0, "borderWidth": 0, "borderColor": "#000000", "padding": 4},
    {"id": 3, "type": "image", "x": 0.5, "y": 1, "width": 1.5, "height": 1, "imageData": "data:image/png;base64,AAAA",
     "borderWidth": 2, "borderColor": "#ff0000", "cornerRadius": 6, "imageOffsetX": 5, "imageOffsetY": -3, "imageScale": 1.5}
  ],
  "nextId": 4
}"##;

#[test]
fn document_parses_original_format() {
    let doc = Document::from_json(DOC).unwrap();
    assert_eq!(doc.card.name, "Hero");
    assert_eq!(doc.components.len(), 2);
    let t = doc.components[0].as_text().unwrap();
    assert_eq!(t.align, TextAlign::Center);
    assert_eq!(t.height, None);
    let i = doc.components[1].as_image().unwrap();
    assert_eq!(i.corner_radius, 6.0);
    assert_eq!(i.image_scale, 1.5);
    assert_eq!(doc.resolved_next_id(), 4);
    let refs: Vec<_> = doc.image_refs().collect();
    assert_eq!(refs, vec![(3, "data:image/png;base64,AAAA")]);
}

#[test]
fn document_serializes_camel_case_with_type_tag() {
    let doc = Document::from_json(DOC).unwrap();
    let json = doc.to_json_pretty().unwrap();
    assert!(json.contains("\"widthInches\""));
    assert!(json.contains("\"type\": \"image\""));
    assert!(json.contains("\"imageOffsetX\""));
    assert!(json.contains("\"nextId\": 4"));
    let back = Document::from_json(&json).unwrap();
    assert_eq!(back.components.len(), 2);
}

#[test]
fn document_without_card_is_rejected() {
    let err = Document::from_json(r#"{"components": []}"#).unwrap_err();
    assert!(matches!(err, CanvasError::InvalidDocument(_)));
}

#[test]
fn document_without_component_array_is_rejected() {
    let err = Document::from_json(r#"{"card": {"widthInches":1,"heightInches":1,"dpi":72}, "components": {}}"#).unwrap_err();
    assert!(matches!(err, CanvasError::InvalidDocument(_)));
}

#[test]
fn document_with_invalid_json_is_rejected() {
    assert!(matches!(Document::from_json("{nope").unwrap_err(), CanvasError::Json(_)));
}

#[test]
fn document_with_duplicate_ids_is_rejected() {
    let json = r#"{"card": {"widthInches":1,"heightInches":1,"dpi":72},
        "components": [{"id":1,"type":"text","x":0,"y":0,"width":1},{"id":1,"type":"text","x":0,"y":0,"width":1}]}"#;
    let err = Document::from_json(json).unwrap_err();
    assert!(matches!(err, CanvasError::InvalidDocument(msg) if msg.contains("duplicate")));
}

#[test]
fn document_with_max_id_is_rejected() {
    let json = r#"{"card": {"widthInches":1,"heightInches":1,"dpi":72},
        "components": [{"id":18446744073709551615,"type":"text","x":0,"y":0,"width":1}]}"#;
    let err = Document::from_json(json).unwrap_err();
    assert!(matches!(err, CanvasError::InvalidDocument(msg) if msg.contains("out of range")));
}

#[test]
fn store_id_counter_saturates() {
    let mut store = DocStore::new();
    store.push(text(ComponentId::MAX));
    assert_eq!(store.next_id(), ComponentId::MAX);
    store.load(Vec::new(), ComponentId::MAX);
    assert_eq!(store.allocate_id(), ComponentId::MAX);
    assert_eq!(store.next_id(), ComponentId::MAX);
}

#[test]
fn missing_next_id_is_derived_from_max_id() {
    let json = r#"{"card": {"widthInches":1,"heightInches":1,"dpi":72},
        "components": [{"id":7,"type":"text","x":0,"y":0,"width":1}]}"#;
    let doc = Document::from_json(json).unwrap();
    assert_eq!(doc.version, 2);
    assert_eq!(doc.resolved_next_id(), 8);
}

#[test]
fn stale_next_id_is_raised() {
    let json = r#"{"card": {"widthInches":1,"heightInches":1,"dpi":72},
        "components": [{"id":7,"type":"text","x":0,"y":0,"width":1}], "nextId": 3}"#;
    assert_eq!(Document::from_json(json).unwrap().resolved_next_id(), 8);
}

#[test]
fn file_stem_sanitizing() {
    assert_eq!(sanitize_file_stem("My Card #1"), "My_Card__1");
    assert_eq!(sanitize_file_stem("ok-name_2"), "ok-name_2");
}
