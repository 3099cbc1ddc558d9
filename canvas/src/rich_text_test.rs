#![allow(clippy::float_cmp)]

use super::*;
use crate::font::ApproxMetrics;

fn defaults(size_px: f64) -> RunDefaults {
    RunDefaults {
        family: "Arial".into(),
        size_px,
        bold: false,
        italic: false,
        underline: false,
        color: "#000000".into(),
        align: TextAlign::Left,
    }
}

fn line_texts(layout: &RichLayout) -> Vec<String> {
    layout
        .lines
        .iter()
        .map(|l| l.segments.iter().map(|s| s.text.as_str()).collect())
        .collect()
}

// =============================================================
// Packing
// =============================================================

#[test]
fn single_run_fits_on_one_line() {
    let doc = RichText::new(vec![TextRun::plain("hello world")]);
    // 10px font, 5px per char => 55px.
    let layout = layout_runs(&doc, &defaults(10.0), 100.0, &ApproxMetrics::default());
    assert_eq!(line_texts(&layout), vec!["hello world"]);
    assert_eq!(layout.lines[0].width, 55.0);
    assert_eq!(layout.lines[0].height, 14.0);
    assert_eq!(layout.height, 14.0);
}

#[test]
fn overflow_wraps_and_trims_trailing_space() {
    let doc = RichText::new(vec![TextRun::plain("aaaa bbbb cccc")]);
    // 5px per char; "aaaa bbbb" = 45px fits in 50, adding " cccc" does not.
    let layout = layout_runs(&doc, &defaults(10.0), 50.0, &ApproxMetrics::default());
    assert_eq!(line_texts(&layout), vec!["aaaa bbbb", "cccc"]);
    assert_eq!(layout.lines[0].width, 45.0);
    assert_eq!(layout.lines[1].top, 14.0);
}

#[test]
fn lines_never_exceed_width_except_long_words() {
    let doc = RichText::new(vec![
        TextRun::plain("the quick brown "),
        TextRun { text: "fox jumps".into(), bold: Some(true), ..TextRun::default() },
        TextRun::plain(" over an extraordinarilylongword here"),
    ]);
    let layout = layout_runs(&doc, &defaults(10.0), 60.0, &ApproxMetrics::default());
    for line in &layout.lines {
        let text: String = line.segments.iter().map(|s| s.text.as_str()).collect();
        if line.width > 60.0 {
            assert!(!text.contains(' '), "only single words may overflow: {text:?}");
        }
    }
    assert!(line_texts(&layout).contains(&"extraordinarilylongword".to_string()));
}

#[test]
fn newline_forces_flush_even_when_not_full() {
    let doc = RichText::new(vec![TextRun::plain("ab\ncd")]);
    let layout = layout_runs(&doc, &defaults(10.0), 1000.0, &ApproxMetrics::default());
    assert_eq!(line_texts(&layout), vec!["ab", "cd"]);
}

#[test]
fn blank_line_between_newlines_keeps_height() {
    let doc = RichText::new(vec![TextRun::plain("a\n\nb")]);
    let layout = layout_runs(&doc, &defaults(10.0), 1000.0, &ApproxMetrics::default());
    assert_eq!(layout.lines.len(), 3);
    assert!(layout.lines[1].segments.is_empty());
    assert_eq!(layout.lines[1].height, 14.0);
    assert_eq!(layout.height, 42.0);
}

#[test]
fn trailing_newline_opens_a_blank_line_like_plain_wrap() {
    let doc = RichText::new(vec![TextRun::plain("abc\n")]);
    let layout = layout_runs(&doc, &defaults(10.0), 1000.0, &ApproxMetrics::default());
    assert_eq!(line_texts(&layout), vec!["abc", ""]);
    assert_eq!(layout.height, 28.0);
    assert_eq!(crate::layout::wrap_lines("abc\n", 1000.0, |s| s.len() as f64).len(), layout.lines.len());
}

#[test]
fn newline_followed_by_a_run_does_not_add_a_blank_line() {
    let doc = RichText::new(vec![TextRun::plain("ab\n"), TextRun::plain("cd")]);
    let layout = layout_runs(&doc, &defaults(10.0), 1000.0, &ApproxMetrics::default());
    assert_eq!(line_texts(&layout), vec!["ab", "cd"]);
}

#[test]
fn empty_document_has_no_lines() {
    let layout = layout_runs(&RichText::default(), &defaults(10.0), 100.0, &ApproxMetrics::default());
    assert!(layout.lines.is_empty());
    assert_eq!(layout.height, 0.0);
}

#[test]
fn leading_spaces_on_a_line_are_dropped() {
    let doc = RichText::new(vec![TextRun::plain("ab\n   cd")]);
    let layout = layout_runs(&doc, &defaults(10.0), 1000.0, &ApproxMetrics::default());
    assert_eq!(line_texts(&layout), vec!["ab", "cd"]);
}

// =============================================================
// Styling
// =============================================================

#[test]
fn line_height_tracks_largest_run() {
    let doc = RichText::new(vec![
        TextRun::plain("small "),
        TextRun { text: "BIG".into(), size: Some(SizeClass::Huge), ..TextRun::default() },
    ]);
    let layout = layout_runs(&doc, &defaults(10.0), 1000.0, &ApproxMetrics::default());
    assert_eq!(layout.lines.len(), 1);
    assert_eq!(layout.lines[0].height, 25.0 * 1.4);
}

#[test]
fn same_style_tokens_merge_into_one_segment() {
    let doc = RichText::new(vec![TextRun::plain("one two"), TextRun::plain(" three")]);
    let layout = layout_runs(&doc, &defaults(10.0), 1000.0, &ApproxMetrics::default());
    assert_eq!(layout.lines[0].segments.len(), 1);
}

#[test]
fn underline_and_color_are_per_segment() {
    let doc = RichText::new(vec![
        TextRun::plain("plain "),
        TextRun { text: "under".into(), underline: Some(true), color: Some("#ff0000".into()), ..TextRun::default() },
    ]);
    let layout = layout_runs(&doc, &defaults(10.0), 1000.0, &ApproxMetrics::default());
    let segs = &layout.lines[0].segments;
    assert_eq!(segs.len(), 2);
    assert!(!segs[0].style.underline);
    assert!(segs[1].style.underline);
    assert_eq!(segs[1].style.color, "#ff0000");
    assert_eq!(segs[1].x, 30.0);
    assert_eq!(segs[1].width, 25.0);
}

#[test]
fn size_classes_scale_font() {
    assert_eq!(SizeClass::Small.scale(), 0.75);
    assert_eq!(SizeClass::Normal.scale(), 1.0);
    assert_eq!(SizeClass::Large.scale(), 1.5);
    assert_eq!(SizeClass::Huge.scale(), 2.5);
}

// =============================================================
// Alignment
// =============================================================

#[test]
fn center_and_right_alignment_offsets() {
    let mut d = defaults(10.0);
    d.align = TextAlign::Center;
    let doc = RichText::new(vec![TextRun::plain("abcd")]);
    let layout = layout_runs(&doc, &d, 100.0, &ApproxMetrics::default());
    assert_eq!(layout.lines[0].segments[0].x, 40.0);

    d.align = TextAlign::Right;
    let layout = layout_runs(&doc, &d, 100.0, &ApproxMetrics::default());
    assert_eq!(layout.lines[0].segments[0].x, 80.0);
}

#[test]
fn first_run_align_overrides_default_for_its_line() {
    let doc = RichText::new(vec![
        TextRun { text: "ab\n".into(), align: Some(TextAlign::Right), ..TextRun::default() },
        TextRun::plain("cd"),
    ]);
    let layout = layout_runs(&doc, &defaults(10.0), 100.0, &ApproxMetrics::default());
    assert_eq!(layout.lines[0].align, TextAlign::Right);
    assert_eq!(layout.lines[1].align, TextAlign::Left);
}

// =============================================================
// Serde
// =============================================================

#[test]
fn rich_text_serializes_as_run_array() {
    let doc = RichText::new(vec![TextRun { text: "x".into(), size: Some(SizeClass::Large), ..TextRun::default() }]);
    let json = serde_json::to_string(&doc).unwrap();
    assert_eq!(json, r#"[{"text":"x","size":"large"}]"#);
    let back: RichText = serde_json::from_str(&json).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn plain_text_concatenates_runs() {
    let doc = RichText::new(vec![TextRun::plain("ab"), TextRun::plain("cd")]);
    assert_eq!(doc.plain_text(), "abcd");
}
