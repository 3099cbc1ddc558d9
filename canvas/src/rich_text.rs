//! Run-based rich text: the finalized document a text component may carry,
//! and the layout that packs its formatted runs into wrapped lines.
//!
//! The engine never edits rich text. A host editor produces a [`RichText`]
//! (an ordered list of [`TextRun`]s) and hands it over whole; this module
//! turns it into positioned [`Segment`]s grouped by [`RichLine`].

#[cfg(test)]
#[path = "rich_text_test.rs"]
mod rich_text_test;

use serde::{Deserialize, Serialize};

use crate::consts::RICH_LINE_HEIGHT_RATIO;
use crate::doc::TextAlign;
use crate::font::{FontProvider, FontSpec};

/// Relative size of a run, as a multiple of the component font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    #[default]
    Normal,
    Large,
    Huge,
}

impl SizeClass {
    #[must_use]
    pub fn scale(self) -> f64 {
        match self {
            Self::Small => 0.75,
            Self::Normal => 1.0,
            Self::Large => 1.5,
            Self::Huge => 2.5,
        }
    }
}

/// A span of text sharing one set of formatting attributes.
///
/// Unset attributes inherit from the owning text component. Newlines inside
/// `text` are hard line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

impl TextRun {
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }
}

/// A finalized rich-text document: runs in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText {
    pub runs: Vec<TextRun>,
}

impl RichText {
    #[must_use]
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }

    /// Concatenated text of every run, formatting dropped.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Attributes a run inherits when it leaves them unset.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct RunDefaults {
    pub family: String,
    /// Base font size in device pixels.
    pub size_px: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: String,
    pub align: TextAlign,
}

/// Resolved style of one laid-out segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentStyle {
    pub font: FontSpec,
    pub underline: bool,
    pub color: String,
}

/// A same-style piece of one line, positioned relative to the content box.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub style: SegmentStyle,
    pub x: f64,
    pub width: f64,
}

/// A wrapped line of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct RichLine {
    pub segments: Vec<Segment>,
    /// Offset of the line top from the content box top.
    pub top: f64,
    pub height: f64,
    /// Offset of the baseline from the content box top.
    pub baseline: f64,
    pub align: TextAlign,
    /// Total measured width of the segments.
    pub width: f64,
}

/// Result of laying out a rich-text document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichLayout {
    pub lines: Vec<RichLine>,
    /// Sum of all line heights.
    pub height: f64,
}

struct Pending {
    text: String,
    style: SegmentStyle,
    width: f64,
}

struct LineBuilder<'a> {
    fonts: &'a dyn FontProvider,
    max_width: f64,
    default_align: TextAlign,
    pending: Vec<Pending>,
    width: f64,
    align: Option<TextAlign>,
    layout: RichLayout,
}

impl LineBuilder<'_> {
    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn push(&mut self, token: &str, style: &SegmentStyle, width: f64, align: Option<TextAlign>) {
        if self.pending.is_empty() {
            self.align = Some(align.unwrap_or(self.default_align));
        }
        self.width += width;
        match self.pending.last_mut() {
            Some(last) if last.style == *style => {
                last.text.push_str(token);
                last.width += width;
            }
            _ => self.pending.push(Pending { text: token.to_string(), style: style.clone(), width }),
        }
    }

    /// Close the current line. An empty line takes the height of `blank_size_px`.
    fn flush(&mut self, blank_size_px: f64) {
        self.trim_trailing_spaces();
        let pending = std::mem::take(&mut self.pending);
        let align = self.align.take().unwrap_or(self.default_align);
        self.width = 0.0;

        let max_size = pending.iter().map(|p| p.style.font.size_px).fold(0.0_f64, f64::max);
        let max_size = if pending.is_empty() { blank_size_px } else { max_size };
        let height = max_size * RICH_LINE_HEIGHT_RATIO;
        let ascent = pending
            .iter()
            .map(|p| self.fonts.ascent(&p.style.font))
            .fold(0.0_f64, f64::max);
        let top = self.layout.height;
        let baseline = top + (height - max_size) / 2.0 + ascent;

        let total: f64 = pending.iter().map(|p| p.width).sum();
        let mut x = match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (self.max_width - total) / 2.0,
            TextAlign::Right => self.max_width - total,
        };
        let segments = pending
            .into_iter()
            .map(|p| {
                let segment = Segment { text: p.text, style: p.style, x, width: p.width };
                x += segment.width;
                segment
            })
            .collect();

        self.layout.lines.push(RichLine { segments, top, height, baseline, align, width: total });
        self.layout.height += height;
    }

    fn trim_trailing_spaces(&mut self) {
        while let Some(last) = self.pending.last_mut() {
            let trimmed = last.text.trim_end_matches(' ');
            if trimmed.len() == last.text.len() {
                break;
            }
            if trimmed.is_empty() {
                self.pending.pop();
                continue;
            }
            last.text.truncate(trimmed.len());
            last.width = self.fonts.measure(&last.text, &last.style.font);
            break;
        }
    }
}

/// Split into alternating word and space tokens, preserving every character.
fn tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (i, ch) in text.char_indices() {
        let is_space = ch == ' ';
        if in_space.is_some_and(|s| s != is_space) {
            out.push(&text[start..i]);
            start = i;
        }
        in_space = Some(is_space);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

fn resolve_style(run: &TextRun, defaults: &RunDefaults) -> SegmentStyle {
    let size_px = defaults.size_px * run.size.unwrap_or_default().scale();
    let font = FontSpec::new(defaults.family.clone(), size_px)
        .with_style(run.bold.unwrap_or(defaults.bold), run.italic.unwrap_or(defaults.italic));
    SegmentStyle {
        font,
        underline: run.underline.unwrap_or(defaults.underline),
        color: run.color.clone().unwrap_or_else(|| defaults.color.clone()),
    }
}

/// Lay out `doc` into lines no wider than `max_width`, except for single
/// words that are wider on their own.
#[must_use]
pub fn layout_runs(doc: &RichText, defaults: &RunDefaults, max_width: f64, fonts: &dyn FontProvider) -> RichLayout {
    let mut line = LineBuilder {
        fonts,
        max_width,
        default_align: defaults.align,
        pending: Vec::new(),
        width: 0.0,
        align: None,
        layout: RichLayout::default(),
    };

    // Size of the blank line opened by a trailing `\n`, as plain wrapping keeps it.
    let mut open_blank: Option<f64> = None;
    for run in &doc.runs {
        let style = resolve_style(run, defaults);
        for (i, piece) in run.text.split('\n').enumerate() {
            if i > 0 {
                line.flush(style.font.size_px);
                open_blank = Some(style.font.size_px);
            }
            for token in tokens(piece) {
                let is_space = token.starts_with(' ');
                if is_space && line.is_empty() {
                    continue;
                }
                let width = fonts.measure(token, &style.font);
                if !is_space && !line.is_empty() && line.width + width > max_width {
                    line.flush(style.font.size_px);
                }
                line.push(token, &style, width, run.align);
                open_blank = None;
            }
        }
    }
    if !line.is_empty() {
        line.flush(defaults.size_px);
    } else if let Some(size_px) = open_blank {
        line.flush(size_px);
    }
    line.layout
}
