//! Text layout for text components, and the shared geometry query.
//!
//! Plain text uses greedy word wrap ([`wrap_lines`]); components carrying a
//! rich-text document use [`crate::rich_text::layout_runs`]. Both results are
//! memoized in a [`LayoutCache`] keyed by content, width and font, so the
//! renderer and the hit-tester see the same auto heights without depending on
//! draw order. [`Geometry`] bundles the cache with the unit converter and font
//! provider and answers "where is this component" for every caller.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::consts::{LAYOUT_CACHE_CAPACITY, RICH_LINE_HEIGHT_RATIO, TEXT_LINE_HEIGHT_RATIO};
use crate::doc::{Component, TextAlign, TextComponent, component_bounds};
use crate::font::{FontProvider, FontSpec};
use crate::rich_text::{RichLayout, RichText, RunDefaults, layout_runs};
use crate::units::{Rect, Units};

/// Greedy word wrap.
///
/// Paragraphs are split on `\n` and words on single spaces. A word that does
/// not fit starts a new line unless the current line is empty; an empty
/// paragraph yields an empty line, so the result is never empty.
pub fn wrap_lines(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() { word.to_string() } else { format!("{current} {word}") };
            if measure(&candidate) > max_width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

/// One wrapped plain line with its measured width.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainLine {
    pub text: String,
    pub width: f64,
}

/// Wrapped single-style text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainLayout {
    pub lines: Vec<PlainLine>,
    pub line_height: f64,
    pub font: FontSpec,
}

/// Laid-out content of a text component, in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum TextLayout {
    Plain(PlainLayout),
    Rich(RichLayout),
}

impl TextLayout {
    /// Height of the laid-out content, excluding padding.
    #[must_use]
    pub fn content_height(&self) -> f64 {
        match self {
            Self::Plain(p) => p.lines.len() as f64 * p.line_height,
            Self::Rich(r) => r.height,
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        match self {
            Self::Plain(p) => p.lines.len(),
            Self::Rich(r) => r.lines.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LayoutContent {
    Plain(String),
    Rich(RichText),
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LayoutKey {
    content: LayoutContent,
    width_bits: u64,
    family: String,
    size_bits: u64,
    bold: bool,
    italic: bool,
    underline: bool,
    color: String,
    align: TextAlign,
}

/// Memoized text layouts.
///
/// Interior mutability lets read-only callers (hit-testing, rendering) fill
/// the cache through a shared reference. The cache is flushed wholesale once
/// it reaches capacity.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entries: RefCell<HashMap<LayoutKey, Rc<TextLayout>>>,
}

impl LayoutCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn get_or_insert_with(&self, key: LayoutKey, compute: impl FnOnce() -> TextLayout) -> Rc<TextLayout> {
        if let Some(hit) = self.entries.borrow().get(&key) {
            return Rc::clone(hit);
        }
        let layout = Rc::new(compute());
        let mut entries = self.entries.borrow_mut();
        if entries.len() >= LAYOUT_CACHE_CAPACITY {
            entries.clear();
        }
        entries.insert(key, Rc::clone(&layout));
        layout
    }
}

/// Geometry queries shared by the interaction and render paths.
#[derive(Clone, Copy)]
pub struct Geometry<'a> {
    pub units: Units,
    pub fonts: &'a dyn FontProvider,
    pub layouts: &'a LayoutCache,
}

impl<'a> Geometry<'a> {
    #[must_use]
    pub fn new(units: Units, fonts: &'a dyn FontProvider, layouts: &'a LayoutCache) -> Self {
        Self { units, fonts, layouts }
    }

    /// Font used for a text component's plain content, in device pixels.
    #[must_use]
    pub fn font_for(&self, text: &TextComponent) -> FontSpec {
        FontSpec::new(text.font.clone(), self.units.pt_to_px(text.font_size)).with_style(text.bold, text.italic)
    }

    /// Content-box width: component width minus padding on both sides.
    #[must_use]
    pub fn content_width(&self, text: &TextComponent) -> f64 {
        (self.units.in_to_px(text.width) - 2.0 * self.units.pt_to_px(text.padding)).max(0.0)
    }

    /// Layout of a text component, computed once per content/width/font.
    #[must_use]
    pub fn text_layout(&self, text: &TextComponent) -> Rc<TextLayout> {
        let font = self.font_for(text);
        let max_width = self.content_width(text);
        let key = LayoutKey {
            content: match &text.rich {
                Some(rich) => LayoutContent::Rich(rich.clone()),
                None => LayoutContent::Plain(text.text.clone()),
            },
            width_bits: max_width.to_bits(),
            family: font.family.clone(),
            size_bits: font.size_px.to_bits(),
            bold: font.bold,
            italic: font.italic,
            underline: text.underline,
            color: text.color.clone(),
            align: text.align,
        };
        self.layouts.get_or_insert_with(key, || match &text.rich {
            Some(rich) => {
                let defaults = RunDefaults {
                    family: font.family.clone(),
                    size_px: font.size_px,
                    bold: text.bold,
                    italic: text.italic,
                    underline: text.underline,
                    color: text.color.clone(),
                    align: text.align,
                };
                TextLayout::Rich(layout_runs(rich, &defaults, max_width, self.fonts))
            }
            None => {
                let lines = wrap_lines(&text.text, max_width, |s| self.fonts.measure(s, &font))
                    .into_iter()
                    .map(|line| {
                        let width = self.fonts.measure(&line, &font);
                        PlainLine { text: line, width }
                    })
                    .collect();
                TextLayout::Plain(PlainLayout { lines, line_height: font.size_px * TEXT_LINE_HEIGHT_RATIO, font })
            }
        })
    }

    /// Auto height of a text box: content height plus padding, never below one line.
    #[must_use]
    pub fn auto_height(&self, text: &TextComponent) -> f64 {
        let layout = self.text_layout(text);
        let one_line = match layout.as_ref() {
            TextLayout::Plain(p) => p.line_height,
            TextLayout::Rich(_) => self.units.pt_to_px(text.font_size) * RICH_LINE_HEIGHT_RATIO,
        };
        layout.content_height().max(one_line) + 2.0 * self.units.pt_to_px(text.padding)
    }

    /// Device-pixel bounds of any component.
    #[must_use]
    pub fn bounds(&self, component: &Component) -> Rect {
        let auto = component
            .as_text()
            .filter(|t| t.explicit_height().is_none())
            .map(|t| self.auto_height(t));
        component_bounds(component, self.units, auto)
    }
}
