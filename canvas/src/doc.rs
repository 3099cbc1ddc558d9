//! Document model: the card, its components, and the in-memory store.
//!
//! This module defines what is on the card (`Card`, `Component` and its
//! `TextComponent` / `ImageComponent` variants), a sparse-update type for
//! property edits (`ComponentPatch`), the ordered runtime store that owns all
//! live components (`DocStore`), and the serializable `Document` exchanged
//! with the persistence collaborator.
//!
//! Geometry is stored in inches; typographic sizes in points. The store's
//! sequence order is the z-order: index 0 is drawn first (bottom).

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::assets::CardImage;
use crate::consts::{
    DEFAULT_CARD_DPI, DEFAULT_CARD_HEIGHT_IN, DEFAULT_CARD_NAME, DEFAULT_CARD_WIDTH_IN, DOCUMENT_VERSION,
    MAX_FONT_SIZE_PT, MAX_IMAGE_SCALE, MIN_FONT_SIZE_PT, MIN_IMAGE_SCALE, MIN_IMAGE_SIZE_IN, MIN_TEXT_HEIGHT_IN,
    MIN_TEXT_WIDTH_IN, TEXT_LINE_HEIGHT_RATIO,
};
use crate::error::CanvasError;
use crate::rich_text::RichText;
use crate::units::{Rect, Units};

/// Unique identifier for a component. Monotonic; never reused within a document.
pub type ComponentId = u64;

/// How the card background image is fitted to the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundFit {
    /// Scale to cover the card, cropping overflow.
    #[default]
    Cover,
    /// Scale each axis independently to the card size.
    Stretch,
}

/// Horizontal alignment of text lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Direction for a one-step z-order change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZMove {
    /// Toward index 0 (drawn earlier, further back).
    Backward,
    /// Toward the end of the sequence (drawn later, further front).
    Forward,
}

fn default_card_name() -> String {
    DEFAULT_CARD_NAME.to_string()
}

/// The physical card being composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(default = "default_card_name")]
    pub name: String,
    pub width_inches: f64,
    pub height_inches: f64,
    pub dpi: f64,
    /// Opaque reference to the background image payload.
    #[serde(default, alias = "backgroundImageRef")]
    pub background_image_data: Option<String>,
    #[serde(default)]
    pub background_fit: BackgroundFit,
}

impl Default for Card {
    fn default() -> Self {
        Self {
            name: default_card_name(),
            width_inches: DEFAULT_CARD_WIDTH_IN,
            height_inches: DEFAULT_CARD_HEIGHT_IN,
            dpi: DEFAULT_CARD_DPI,
            background_image_data: None,
            background_fit: BackgroundFit::Cover,
        }
    }
}

impl Card {
    #[must_use]
    pub fn units(&self) -> Units {
        Units::new(self.dpi)
    }

    /// Drawing surface width in device pixels.
    #[must_use]
    pub fn pixel_width(&self) -> u32 {
        (self.width_inches * self.dpi).round().max(1.0) as u32
    }

    /// Drawing surface height in device pixels.
    #[must_use]
    pub fn pixel_height(&self) -> u32 {
        (self.height_inches * self.dpi).round().max(1.0) as u32
    }

    /// Replace non-finite or non-positive dimensions with the documented defaults.
    pub fn sanitize(&mut self) {
        self.width_inches = positive_or(self.width_inches, DEFAULT_CARD_WIDTH_IN);
        self.height_inches = positive_or(self.height_inches, DEFAULT_CARD_HEIGHT_IN);
        self.dpi = positive_or(self.dpi, DEFAULT_CARD_DPI);
    }
}

// =============================================================
// Components
// =============================================================

fn default_font() -> String {
    "Arial".to_string()
}
fn default_font_size() -> f64 {
    24.0
}
fn default_black() -> String {
    "#000000".to_string()
}
fn default_white() -> String {
    "#ffffff".to_string()
}
fn default_padding() -> f64 {
    4.0
}
fn default_scale() -> f64 {
    1.0
}

/// A block of single-style (or rich) text.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextComponent {
    pub id: ComponentId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    /// Explicit height in inches; `None` means auto height from layout.
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font")]
    pub font: String,
    /// Font size in points.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_black")]
    pub color: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default = "default_white")]
    pub bg_color: String,
    /// Background opacity in `[0, 1]`; 0 draws no background.
    #[serde(default)]
    pub bg_opacity: f64,
    /// Border width in points; 0 draws no border.
    #[serde(default)]
    pub border_width: f64,
    #[serde(default = "default_black")]
    pub border_color: String,
    /// Padding in points on every side.
    #[serde(default = "default_padding")]
    pub padding: f64,
    /// Finalized rich-text document; replaces `text` for layout when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich: Option<RichText>,
}

impl TextComponent {
    /// A text component with the defaults used by "add text".
    #[must_use]
    pub fn new(id: ComponentId, x: f64, y: f64, width: f64) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height: None,
            text: "New Text".to_string(),
            font: default_font(),
            font_size: default_font_size(),
            color: default_black(),
            bold: false,
            italic: false,
            underline: false,
            align: TextAlign::Left,
            bg_color: default_white(),
            bg_opacity: 0.0,
            border_width: 0.0,
            border_color: default_black(),
            padding: default_padding(),
            rich: None,
        }
    }

    /// Explicit height if set to a positive value; anything else means auto.
    #[must_use]
    pub fn explicit_height(&self) -> Option<f64> {
        self.height.filter(|h| h.is_finite() && *h > 0.0)
    }

    /// Height of a single plain line in device pixels.
    #[must_use]
    pub fn line_height_px(&self, units: Units) -> f64 {
        units.pt_to_px(self.font_size) * TEXT_LINE_HEIGHT_RATIO
    }
}

/// A raster image placed with cover fit inside its box.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageComponent {
    pub id: ComponentId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Opaque reference to the encoded image payload.
    #[serde(default)]
    pub image_data: Option<String>,
    /// Decoded source; runtime only.
    #[serde(skip)]
    pub image: Option<CardImage>,
    /// Border width in points.
    #[serde(default)]
    pub border_width: f64,
    #[serde(default = "default_black")]
    pub border_color: String,
    /// Corner radius in points.
    #[serde(default)]
    pub corner_radius: f64,
    /// Pan offset in device pixels.
    #[serde(default)]
    pub image_offset_x: f64,
    /// Pan offset in device pixels.
    #[serde(default)]
    pub image_offset_y: f64,
    /// Zoom factor in `[0.1, 10]`.
    #[serde(default = "default_scale")]
    pub image_scale: f64,
}

impl ImageComponent {
    #[must_use]
    pub fn new(id: ComponentId, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            image_data: None,
            image: None,
            border_width: 0.0,
            border_color: default_black(),
            corner_radius: 0.0,
            image_offset_x: 0.0,
            image_offset_y: 0.0,
            image_scale: 1.0,
        }
    }
}

/// A positioned element on the card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Text(TextComponent),
    Image(ImageComponent),
}

impl Component {
    #[must_use]
    pub fn id(&self) -> ComponentId {
        match self {
            Self::Text(t) => t.id,
            Self::Image(i) => i.id,
        }
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        match self {
            Self::Text(t) => t.x,
            Self::Image(i) => i.x,
        }
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        match self {
            Self::Text(t) => t.y,
            Self::Image(i) => i.y,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        match self {
            Self::Text(t) => t.width,
            Self::Image(i) => i.width,
        }
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        match self {
            Self::Text(t) => {
                t.x = x;
                t.y = y;
            }
            Self::Image(i) => {
                i.x = x;
                i.y = y;
            }
        }
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&TextComponent> {
        match self {
            Self::Text(t) => Some(t),
            Self::Image(_) => None,
        }
    }

    #[must_use]
    pub fn as_image(&self) -> Option<&ImageComponent> {
        match self {
            Self::Image(i) => Some(i),
            Self::Text(_) => None,
        }
    }

    /// Smallest width this component may be resized to, in inches.
    #[must_use]
    pub fn min_width(&self) -> f64 {
        match self {
            Self::Text(_) => MIN_TEXT_WIDTH_IN,
            Self::Image(_) => MIN_IMAGE_SIZE_IN,
        }
    }

    /// Apply a sparse property edit.
    ///
    /// Invalid numbers never fail: non-finite values keep the last good
    /// value and out-of-range values are clamped. Fields that do not exist on
    /// this variant are ignored.
    pub fn apply_patch(&mut self, patch: &ComponentPatch) {
        match self {
            Self::Text(t) => {
                t.x = finite_or(patch.x, t.x);
                t.y = finite_or(patch.y, t.y);
                t.width = finite_or(patch.width, t.width);
                if let Some(h) = patch.height {
                    // Zero, negative or non-numeric switches back to auto height.
                    t.height = (h.is_finite() && h > 0.0).then_some(h);
                }
                if let Some(text) = &patch.text {
                    // Plain edits replace any rich formatting.
                    t.text.clone_from(text);
                    t.rich = None;
                }
                if let Some(font) = &patch.font {
                    t.font.clone_from(font);
                }
                t.font_size = finite_or(patch.font_size, t.font_size);
                if let Some(color) = &patch.color {
                    t.color.clone_from(color);
                }
                t.bold = patch.bold.unwrap_or(t.bold);
                t.italic = patch.italic.unwrap_or(t.italic);
                t.underline = patch.underline.unwrap_or(t.underline);
                t.align = patch.align.unwrap_or(t.align);
                if let Some(color) = &patch.bg_color {
                    t.bg_color.clone_from(color);
                }
                t.bg_opacity = finite_or(patch.bg_opacity, t.bg_opacity);
                t.border_width = finite_or(patch.border_width, t.border_width);
                if let Some(color) = &patch.border_color {
                    t.border_color.clone_from(color);
                }
                t.padding = finite_or(patch.padding, t.padding);
            }
            Self::Image(i) => {
                i.x = finite_or(patch.x, i.x);
                i.y = finite_or(patch.y, i.y);
                i.width = finite_or(patch.width, i.width);
                i.height = finite_or(patch.height, i.height);
                i.border_width = finite_or(patch.border_width, i.border_width);
                if let Some(color) = &patch.border_color {
                    i.border_color.clone_from(color);
                }
                i.corner_radius = finite_or(patch.corner_radius, i.corner_radius);
                i.image_offset_x = finite_or(patch.image_offset_x, i.image_offset_x);
                i.image_offset_y = finite_or(patch.image_offset_y, i.image_offset_y);
                i.image_scale = finite_or(patch.image_scale, i.image_scale);
            }
        }
        self.sanitize();
    }

    /// Bring every numeric field into range.
    ///
    /// Non-finite values take the default of a freshly added component and
    /// the rest are clamped to the same floors and ranges as property edits.
    /// Used on imported documents, whose values never went through a patch.
    pub fn sanitize(&mut self) {
        let min_width = self.min_width();
        match self {
            Self::Text(t) => {
                t.x = finite_or(Some(t.x), 0.0);
                t.y = finite_or(Some(t.y), 0.0);
                t.width = finite_or(Some(t.width), min_width).max(min_width);
                t.height = t.height.filter(|h| h.is_finite() && *h > 0.0).map(|h| h.max(MIN_TEXT_HEIGHT_IN));
                t.font_size = finite_or(Some(t.font_size), default_font_size()).clamp(MIN_FONT_SIZE_PT, MAX_FONT_SIZE_PT);
                t.bg_opacity = finite_or(Some(t.bg_opacity), 0.0).clamp(0.0, 1.0);
                t.border_width = finite_or(Some(t.border_width), 0.0).max(0.0);
                t.padding = finite_or(Some(t.padding), default_padding()).max(0.0);
            }
            Self::Image(i) => {
                i.x = finite_or(Some(i.x), 0.0);
                i.y = finite_or(Some(i.y), 0.0);
                i.width = finite_or(Some(i.width), min_width).max(min_width);
                i.height = finite_or(Some(i.height), MIN_IMAGE_SIZE_IN).max(MIN_IMAGE_SIZE_IN);
                i.border_width = finite_or(Some(i.border_width), 0.0).max(0.0);
                i.corner_radius = finite_or(Some(i.corner_radius), 0.0).max(0.0);
                i.image_offset_x = finite_or(Some(i.image_offset_x), 0.0);
                i.image_offset_y = finite_or(Some(i.image_offset_y), 0.0);
                i.image_scale = finite_or(Some(i.image_scale), 1.0).clamp(MIN_IMAGE_SCALE, MAX_IMAGE_SCALE);
            }
        }
    }
}

/// Device-pixel bounds of a component.
///
/// `auto_height_px` is the laid-out box height for auto-height text. When it
/// is not known yet the box falls back to one line height.
#[must_use]
pub fn component_bounds(component: &Component, units: Units, auto_height_px: Option<f64>) -> Rect {
    match component {
        Component::Image(i) => units.rect_to_px(i.x, i.y, i.width, i.height),
        Component::Text(t) => {
            let h = match t.explicit_height() {
                Some(h) => units.in_to_px(h),
                None => auto_height_px.unwrap_or_else(|| t.line_height_px(units)),
            };
            Rect::new(units.in_to_px(t.x), units.in_to_px(t.y), units.in_to_px(t.width), h)
        }
    }
}

/// Sparse update for a component. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    /// For text, a non-positive value means auto height.
    pub height: Option<f64>,
    pub text: Option<String>,
    pub font: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub align: Option<TextAlign>,
    pub bg_color: Option<String>,
    pub bg_opacity: Option<f64>,
    pub border_width: Option<f64>,
    pub border_color: Option<String>,
    pub padding: Option<f64>,
    pub corner_radius: Option<f64>,
    pub image_offset_x: Option<f64>,
    pub image_offset_y: Option<f64>,
    pub image_scale: Option<f64>,
}

fn finite_or(value: Option<f64>, last_good: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => last_good,
    }
}

fn positive_or(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { default }
}

// =============================================================
// Store
// =============================================================

/// Ordered in-memory store of components. Sequence order is z-order.
#[derive(Debug, Clone)]
pub struct DocStore {
    components: Vec<Component>,
    next_id: ComponentId,
}

impl DocStore {
    /// Create an empty store whose first identifier is 1.
    #[must_use]
    pub fn new() -> Self {
        Self { components: Vec::new(), next_id: 1 }
    }

    /// Reserve the next identifier.
    pub fn allocate_id(&mut self) -> ComponentId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// The identifier the next added component will receive.
    #[must_use]
    pub fn next_id(&self) -> ComponentId {
        self.next_id
    }

    /// Append a component on top of the z-order.
    pub fn push(&mut self, component: Component) {
        self.next_id = self.next_id.max(component.id().saturating_add(1));
        self.components.push(component);
    }

    /// Remove a component by id, returning it if it was present.
    pub fn remove(&mut self, id: ComponentId) -> Option<Component> {
        let idx = self.index_of(id)?;
        Some(self.components.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id() == id)
    }

    #[must_use]
    pub fn index_of(&self, id: ComponentId) -> Option<usize> {
        self.components.iter().position(|c| c.id() == id)
    }

    /// Swap a component with its neighbour in the given direction.
    /// Returns false when the component is missing or already at that end.
    pub fn move_by(&mut self, id: ComponentId, direction: ZMove) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let to = match direction {
            ZMove::Backward => idx.checked_sub(1),
            ZMove::Forward => Some(idx + 1).filter(|to| *to < self.components.len()),
        };
        let Some(to) = to else {
            return false;
        };
        self.components.swap(idx, to);
        true
    }

    /// Components bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Component> {
        self.components.iter()
    }

    /// Components top to bottom, for picking.
    pub fn iter_topmost_first(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().rev()
    }

    /// Identifiers in z-order.
    #[must_use]
    pub fn ids(&self) -> Vec<ComponentId> {
        self.components.iter().map(Component::id).collect()
    }

    /// Replace all components. `next_id` is raised above every loaded id.
    pub fn load(&mut self, components: Vec<Component>, next_id: ComponentId) {
        let max_id = components.iter().map(Component::id).max().unwrap_or(0);
        self.components = components;
        self.next_id = next_id.max(max_id.saturating_add(1));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for DocStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================
// Serializable document
// =============================================================

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// The serializable card document: card settings, components and id counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: u32,
    pub card: Card,
    pub components: Vec<Component>,
    #[serde(default)]
    pub next_id: Option<ComponentId>,
}

impl Document {
    /// Parse and validate a document. Malformed input is rejected wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Json`] for invalid JSON and
    /// [`CanvasError::InvalidDocument`] for missing fields or duplicate ids.
    pub fn from_json(text: &str) -> Result<Self, CanvasError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.get("card").is_some_and(serde_json::Value::is_object) {
            return Err(CanvasError::InvalidDocument("missing `card` object".into()));
        }
        if !value.get("components").is_some_and(serde_json::Value::is_array) {
            return Err(CanvasError::InvalidDocument("missing `components` array".into()));
        }
        let document: Self =
            serde_json::from_value(value).map_err(|e| CanvasError::InvalidDocument(e.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Pretty JSON for export.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, CanvasError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check structural invariants that sanitizing cannot repair.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDocument`] on duplicate component ids or
    /// an id that leaves no room for the next one.
    pub fn validate(&self) -> Result<(), CanvasError> {
        let mut seen = HashSet::new();
        for component in &self.components {
            if component.id() == ComponentId::MAX {
                return Err(CanvasError::InvalidDocument(format!("component id {} is out of range", component.id())));
            }
            if !seen.insert(component.id()) {
                return Err(CanvasError::InvalidDocument(format!("duplicate component id {}", component.id())));
            }
        }
        Ok(())
    }

    /// The id counter to resume from: stored value, but never at or below an existing id.
    #[must_use]
    pub fn resolved_next_id(&self) -> ComponentId {
        let max_id = self.components.iter().map(Component::id).max().unwrap_or(0);
        self.next_id.unwrap_or(0).max(max_id.saturating_add(1))
    }

    /// `(id, reference)` for every image component carrying an image reference.
    pub fn image_refs(&self) -> impl Iterator<Item = (ComponentId, &str)> {
        self.components.iter().filter_map(|c| match c {
            Component::Image(i) => i.image_data.as_deref().map(|r| (i.id, r)),
            Component::Text(_) => None,
        })
    }
}

/// Replace characters outside `[A-Za-z0-9_-]` with `_`.
#[must_use]
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
