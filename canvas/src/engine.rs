use tiny_skia::Pixmap;
use tracing::{debug, warn};

use crate::assets::{CardImage, ResolvedImages};
use crate::consts::{
    DOCUMENT_VERSION, DRAG_MAX_LEFT_OVERHANG, DRAG_MIN_Y_IN, INLINE_EDITOR_MIN_H_PX, INLINE_EDITOR_MIN_W_PX,
    MAX_IMAGE_SCALE, MIN_IMAGE_SCALE, MIN_IMAGE_SIZE_IN, MIN_TEXT_HEIGHT_IN, MIN_TEXT_WIDTH_IN, WHEEL_ZOOM_FINE_STEP,
    WHEEL_ZOOM_STEP,
};
use crate::doc::{
    BackgroundFit, Card, Component, ComponentId, ComponentPatch, DocStore, Document, ImageComponent, TextComponent,
    ZMove, sanitize_file_stem,
};
use crate::error::CanvasError;
use crate::fit::{clamp_pan, pan_limits};
use crate::font::{FontBook, FontProvider};
use crate::hit::{Handle, HitPart, hit_body, hit_handle, hit_test, pick_topmost};
use crate::input::{Button, CursorStyle, EngineEvent, InputState, Key, Modifiers, OrigBox, UiState, WheelDelta};
use crate::layout::{Geometry, LayoutCache};
use crate::render::{Scene, draw};
use crate::rich_text::RichText;
use crate::units::{Point, Rect, Units};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Request for the host to open its inline text editor over a component.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditRequest {
    pub id: ComponentId,
    /// Current text to seed the editor with.
    pub text: String,
    /// Editor box in device pixels, at least 60x30.
    pub bounds: Rect,
    pub font_family: String,
    pub font_px: f64,
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The surface is stale and should be redrawn.
    RenderNeeded,
    SelectionChanged(Option<ComponentId>),
    ComponentAdded(ComponentId),
    ComponentUpdated(ComponentId),
    ComponentDeleted(ComponentId),
    EditTextRequested(TextEditRequest),
    SetCursor(CursorStyle),
    /// A change was committed; the persistence sink should be scheduled.
    SaveRequested,
}

/// Core engine state: the editing session.
///
/// Owns the card, the component store, selection and the active interaction.
/// Every mutation goes through a method that returns the [`Action`]s the host
/// must react to; nothing here touches a display or storage.
pub struct EngineCore {
    pub card: Card,
    pub doc: DocStore,
    pub ui: UiState,
    pub input: InputState,
    pub background: Option<CardImage>,
    fonts: Box<dyn FontProvider>,
    layouts: LayoutCache,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_fonts(Box::new(FontBook::bundled()))
    }
}

impl EngineCore {
    /// An empty session measuring and drawing with the bundled face.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty session using `fonts` for measurement and glyph outlines.
    #[must_use]
    pub fn with_fonts(fonts: Box<dyn FontProvider>) -> Self {
        Self {
            card: Card::default(),
            doc: DocStore::new(),
            ui: UiState::default(),
            input: InputState::default(),
            background: None,
            fonts,
            layouts: LayoutCache::new(),
        }
    }

    #[must_use]
    pub fn units(&self) -> Units {
        self.card.units()
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry<'_> {
        Geometry::new(self.units(), self.fonts.as_ref(), &self.layouts)
    }

    // --- Queries ---

    /// The currently selected component, if any.
    #[must_use]
    pub fn selection(&self) -> Option<ComponentId> {
        self.ui.selected_id
    }

    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.doc.get(id)
    }

    /// Device-pixel bounds of a component, with text auto height resolved.
    #[must_use]
    pub fn bounds(&self, id: ComponentId) -> Option<Rect> {
        let geometry = self.geometry();
        self.doc.get(id).map(|c| geometry.bounds(c))
    }

    // --- Component CRUD ---

    /// Add a default text component, stacked below earlier text, and select it.
    pub fn add_text(&mut self) -> Vec<Action> {
        let id = self.doc.allocate_id();
        let text_count = self.doc.iter().filter(|c| c.as_text().is_some()).count();
        let text = TextComponent::new(
            id,
            self.card.width_inches * 0.1,
            0.25 + 0.5 * text_count as f64,
            self.card.width_inches * 0.8,
        );
        self.doc.push(Component::Text(text));
        debug!(id, "text component added");
        self.added(id)
    }

    /// Add an image component fitted inside 60% x 50% of the card, centered, and select it.
    pub fn add_image(&mut self, image: CardImage, reference: Option<String>) -> Vec<Action> {
        let id = self.doc.allocate_id();
        let max_w = self.card.width_inches * 0.6;
        let max_h = self.card.height_inches * 0.5;
        let aspect = image.aspect();
        let (mut w, mut h) = (max_w, max_w / aspect);
        if h > max_h {
            h = max_h;
            w = max_h * aspect;
        }
        let w = w.max(MIN_IMAGE_SIZE_IN);
        let h = h.max(MIN_IMAGE_SIZE_IN);
        let mut component =
            ImageComponent::new(id, (self.card.width_inches - w) / 2.0, (self.card.height_inches - h) / 2.0, w, h);
        component.image = Some(image);
        component.image_data = reference;
        self.doc.push(Component::Image(component));
        debug!(id, "image component added");
        self.added(id)
    }

    fn added(&mut self, id: ComponentId) -> Vec<Action> {
        self.ui.selected_id = Some(id);
        vec![
            Action::ComponentAdded(id),
            Action::SelectionChanged(Some(id)),
            Action::RenderNeeded,
            Action::SaveRequested,
        ]
    }

    /// Remove a component. Its identifier is never reused.
    pub fn delete_component(&mut self, id: ComponentId) -> Vec<Action> {
        if self.doc.remove(id).is_none() {
            return Vec::new();
        }
        debug!(id, "component deleted");
        let mut actions = vec![Action::ComponentDeleted(id)];
        if self.input.target() == Some(id) {
            self.input = InputState::Idle;
        }
        if self.ui.editing == Some(id) {
            self.ui.editing = None;
        }
        if self.ui.selected_id == Some(id) {
            self.ui.selected_id = None;
            actions.push(Action::SelectionChanged(None));
        }
        actions.extend([Action::RenderNeeded, Action::SaveRequested]);
        actions
    }

    /// Swap a component with its neighbour in z-order.
    pub fn move_component(&mut self, id: ComponentId, direction: ZMove) -> Vec<Action> {
        if !self.doc.move_by(id, direction) {
            return Vec::new();
        }
        vec![Action::ComponentUpdated(id), Action::RenderNeeded, Action::SaveRequested]
    }

    /// Select a component, or clear the selection with `None`. Unknown ids clear it.
    pub fn select(&mut self, id: Option<ComponentId>) -> Vec<Action> {
        let id = id.filter(|id| self.doc.get(*id).is_some());
        if self.ui.selected_id == id {
            return Vec::new();
        }
        self.ui.selected_id = id;
        vec![Action::SelectionChanged(id), Action::RenderNeeded]
    }

    /// Apply a sanitized sparse property edit.
    pub fn apply_patch(&mut self, id: ComponentId, patch: &ComponentPatch) -> Vec<Action> {
        let units = self.units();
        let Some(component) = self.doc.get_mut(id) else {
            return Vec::new();
        };
        component.apply_patch(patch);
        if let Component::Image(image) = component {
            clamp_image_pan(image, units);
        }
        Self::updated(id)
    }

    /// Attach (or clear) a finalized rich-text document on a text component.
    pub fn set_rich_text(&mut self, id: ComponentId, rich: Option<RichText>) -> Vec<Action> {
        let Some(Component::Text(text)) = self.doc.get_mut(id) else {
            return Vec::new();
        };
        if let Some(rich) = &rich {
            text.text = rich.plain_text();
        }
        text.rich = rich;
        Self::updated(id)
    }

    /// Replace the source of an image component, keeping its box, pan and zoom.
    pub fn set_image(&mut self, id: ComponentId, image: CardImage, reference: Option<String>) -> Vec<Action> {
        let units = self.units();
        let Some(Component::Image(component)) = self.doc.get_mut(id) else {
            return Vec::new();
        };
        component.image = Some(image);
        component.image_data = reference;
        clamp_image_pan(component, units);
        Self::updated(id)
    }

    pub fn reset_pan(&mut self, id: ComponentId) -> Vec<Action> {
        let Some(Component::Image(component)) = self.doc.get_mut(id) else {
            return Vec::new();
        };
        component.image_offset_x = 0.0;
        component.image_offset_y = 0.0;
        Self::updated(id)
    }

    pub fn reset_zoom(&mut self, id: ComponentId) -> Vec<Action> {
        let units = self.units();
        let Some(Component::Image(component)) = self.doc.get_mut(id) else {
            return Vec::new();
        };
        component.image_scale = 1.0;
        clamp_image_pan(component, units);
        Self::updated(id)
    }

    fn updated(id: ComponentId) -> Vec<Action> {
        vec![Action::ComponentUpdated(id), Action::RenderNeeded, Action::SaveRequested]
    }

    // --- Card ---

    /// Resize the card. Non-finite or non-positive values fall back to the defaults.
    pub fn set_card_size(&mut self, width_inches: f64, height_inches: f64, dpi: f64) -> Vec<Action> {
        self.card.width_inches = width_inches;
        self.card.height_inches = height_inches;
        self.card.dpi = dpi;
        self.card.sanitize();
        let units = self.units();
        for id in self.doc.ids() {
            if let Some(Component::Image(image)) = self.doc.get_mut(id) {
                clamp_image_pan(image, units);
            }
        }
        debug!(w = self.card.width_inches, h = self.card.height_inches, dpi = self.card.dpi, "card resized");
        vec![Action::RenderNeeded, Action::SaveRequested]
    }

    pub fn set_card_name(&mut self, name: &str) -> Vec<Action> {
        self.card.name = name.to_string();
        vec![Action::SaveRequested]
    }

    pub fn set_background(&mut self, image: CardImage, reference: Option<String>) -> Vec<Action> {
        self.background = Some(image);
        self.card.background_image_data = reference;
        vec![Action::RenderNeeded, Action::SaveRequested]
    }

    pub fn remove_background(&mut self) -> Vec<Action> {
        self.background = None;
        self.card.background_image_data = None;
        vec![Action::RenderNeeded, Action::SaveRequested]
    }

    pub fn set_background_fit(&mut self, fit: BackgroundFit) -> Vec<Action> {
        self.card.background_fit = fit;
        vec![Action::RenderNeeded, Action::SaveRequested]
    }

    // --- Pointer input ---

    /// Start an interaction.
    ///
    /// Precedence with a selection: Alt on the selected image's body pans,
    /// then the selected component's handles resize. Otherwise the topmost
    /// body under the pointer is selected and dragged; empty space deselects.
    pub fn on_pointer_down(&mut self, pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let geometry = self.geometry();
        let dpi = self.card.dpi;

        if let Some(sel) = self.ui.selected_id.and_then(|id| self.doc.get(id)) {
            let bounds = geometry.bounds(sel);
            if let Component::Image(image) = sel
                && modifiers.alt
                && hit_body(bounds, pt)
            {
                self.input = InputState::Panning {
                    id: image.id,
                    anchor: pt,
                    orig_offset: Point::new(image.image_offset_x, image.image_offset_y),
                };
                debug!(id = image.id, "pan started");
                return self.set_cursor(CursorStyle::Grabbing);
            }
            if let Some(handle) = hit_handle(sel, bounds, pt, dpi) {
                let orig = OrigBox {
                    x: sel.x(),
                    y: sel.y(),
                    w: sel.width(),
                    h: self.units().px_to_in(bounds.h),
                };
                self.input = InputState::Resizing { id: sel.id(), handle, anchor: pt, orig };
                debug!(id = sel.id(), handle = handle.code(), "resize started");
                return Vec::new();
            }
        }

        let Some(id) = pick_topmost(&self.doc, &geometry, pt) else {
            self.input = InputState::Idle;
            if self.ui.selected_id.take().is_some() {
                return vec![Action::SelectionChanged(None), Action::RenderNeeded];
            }
            return Vec::new();
        };
        let Some(component) = self.doc.get(id) else {
            return Vec::new();
        };
        self.input = InputState::Dragging { id, anchor: pt, orig_x: component.x(), orig_y: component.y() };
        debug!(id, "drag started");
        let mut actions = Vec::new();
        if self.ui.selected_id != Some(id) {
            self.ui.selected_id = Some(id);
            actions.push(Action::SelectionChanged(Some(id)));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Update the active interaction from the total pointer delta, or emit a cursor hint when idle.
    pub fn on_pointer_move(&mut self, pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let units = self.units();
        let card_width = self.card.width_inches;
        match self.input.clone() {
            InputState::Idle => {
                let cursor = self.hover_cursor(pt, modifiers);
                self.set_cursor(cursor)
            }
            InputState::Dragging { id, anchor, orig_x, orig_y } => {
                let Some(component) = self.doc.get_mut(id) else {
                    return Vec::new();
                };
                let delta = units.delta_to_in(pt.delta_from(anchor));
                let min_x = -component.width() * DRAG_MAX_LEFT_OVERHANG;
                let x = (orig_x + delta.x).max(min_x).min(card_width);
                let y = (orig_y + delta.y).max(DRAG_MIN_Y_IN);
                component.set_position(x, y);
                vec![Action::RenderNeeded]
            }
            InputState::Resizing { id, handle, anchor, orig } => {
                let Some(component) = self.doc.get_mut(id) else {
                    return Vec::new();
                };
                let delta = units.delta_to_in(pt.delta_from(anchor));
                match component {
                    Component::Image(image) => {
                        resize_image(image, handle, orig, delta);
                        clamp_image_pan(image, units);
                    }
                    Component::Text(text) => resize_text(text, handle, orig, delta),
                }
                vec![Action::RenderNeeded]
            }
            InputState::Panning { id, anchor, orig_offset } => {
                let Some(Component::Image(image)) = self.doc.get_mut(id) else {
                    return Vec::new();
                };
                let delta = pt.delta_from(anchor);
                image.image_offset_x = orig_offset.x + delta.x;
                image.image_offset_y = orig_offset.y + delta.y;
                clamp_image_pan(image, units);
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Finish the active interaction. This is the commit point for persistence.
    pub fn on_pointer_up(&mut self, _pt: Point) -> Vec<Action> {
        let Some(id) = std::mem::take(&mut self.input).target() else {
            return Vec::new();
        };
        debug!(id, "interaction committed");
        let mut actions = vec![Action::ComponentUpdated(id), Action::RenderNeeded, Action::SaveRequested];
        if self.ui.cursor == CursorStyle::Grabbing {
            actions.extend(self.set_cursor(CursorStyle::Default));
        }
        actions
    }

    /// Pointer left the surface: commit exactly like pointer-up.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.on_pointer_up(Point::default())
    }

    /// Zoom the selected image's content when the wheel turns over its body.
    pub fn on_wheel(&mut self, pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if delta.dy == 0.0 || !delta.dy.is_finite() {
            return Vec::new();
        }
        let geometry = self.geometry();
        let Some(selected) = self.ui.selected_id.and_then(|id| self.doc.get(id)) else {
            return Vec::new();
        };
        if !selected.is_image() || !hit_body(geometry.bounds(selected), pt) {
            return Vec::new();
        }
        let id = selected.id();
        let units = self.units();
        let Some(Component::Image(image)) = self.doc.get_mut(id) else {
            return Vec::new();
        };
        let step = if modifiers.ctrl { WHEEL_ZOOM_FINE_STEP } else { WHEEL_ZOOM_STEP };
        let step = if delta.dy < 0.0 { step } else { -step };
        image.image_scale = (image.image_scale + step).clamp(MIN_IMAGE_SCALE, MAX_IMAGE_SCALE);
        clamp_image_pan(image, units);
        Self::updated(id)
    }

    /// Open the inline editor on the topmost text component under the pointer.
    pub fn on_double_click(&mut self, pt: Point) -> Vec<Action> {
        let geometry = self.geometry();
        let Some((text, bounds)) = self
            .doc
            .iter_topmost_first()
            .filter_map(|c| c.as_text().map(|t| (t, geometry.bounds(c))))
            .find(|(_, bounds)| hit_body(*bounds, pt))
        else {
            return Vec::new();
        };
        let request = TextEditRequest {
            id: text.id,
            text: text.text.clone(),
            bounds: Rect::new(
                bounds.x,
                bounds.y,
                bounds.w.max(INLINE_EDITOR_MIN_W_PX),
                bounds.h.max(INLINE_EDITOR_MIN_H_PX),
            ),
            font_family: text.font.clone(),
            font_px: self.units().pt_to_px(text.font_size),
        };
        let id = text.id;
        self.ui.editing = Some(id);
        let mut actions = Vec::new();
        if self.ui.selected_id != Some(id) {
            self.ui.selected_id = Some(id);
            actions.push(Action::SelectionChanged(Some(id)));
        }
        actions.extend([Action::RenderNeeded, Action::EditTextRequested(request)]);
        actions
    }

    /// Delete/Backspace removes the selection; Escape discards an open inline edit.
    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        if self.ui.editing.is_some() {
            if key.is_escape() {
                return self.cancel_text_edit();
            }
            return Vec::new();
        }
        match self.ui.selected_id {
            Some(id) if key.is_delete() => self.delete_component(id),
            _ => Vec::new(),
        }
    }

    /// Commit the inline editor's text into the component being edited.
    pub fn commit_text(&mut self, text: &str) -> Vec<Action> {
        let Some(id) = self.ui.editing.take() else {
            return Vec::new();
        };
        let Some(Component::Text(component)) = self.doc.get_mut(id) else {
            return Vec::new();
        };
        component.text = text.to_string();
        component.rich = None;
        Self::updated(id)
    }

    /// Close the inline editor without changing the component.
    pub fn cancel_text_edit(&mut self) -> Vec<Action> {
        match self.ui.editing.take() {
            Some(_) => vec![Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    /// Dispatch a serialized input event.
    pub fn apply(&mut self, event: &EngineEvent) -> Vec<Action> {
        match event {
            EngineEvent::PointerDown { x, y, button, modifiers } => {
                self.on_pointer_down(Point::new(*x, *y), *button, *modifiers)
            }
            EngineEvent::PointerMove { x, y, modifiers } => self.on_pointer_move(Point::new(*x, *y), *modifiers),
            EngineEvent::PointerUp { x, y } => self.on_pointer_up(Point::new(*x, *y)),
            EngineEvent::PointerLeave => self.on_pointer_leave(),
            EngineEvent::Wheel { x, y, delta, modifiers } => self.on_wheel(Point::new(*x, *y), *delta, *modifiers),
            EngineEvent::DoubleClick { x, y } => self.on_double_click(Point::new(*x, *y)),
            EngineEvent::KeyDown { key } => self.on_key_down(key, Modifiers::default()),
            EngineEvent::CommitText { text } => self.commit_text(text),
            EngineEvent::CancelTextEdit => self.cancel_text_edit(),
            EngineEvent::AddText => self.add_text(),
            EngineEvent::Select { id } => self.select(*id),
            EngineEvent::Delete { id } => self.delete_component(*id),
            EngineEvent::Move { id, direction } => self.move_component(*id, *direction),
            EngineEvent::Patch { id, patch } => self.apply_patch(*id, patch),
            EngineEvent::ResetPan { id } => self.reset_pan(*id),
            EngineEvent::ResetZoom { id } => self.reset_zoom(*id),
        }
    }

    fn hover_cursor(&self, pt: Point, modifiers: Modifiers) -> CursorStyle {
        let geometry = self.geometry();
        if let Some(sel) = self.ui.selected_id.and_then(|id| self.doc.get(id)) {
            let bounds = geometry.bounds(sel);
            if let Some(handle) = hit_handle(sel, bounds, pt, self.card.dpi) {
                return handle.cursor();
            }
            if modifiers.alt && sel.is_image() && hit_body(bounds, pt) {
                return CursorStyle::Grab;
            }
        }
        match hit_test(&self.doc, &geometry, pt, None) {
            Some(hit) if hit.part == HitPart::Body => CursorStyle::Move,
            _ => CursorStyle::Default,
        }
    }

    fn set_cursor(&mut self, cursor: CursorStyle) -> Vec<Action> {
        if self.ui.cursor == cursor {
            return Vec::new();
        }
        self.ui.cursor = cursor;
        vec![Action::SetCursor(cursor)]
    }

    // --- Document exchange ---

    /// Snapshot of the current document for persistence.
    #[must_use]
    pub fn serialize(&self) -> Document {
        Document {
            version: DOCUMENT_VERSION,
            card: self.card.clone(),
            components: self.doc.iter().cloned().collect(),
            next_id: Some(self.doc.next_id()),
        }
    }

    /// Replace the session with `document`, attaching decoded images.
    ///
    /// References that failed to decode are cleared so the component falls
    /// back to its placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDocument`] if the document violates a
    /// structural invariant; the session is left unchanged.
    pub fn hydrate(&mut self, document: Document, images: &ResolvedImages) -> Result<Vec<Action>, CanvasError> {
        document.validate()?;
        let next_id = document.resolved_next_id();
        let mut card = document.card;
        card.sanitize();
        let units = card.units();

        if images.background_failed() {
            warn!("dropping background reference that failed to decode");
            card.background_image_data = None;
        }
        self.background = images.background().cloned();

        let mut components = document.components;
        for component in &mut components {
            match component {
                Component::Image(image) => {
                    if images.component_failed(image.id) {
                        warn!(id = image.id, "dropping image reference that failed to decode");
                        image.image_data = None;
                    }
                    image.image = images.component(image.id).cloned();
                }
                Component::Text(_) => {}
            }
            component.sanitize();
        }

        self.card = card;
        self.doc.load(components, next_id);
        self.ui = UiState::default();
        self.input = InputState::Idle;
        self.layouts.clear();
        debug!(components = self.doc.len(), next_id = self.doc.next_id(), dpi = units.dpi, "document hydrated");
        Ok(vec![Action::SelectionChanged(None), Action::RenderNeeded])
    }

    // --- Render / export ---

    /// Everything the renderer needs for one frame.
    #[must_use]
    pub fn scene(&self, show_handles: bool) -> Scene<'_> {
        Scene {
            card: &self.card,
            background: self.background.as_ref(),
            doc: &self.doc,
            geometry: self.geometry(),
            selected: if show_handles { self.ui.selected_id } else { None },
        }
    }

    /// Draw the full card into `surface`, which must match the card's pixel size.
    pub fn render_into(&self, surface: &mut Pixmap, show_handles: bool) {
        draw(surface, &self.scene(show_handles));
    }

    /// Draw the full card into a fresh surface.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Surface`] if a surface of the card's pixel size
    /// cannot be allocated.
    pub fn render(&self, show_handles: bool) -> Result<Pixmap, CanvasError> {
        let mut surface = self.new_surface()?;
        self.render_into(&mut surface, show_handles);
        Ok(surface)
    }

    /// Render without the selection overlay and encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Surface`] or [`CanvasError::Encode`].
    pub fn export_png(&self) -> Result<Vec<u8>, CanvasError> {
        self.render(false)?.encode_png().map_err(|e| CanvasError::Encode(e.to_string()))
    }

    /// `{name}_{w}x{h}in_{dpi}dpi.png`
    #[must_use]
    pub fn export_file_name(&self) -> String {
        let raw = format!(
            "{}_{}x{}in_{}dpi",
            self.card.name, self.card.width_inches, self.card.height_inches, self.card.dpi
        );
        format!("{}.png", sanitize_file_stem(&raw))
    }

    /// `{name}_template.json`
    #[must_use]
    pub fn template_file_name(&self) -> String {
        format!("{}_template.json", sanitize_file_stem(&self.card.name))
    }

    fn new_surface(&self) -> Result<Pixmap, CanvasError> {
        let (width, height) = (self.card.pixel_width(), self.card.pixel_height());
        Pixmap::new(width, height).ok_or(CanvasError::Surface { width, height })
    }
}

/// Corner handles move the adjacent edges; the opposite edge stays put once a size floors.
fn resize_image(image: &mut ImageComponent, handle: Handle, orig: OrigBox, delta: Point) {
    let grow_right = orig.w + delta.x;
    let grow_down = orig.h + delta.y;
    let grow_left = orig.w - delta.x;
    let grow_up = orig.h - delta.y;
    let (w, h) = match handle {
        Handle::BottomRight => (grow_right, grow_down),
        Handle::BottomLeft => (grow_left, grow_down),
        Handle::TopRight => (grow_right, grow_up),
        Handle::TopLeft => (grow_left, grow_up),
        Handle::Bottom => (orig.w, grow_down),
        Handle::Right => (grow_right, orig.h),
    };
    image.width = w.max(MIN_IMAGE_SIZE_IN);
    image.height = h.max(MIN_IMAGE_SIZE_IN);
    image.x = if matches!(handle, Handle::TopLeft | Handle::BottomLeft) { orig.x + orig.w - image.width } else { orig.x };
    image.y = if matches!(handle, Handle::TopLeft | Handle::TopRight) { orig.y + orig.h - image.height } else { orig.y };
}

/// Text resizes by its right edge (width) and bottom edge (explicit height).
fn resize_text(text: &mut TextComponent, handle: Handle, orig: OrigBox, delta: Point) {
    match handle {
        Handle::Right => text.width = (orig.w + delta.x).max(MIN_TEXT_WIDTH_IN),
        Handle::Bottom => text.height = Some((orig.h + delta.y).max(MIN_TEXT_HEIGHT_IN)),
        _ => {}
    }
}

/// Keep a stored pan offset inside the range that still covers the box.
fn clamp_image_pan(image: &mut ImageComponent, units: Units) {
    let Some(source) = &image.image else {
        return;
    };
    let limits = pan_limits(
        f64::from(source.width()),
        f64::from(source.height()),
        units.in_to_px(image.width),
        units.in_to_px(image.height),
        image.image_scale,
    );
    let pan = clamp_pan(Point::new(image.image_offset_x, image.image_offset_y), limits);
    image.image_offset_x = pan.x;
    image.image_offset_y = pan.y;
}

/// The full canvas engine: the session plus a reusable drawing surface.
pub struct Engine {
    surface: Option<Pixmap>,
    pub core: EngineCore,
}

impl Engine {
    #[must_use]
    pub fn new(core: EngineCore) -> Self {
        Self { surface: None, core }
    }

    // --- Delegated input ---

    pub fn apply(&mut self, event: &EngineEvent) -> Vec<Action> {
        self.core.apply(event)
    }

    pub fn hydrate(&mut self, document: Document, images: &ResolvedImages) -> Result<Vec<Action>, CanvasError> {
        self.core.hydrate(document, images)
    }

    #[must_use]
    pub fn serialize(&self) -> Document {
        self.core.serialize()
    }

    // --- Render ---

    /// Draw the current state, reusing the surface while the card size is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Surface`] if a new surface cannot be allocated.
    pub fn render(&mut self, show_handles: bool) -> Result<&Pixmap, CanvasError> {
        let (width, height) = (self.core.card.pixel_width(), self.core.card.pixel_height());
        let reusable = self.surface.as_ref().is_some_and(|s| s.width() == width && s.height() == height);
        if !reusable {
            self.surface = Some(self.core.new_surface()?);
        }
        let surface = self.surface.as_mut().ok_or(CanvasError::Surface { width, height })?;
        self.core.render_into(surface, show_handles);
        Ok(&*surface)
    }

    /// # Errors
    ///
    /// See [`EngineCore::export_png`].
    pub fn export_png(&self) -> Result<Vec<u8>, CanvasError> {
        self.core.export_png()
    }
}
