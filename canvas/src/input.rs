//! Input model: modifier keys, buttons, cursors, and the interaction state machine.
//!
//! `Modifiers` capture the user's intent at the time of a pointer event: Alt
//! on an image body pans its content, Ctrl makes wheel zoom fine-grained.
//! `InputState` is the active interaction tracked between pointer-down and
//! pointer-up, carrying the anchor and original geometry needed to recompute
//! the component from the total pointer delta on every move.
//! `EngineEvent` is the serializable form of every input, used to script the
//! engine deterministically.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::doc::{ComponentId, ComponentPatch, ZMove};
use crate::hit::Handle;
use crate::units::Point;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    /// Precision modifier for wheel zoom.
    pub ctrl: bool,
    /// Pan modifier for image bodies.
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    #[must_use]
    pub fn alt() -> Self {
        Self { alt: true, ..Self::default() }
    }

    #[must_use]
    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key, named as the host platform reports it (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Delete or Backspace.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.0 == "Delete" || self.0 == "Backspace"
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (negative = away from the user, zooms in).
    pub dy: f64,
}

/// Pointer cursor hint for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorStyle {
    #[default]
    Default,
    Move,
    Grab,
    Grabbing,
    ResizeNwse,
    ResizeNesw,
    ResizeEw,
    ResizeNs,
}

impl CursorStyle {
    /// CSS cursor keyword.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Move => "move",
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
            Self::ResizeNwse => "nwse-resize",
            Self::ResizeNesw => "nesw-resize",
            Self::ResizeEw => "ew-resize",
            Self::ResizeNs => "ns-resize",
        }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    /// The id of the currently selected component, if any.
    pub selected_id: Option<ComponentId>,
    /// Text component currently open in the inline editor.
    pub editing: Option<ComponentId>,
    /// Last cursor hint emitted, to avoid repeating it on every move.
    pub cursor: CursorStyle,
}

/// Component box captured when a resize starts, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrigBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// The interaction in progress between pointer-down and pointer-up.
///
/// Each active variant carries the pointer anchor (device pixels) and the
/// component state at pointer-down, so every move applies the total delta
/// from the anchor rather than accumulating increments.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// No interaction in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Moving a component.
    Dragging {
        id: ComponentId,
        anchor: Point,
        /// Component x at pointer-down, inches.
        orig_x: f64,
        /// Component y at pointer-down, inches.
        orig_y: f64,
    },
    /// Resizing a component by one of its handles.
    Resizing {
        id: ComponentId,
        handle: Handle,
        anchor: Point,
        orig: OrigBox,
    },
    /// Panning the content of an image component.
    Panning {
        id: ComponentId,
        anchor: Point,
        /// Pan offset at pointer-down, device pixels.
        orig_offset: Point,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Component the active interaction addresses.
    #[must_use]
    pub fn target(&self) -> Option<ComponentId> {
        match self {
            Self::Idle => None,
            Self::Dragging { id, .. } | Self::Resizing { id, .. } | Self::Panning { id, .. } => Some(*id),
        }
    }
}

/// Serializable engine input, one per host event or editor command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
    },
    PointerLeave,
    Wheel {
        x: f64,
        y: f64,
        #[serde(default)]
        delta: WheelDelta,
        #[serde(default)]
        modifiers: Modifiers,
    },
    DoubleClick {
        x: f64,
        y: f64,
    },
    KeyDown {
        key: Key,
    },
    CommitText {
        text: String,
    },
    CancelTextEdit,
    AddText,
    Select {
        id: Option<ComponentId>,
    },
    Delete {
        id: ComponentId,
    },
    Move {
        id: ComponentId,
        direction: ZMove,
    },
    Patch {
        id: ComponentId,
        patch: ComponentPatch,
    },
    ResetPan {
        id: ComponentId,
    },
    ResetZoom {
        id: ComponentId,
    },
}
