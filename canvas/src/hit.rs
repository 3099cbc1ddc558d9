//! Hit-testing: resize handles on the selected component and body picking.
//!
//! All coordinates are device pixels. Bounds come from
//! [`crate::layout::Geometry`], so text auto heights match what was drawn.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use serde::{Deserialize, Serialize};

use crate::consts::{HANDLE_DPI_DIVISOR, HANDLE_MIN_PX, HANDLE_TOLERANCE_RATIO};
use crate::doc::{Component, ComponentId, DocStore};
use crate::input::CursorStyle;
use crate::layout::Geometry;
use crate::units::{Point, Rect};

/// Resize handle on a component's border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    #[serde(rename = "tl")]
    TopLeft,
    #[serde(rename = "tr")]
    TopRight,
    #[serde(rename = "bl")]
    BottomLeft,
    #[serde(rename = "br")]
    BottomRight,
    #[serde(rename = "b")]
    Bottom,
    #[serde(rename = "r")]
    Right,
}

impl Handle {
    /// Test order: corners (images only) before edges.
    pub const ORDER: [Handle; 6] =
        [Self::TopLeft, Self::TopRight, Self::BottomLeft, Self::BottomRight, Self::Bottom, Self::Right];

    /// Short code used in documents and logs.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopRight => "tr",
            Self::BottomLeft => "bl",
            Self::BottomRight => "br",
            Self::Bottom => "b",
            Self::Right => "r",
        }
    }

    #[must_use]
    pub fn is_corner(self) -> bool {
        !matches!(self, Self::Bottom | Self::Right)
    }

    /// Resize cursor shown while hovering this handle.
    #[must_use]
    pub fn cursor(self) -> CursorStyle {
        match self {
            Self::TopLeft | Self::BottomRight => CursorStyle::ResizeNwse,
            Self::TopRight | Self::BottomLeft => CursorStyle::ResizeNesw,
            Self::Bottom => CursorStyle::ResizeNs,
            Self::Right => CursorStyle::ResizeEw,
        }
    }

    /// Center of this handle on `bounds`.
    #[must_use]
    pub fn anchor(self, bounds: Rect) -> Point {
        let Rect { x, y, w, h } = bounds;
        match self {
            Self::TopLeft => Point::new(x, y),
            Self::TopRight => Point::new(x + w, y),
            Self::BottomLeft => Point::new(x, y + h),
            Self::BottomRight => Point::new(x + w, y + h),
            Self::Bottom => Point::new(x + w / 2.0, y + h),
            Self::Right => Point::new(x + w, y + h / 2.0),
        }
    }
}

/// Which part of a component was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    Handle(Handle),
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub id: ComponentId,
    pub part: HitPart,
}

/// Edge length of a handle square: `max(10, dpi / 22)`.
#[must_use]
pub fn handle_size(dpi: f64) -> f64 {
    HANDLE_MIN_PX.max(dpi / HANDLE_DPI_DIVISOR)
}

/// Half-width of the square region around a handle center that counts as a hit.
#[must_use]
pub fn handle_tolerance(dpi: f64) -> f64 {
    handle_size(dpi) * HANDLE_TOLERANCE_RATIO
}

/// Handles a component exposes, in test order.
pub fn handles_for(component: &Component) -> impl Iterator<Item = Handle> + use<> {
    let is_image = component.is_image();
    Handle::ORDER.into_iter().filter(move |h| is_image || !h.is_corner())
}

/// First handle of `component` within tolerance of `pt`.
#[must_use]
pub fn hit_handle(component: &Component, bounds: Rect, pt: Point, dpi: f64) -> Option<Handle> {
    let tol = handle_tolerance(dpi);
    handles_for(component).find(|h| {
        let c = h.anchor(bounds);
        (pt.x - c.x).abs() < tol && (pt.y - c.y).abs() < tol
    })
}

/// Inclusive rectangle containment against the component's bounds.
#[must_use]
pub fn hit_body(bounds: Rect, pt: Point) -> bool {
    bounds.contains(pt)
}

/// Topmost component whose body contains `pt`.
#[must_use]
pub fn pick_topmost(doc: &DocStore, geometry: &Geometry<'_>, pt: Point) -> Option<ComponentId> {
    doc.iter_topmost_first()
        .find(|c| hit_body(geometry.bounds(c), pt))
        .map(Component::id)
}

/// Full pointer-down hit test: handles of the selected component first, then bodies topmost-first.
#[must_use]
pub fn hit_test(doc: &DocStore, geometry: &Geometry<'_>, pt: Point, selected: Option<ComponentId>) -> Option<Hit> {
    if let Some(sel) = selected.and_then(|id| doc.get(id)) {
        let bounds = geometry.bounds(sel);
        if let Some(handle) = hit_handle(sel, bounds, pt, geometry.units.dpi) {
            return Some(Hit { id: sel.id(), part: HitPart::Handle(handle) });
        }
    }
    pick_topmost(doc, geometry, pt).map(|id| Hit { id, part: HitPart::Body })
}
