//! Unit conversion between physical card units and device pixels.
//!
//! Component geometry is stored in inches and typographic sizes in points;
//! the drawing surface works in device pixels at the card's resolution.

#[cfg(test)]
#[path = "units_test.rs"]
mod units_test;

use crate::consts::POINTS_PER_INCH;

/// A point in device-pixel or inch space, depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn delta_from(self, other: Point) -> Point {
        Point { x: self.x - other.x, y: self.y - other.y }
    }
}

/// Axis-aligned rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.x + self.w && pt.y >= self.y && pt.y <= self.y + self.h
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// Inches to device pixels.
#[must_use]
pub fn in_to_px(inches: f64, dpi: f64) -> f64 {
    inches * dpi
}

/// Device pixels to inches.
#[must_use]
pub fn px_to_in(px: f64, dpi: f64) -> f64 {
    px / dpi
}

/// Points to device pixels.
#[must_use]
pub fn pt_to_px(pt: f64, dpi: f64) -> f64 {
    pt * dpi / POINTS_PER_INCH
}

/// Converter bound to one resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    pub dpi: f64,
}

impl Units {
    #[must_use]
    pub fn new(dpi: f64) -> Self {
        Self { dpi }
    }

    #[must_use]
    pub fn in_to_px(&self, inches: f64) -> f64 {
        in_to_px(inches, self.dpi)
    }

    #[must_use]
    pub fn px_to_in(&self, px: f64) -> f64 {
        px_to_in(px, self.dpi)
    }

    #[must_use]
    pub fn pt_to_px(&self, pt: f64) -> f64 {
        pt_to_px(pt, self.dpi)
    }

    /// Convert a device-pixel delta to an inch delta.
    #[must_use]
    pub fn delta_to_in(&self, delta_px: Point) -> Point {
        Point { x: self.px_to_in(delta_px.x), y: self.px_to_in(delta_px.y) }
    }

    /// Device-pixel rectangle for a box given in inches.
    #[must_use]
    pub fn rect_to_px(&self, x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect { x: self.in_to_px(x), y: self.in_to_px(y), w: self.in_to_px(w), h: self.in_to_px(h) }
    }
}
