//! Cover-fit placement of a source image inside a target rectangle.
//!
//! The image is scaled so it fills the target completely (cropping overflow),
//! then a user pan offset is applied. The pan is clamped so the image never
//! reveals empty space inside the target.

#[cfg(test)]
#[path = "fit_test.rs"]
mod fit_test;

use crate::units::{Point, Rect};

/// Where and how large to draw the source image, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Uniform scale from source pixels to device pixels.
    pub scale: f64,
}

impl Placement {
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// True when the placed image covers `target` entirely.
    #[must_use]
    pub fn covers(&self, target: Rect, epsilon: f64) -> bool {
        self.x <= target.x + epsilon
            && self.y <= target.y + epsilon
            && self.x + self.width >= target.right() - epsilon
            && self.y + self.height >= target.bottom() - epsilon
    }
}

/// Zoom actually used for placement. Values below 1 would shrink the image
/// inside the target, so they are floored to 1.
#[must_use]
pub fn effective_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() { zoom.max(1.0) } else { 1.0 }
}

/// Scale that makes `src` cover `target`, before zoom.
#[must_use]
pub fn cover_scale(src_w: f64, src_h: f64, target_w: f64, target_h: f64) -> f64 {
    if src_w <= 0.0 || src_h <= 0.0 {
        return 1.0;
    }
    (target_w / src_w).max(target_h / src_h)
}

/// Largest pan offset magnitude on each axis that keeps the target covered.
#[must_use]
pub fn pan_limits(src_w: f64, src_h: f64, target_w: f64, target_h: f64, zoom: f64) -> Point {
    let scale = cover_scale(src_w, src_h, target_w, target_h) * effective_zoom(zoom);
    Point::new(
        ((src_w * scale - target_w) / 2.0).max(0.0),
        ((src_h * scale - target_h) / 2.0).max(0.0),
    )
}

/// Clamp a pan offset to the covering range. Non-finite components become 0.
#[must_use]
pub fn clamp_pan(pan: Point, limits: Point) -> Point {
    let clamp = |v: f64, limit: f64| if v.is_finite() { v.clamp(-limit, limit) } else { 0.0 };
    Point::new(clamp(pan.x, limits.x), clamp(pan.y, limits.y))
}

/// Place a `src_w` x `src_h` image over `target` with the given pan and zoom.
#[must_use]
pub fn cover_placement(src_w: f64, src_h: f64, target: Rect, pan: Point, zoom: f64) -> Placement {
    let scale = cover_scale(src_w, src_h, target.w, target.h) * effective_zoom(zoom);
    let width = src_w * scale;
    let height = src_h * scale;
    let limits = Point::new(((width - target.w) / 2.0).max(0.0), ((height - target.h) / 2.0).max(0.0));
    let pan = clamp_pan(pan, limits);
    Placement {
        x: target.x + (target.w - width) / 2.0 + pan.x,
        y: target.y + (target.h - height) / 2.0 + pan.y,
        width,
        height,
        scale,
    }
}
