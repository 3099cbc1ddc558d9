//! Shared numeric constants for the canvas crate.

// ── Units ───────────────────────────────────────────────────────

/// A typographic point is 1/72 inch at any resolution.
pub const POINTS_PER_INCH: f64 = 72.0;

// ── Card defaults ───────────────────────────────────────────────

/// Name given to a card that has never been saved.
pub const DEFAULT_CARD_NAME: &str = "Untitled";

/// Default card width in inches (poker/trading card).
pub const DEFAULT_CARD_WIDTH_IN: f64 = 2.5;

/// Default card height in inches.
pub const DEFAULT_CARD_HEIGHT_IN: f64 = 3.5;

/// Default card resolution in dots per inch.
pub const DEFAULT_CARD_DPI: f64 = 300.0;

/// Version tag written into serialized documents.
pub const DOCUMENT_VERSION: u32 = 2;

// ── Geometry floors ─────────────────────────────────────────────

/// Minimum width and height of an image component, in inches.
pub const MIN_IMAGE_SIZE_IN: f64 = 0.1;

/// Minimum width of a text component, in inches.
pub const MIN_TEXT_WIDTH_IN: f64 = 0.25;

/// Minimum explicit height of a text component, in inches.
pub const MIN_TEXT_HEIGHT_IN: f64 = 0.1;

/// Drags may push a component at most this far above the card, in inches.
pub const DRAG_MIN_Y_IN: f64 = -0.5;

/// Drags may push at most this fraction of a component's width off the left edge.
pub const DRAG_MAX_LEFT_OVERHANG: f64 = 0.5;

// ── Handles ─────────────────────────────────────────────────────

/// Smallest handle square edge in device pixels.
pub const HANDLE_MIN_PX: f64 = 10.0;

/// Handle edge grows as `dpi / HANDLE_DPI_DIVISOR`.
pub const HANDLE_DPI_DIVISOR: f64 = 22.0;

/// Hit tolerance around a handle center, as a multiple of the handle size.
pub const HANDLE_TOLERANCE_RATIO: f64 = 1.6;

// ── Text ────────────────────────────────────────────────────────

/// Plain text line height as a multiple of the font size.
pub const TEXT_LINE_HEIGHT_RATIO: f64 = 1.35;

/// Rich text line height as a multiple of the tallest font on the line.
pub const RICH_LINE_HEIGHT_RATIO: f64 = 1.4;

/// Ascent used when no font face is available, as a fraction of the font size.
pub const FALLBACK_ASCENT_RATIO: f64 = 0.8;

/// Advance per glyph used when no font face is available, as a fraction of the font size.
pub const FALLBACK_ADVANCE_RATIO: f64 = 0.5;

/// Underline offset below the baseline, as a fraction of the font size.
pub const UNDERLINE_OFFSET_RATIO: f64 = 0.1;

/// Underline stroke is `font_px / UNDERLINE_WIDTH_DIVISOR`, at least one pixel.
pub const UNDERLINE_WIDTH_DIVISOR: f64 = 18.0;

/// Font sizes accepted from property edits, in points.
pub const MIN_FONT_SIZE_PT: f64 = 4.0;
/// See [`MIN_FONT_SIZE_PT`].
pub const MAX_FONT_SIZE_PT: f64 = 400.0;

/// Layout cache entries kept before the cache is flushed.
pub const LAYOUT_CACHE_CAPACITY: usize = 512;

// ── Image pan / zoom ────────────────────────────────────────────

/// Lowest stored image zoom factor.
pub const MIN_IMAGE_SCALE: f64 = 0.1;

/// Highest stored image zoom factor.
pub const MAX_IMAGE_SCALE: f64 = 10.0;

/// Zoom change per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 0.05;

/// Zoom change per wheel notch with the precision modifier held.
pub const WHEEL_ZOOM_FINE_STEP: f64 = 0.01;

// ── Overlay and placeholders ────────────────────────────────────

/// Selection outline and handle stroke color.
pub const SELECTION_COLOR: &str = "#4a90d9";

/// Fill of an image component whose source is not available.
pub const PLACEHOLDER_FILL: &str = "#e0e0e0";

/// Label color drawn on image placeholders.
pub const PLACEHOLDER_LABEL_COLOR: &str = "#999999";

/// Label drawn on image placeholders.
pub const PLACEHOLDER_LABEL: &str = "Image";

/// Font family used for overlay labels.
pub const PLACEHOLDER_FONT: &str = "Arial";

/// Minimum inline editor box in display pixels.
pub const INLINE_EDITOR_MIN_W_PX: f64 = 60.0;
/// See [`INLINE_EDITOR_MIN_W_PX`].
pub const INLINE_EDITOR_MIN_H_PX: f64 = 30.0;
