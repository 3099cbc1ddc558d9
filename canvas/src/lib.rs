//! Card composition engine.
//!
//! Owns an editing session for one printable card: the physical card
//! settings, an ordered set of text and image components, selection, and the
//! pointer interaction in progress. Input arrives as [`input::EngineEvent`]s
//! (or direct method calls) in device pixels; every handler returns the
//! [`engine::Action`]s the host must react to, such as redrawing or saving.
//! Rendering targets an offscreen `tiny_skia::Pixmap` at the card's DPI, and
//! the same routine produces the exported PNG.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Session state ([`engine::EngineCore`]) and the surface-owning [`engine::Engine`] |
//! | [`doc`] | Card, components, property patches, the z-ordered store and the serialized document |
//! | [`units`] | Inch / point / pixel conversions and basic geometry |
//! | [`input`] | Input event types and the interaction state machine |
//! | [`hit`] | Resize handles and topmost-first body picking |
//! | [`layout`] | Plain-text wrapping, layout cache and the shared bounds query |
//! | [`rich_text`] | Styled runs and their line layout |
//! | [`font`] | Text measurement and glyph outlines |
//! | [`fit`] | Cover-fit placement with pan and zoom |
//! | [`render`] | Scene drawing onto a pixmap |
//! | [`assets`] | Image reference decoding |
//! | [`consts`] | Shared constants (defaults, floors, overlay styling) |

pub mod assets;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod fit;
pub mod font;
pub mod hit;
pub mod input;
pub mod layout;
pub mod render;
pub mod rich_text;
pub mod units;

pub use engine::{Action, Engine, EngineCore};
pub use error::CanvasError;
