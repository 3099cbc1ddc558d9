//! Error types crossing the engine boundary.
//!
//! Interaction and per-component drawing never fail outward: bad numeric
//! input is sanitized in place and draw failures become placeholders. What is
//! left here are the failures a host must see: rejected documents and a
//! surface that could not be allocated or encoded.

/// Error returned by document import and surface rendering.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// The document is missing required fields or violates an invariant.
    /// The in-memory document is left unchanged.
    #[error("invalid card document: {0}")]
    InvalidDocument(String),
    /// The document text is not valid JSON.
    #[error("card document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The drawing surface could not be allocated at this size.
    #[error("cannot allocate a {width}x{height} drawing surface")]
    Surface { width: u32, height: u32 },
    /// The rendered surface could not be encoded.
    #[error("png encode failed: {0}")]
    Encode(String),
}
