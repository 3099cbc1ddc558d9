//! Image decode service: turns opaque image references into drawable pixmaps.
//!
//! Documents carry image payloads as references (`data:` URIs or file
//! paths). The engine never decodes on its own; the host resolves every
//! reference through [`load_image_ref`] and hands the results to
//! [`crate::engine::EngineCore::hydrate`] via [`ResolvedImages`].

#[cfg(test)]
#[path = "assets_test.rs"]
mod assets_test;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use tiny_skia::Pixmap;
use tracing::warn;

use crate::doc::ComponentId;

/// Error returned by the decode service.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The payload is not a supported raster format.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    /// A `data:` URI without a payload separator.
    #[error("malformed data URI")]
    DataUri,
    /// The base64 payload of a data URI is invalid.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// A file reference could not be read.
    #[error("cannot read image file: {0}")]
    Io(#[from] std::io::Error),
    /// The decoded image has a zero dimension.
    #[error("image has no pixels")]
    Empty,
}

/// A decoded, premultiplied RGBA image ready for drawing.
///
/// Cloning is cheap; the pixel buffer is shared.
#[derive(Debug, Clone)]
pub struct CardImage {
    pixmap: Arc<Pixmap>,
}

impl CardImage {
    /// Wrap an already premultiplied pixmap.
    #[must_use]
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self { pixmap: Arc::new(pixmap) }
    }

    /// A single-color image, mostly useful for tests and placeholders.
    #[must_use]
    pub fn solid(width: u32, height: u32, color: tiny_skia::Color) -> Option<Self> {
        let mut pixmap = Pixmap::new(width, height)?;
        pixmap.fill(color);
        Some(Self::from_pixmap(pixmap))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Width over height.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        f64::from(self.width()) / f64::from(self.height())
    }
}

/// Decode encoded image bytes (PNG or JPEG).
///
/// # Errors
///
/// Returns [`ImageError::Decode`] for unsupported or corrupt payloads and
/// [`ImageError::Empty`] for zero-sized images.
pub fn decode_image(bytes: &[u8]) -> Result<CardImage, ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or(ImageError::Empty)?;
    for (src, dst) in rgba.as_raw().chunks_exact(4).zip(pixmap.data_mut().chunks_exact_mut(4)) {
        let a = src[3];
        dst[0] = premultiply(src[0], a);
        dst[1] = premultiply(src[1], a);
        dst[2] = premultiply(src[2], a);
        dst[3] = a;
    }
    Ok(CardImage::from_pixmap(pixmap))
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    let prod = u16::from(channel) * u16::from(alpha) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

/// Split a `data:` URI into its mime type and decoded payload.
///
/// # Errors
///
/// Returns [`ImageError::DataUri`] when the URI has no `,` separator and
/// [`ImageError::Base64`] when a base64 payload is malformed.
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>), ImageError> {
    let rest = uri.strip_prefix("data:").ok_or(ImageError::DataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::DataUri)?;
    let mut parts = header.split(';');
    let mime = parts
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();
    let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));
    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD.decode(payload.trim())?
    } else {
        payload.as_bytes().to_vec()
    };
    Ok((mime, bytes))
}

/// Encode raw image bytes as a base64 `data:` URI, sniffing the mime type.
#[must_use]
pub fn encode_data_uri(bytes: &[u8]) -> String {
    let mime = match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        _ => "application/octet-stream",
    };
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{payload}")
}

/// Resolve an image reference: a `data:` URI or a filesystem path.
///
/// # Errors
///
/// Propagates URI, I/O and decode failures.
pub fn load_image_ref(reference: &str) -> Result<CardImage, ImageError> {
    if reference.starts_with("data:") {
        let (_mime, bytes) = parse_data_uri(reference)?;
        return decode_image(&bytes);
    }
    let bytes = std::fs::read(Path::new(reference))?;
    decode_image(&bytes)
}

/// Decoded images for a document about to be hydrated.
///
/// Failures are recorded separately from "never attempted" so hydration can
/// clear exactly the references that failed to decode.
#[derive(Debug, Clone, Default)]
pub struct ResolvedImages {
    background: Option<CardImage>,
    background_failed: bool,
    components: HashMap<ComponentId, CardImage>,
    failed: HashSet<ComponentId>,
}

impl ResolvedImages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of decoding the card background.
    pub fn record_background(&mut self, result: Result<CardImage, ImageError>) {
        match result {
            Ok(image) => {
                self.background = Some(image);
                self.background_failed = false;
            }
            Err(e) => {
                warn!(error = %e, "background image failed to decode");
                self.background = None;
                self.background_failed = true;
            }
        }
    }

    /// Record the outcome of decoding one image component's source.
    pub fn record_component(&mut self, id: ComponentId, result: Result<CardImage, ImageError>) {
        match result {
            Ok(image) => {
                self.failed.remove(&id);
                self.components.insert(id, image);
            }
            Err(e) => {
                warn!(id, error = %e, "component image failed to decode");
                self.components.remove(&id);
                self.failed.insert(id);
            }
        }
    }

    #[must_use]
    pub fn background(&self) -> Option<&CardImage> {
        self.background.as_ref()
    }

    #[must_use]
    pub fn background_failed(&self) -> bool {
        self.background_failed
    }

    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&CardImage> {
        self.components.get(&id)
    }

    #[must_use]
    pub fn component_failed(&self, id: ComponentId) -> bool {
        self.failed.contains(&id)
    }
}

/// Decode every image reference of a document synchronously.
#[must_use]
pub fn resolve_document_images(document: &crate::doc::Document) -> ResolvedImages {
    let mut resolved = ResolvedImages::new();
    if let Some(reference) = document.card.background_image_data.as_deref() {
        resolved.record_background(load_image_ref(reference));
    }
    for (id, reference) in document.image_refs() {
        resolved.record_component(id, load_image_ref(reference));
    }
    resolved
}
