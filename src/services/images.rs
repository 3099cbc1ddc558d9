//! Image resolution off the event loop.
//!
//! Decoding is CPU bound, so every decode runs on the blocking pool and the
//! session only sees finished [`CardImage`]s.

use std::path::Path;

use canvas::assets::{CardImage, ImageError, ResolvedImages, decode_image, encode_data_uri, resolve_document_images};
use canvas::doc::Document;
use tracing::{debug, warn};

/// Decode every image reference of `document` before it is hydrated.
///
/// A failed decode task resolves nothing; the affected components keep their
/// references and draw as placeholders.
pub async fn resolve_images(document: &Document) -> ResolvedImages {
    let document = document.clone();
    match tokio::task::spawn_blocking(move || resolve_document_images(&document)).await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(error = %e, "image resolution task failed");
            ResolvedImages::new()
        }
    }
}

/// Read and decode an image file, returning it with a self-contained `data:` reference.
///
/// # Errors
///
/// Returns [`ImageError::Io`] if the file cannot be read and
/// [`ImageError::Decode`] / [`ImageError::Empty`] if it is not a usable image.
pub async fn load_image_file(path: &Path) -> Result<(CardImage, String), ImageError> {
    let bytes = tokio::fs::read(path).await?;
    let decoded = tokio::task::spawn_blocking(move || {
        let image = decode_image(&bytes)?;
        Ok::<_, ImageError>((image, encode_data_uri(&bytes)))
    })
    .await
    .map_err(|e| ImageError::Io(std::io::Error::other(e)))??;
    debug!(path = %path.display(), width = decoded.0.width(), height = decoded.0.height(), "image file decoded");
    Ok(decoded)
}

#[cfg(test)]
#[path = "images_test.rs"]
mod tests;
