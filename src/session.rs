//! Editing session: an engine plus the host collaborators it drives.
//!
//! The engine only reports what should happen through [`Action`]s. The
//! session carries them out: saves go to the debounced autosave worker and
//! document loads resolve images before hydrating.

use std::path::Path;

use canvas::assets::ImageError;
use canvas::doc::{BackgroundFit, Document};
use canvas::engine::{Action, Engine, EngineCore};
use canvas::error::CanvasError;
use canvas::font::{FontBook, FontProvider};
use canvas::input::EngineEvent;
use tracing::{debug, info, warn};

use crate::services::images::{load_image_file, resolve_images};
use crate::services::persistence::Autosave;

/// Font provider for the session: the bundled face plus any faces in `dir`.
#[must_use]
pub fn load_fonts(dir: Option<&Path>) -> Box<dyn FontProvider> {
    let mut book = FontBook::bundled();
    if let Some(dir) = dir {
        match book.load_dir(dir) {
            Ok(0) => warn!(dir = %dir.display(), "no usable fonts found; using the bundled face"),
            Ok(count) => info!(dir = %dir.display(), count, "fonts loaded"),
            Err(e) => warn!(dir = %dir.display(), error = %e, "font directory unreadable; using the bundled face"),
        }
    }
    Box::new(book)
}

pub struct Session {
    engine: Engine,
    autosave: Option<Autosave>,
    saves_requested: usize,
}

impl Session {
    #[must_use]
    pub fn new(fonts: Box<dyn FontProvider>, autosave: Option<Autosave>) -> Self {
        Self { engine: Engine::new(EngineCore::with_fonts(fonts)), autosave, saves_requested: 0 }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.engine.core
    }

    /// Save requests seen since the session started.
    #[must_use]
    pub fn saves_requested(&self) -> usize {
        self.saves_requested
    }

    /// Replace the session's document, decoding its images first.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDocument`] if the document is rejected;
    /// the current document stays in place.
    pub async fn open(&mut self, document: Document) -> Result<(), CanvasError> {
        let images = resolve_images(&document).await;
        let actions = self.engine.hydrate(document, &images)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn apply(&mut self, event: &EngineEvent) -> Vec<Action> {
        let actions = self.engine.apply(event);
        self.dispatch(actions.clone());
        actions
    }

    /// Add an image component from a file; the file is embedded as a `data:` reference.
    ///
    /// # Errors
    ///
    /// Propagates read and decode failures; the document is unchanged.
    pub async fn add_image_file(&mut self, path: &Path) -> Result<Vec<Action>, ImageError> {
        let (image, reference) = load_image_file(path).await?;
        let actions = self.engine.core.add_image(image, Some(reference));
        self.dispatch(actions.clone());
        Ok(actions)
    }

    /// Set the card background from a file.
    ///
    /// # Errors
    ///
    /// Propagates read and decode failures; the background is unchanged.
    pub async fn set_background_file(&mut self, path: &Path, fit: BackgroundFit) -> Result<(), ImageError> {
        let (image, reference) = load_image_file(path).await?;
        let mut actions = self.engine.core.set_background(image, Some(reference));
        actions.extend(self.engine.core.set_background_fit(fit));
        self.dispatch(actions);
        Ok(())
    }

    pub fn resize_card(&mut self, width_inches: f64, height_inches: f64, dpi: f64) {
        let actions = self.engine.core.set_card_size(width_inches, height_inches, dpi);
        self.dispatch(actions);
    }

    pub fn rename_card(&mut self, name: &str) {
        let actions = self.engine.core.set_card_name(name);
        self.dispatch(actions);
    }

    #[must_use]
    pub fn document(&self) -> Document {
        self.engine.serialize()
    }

    /// Stop the autosave worker after writing anything still pending.
    pub async fn close(self) {
        if let Some(autosave) = self.autosave {
            autosave.finish().await;
        }
    }

    fn dispatch(&mut self, actions: Vec<Action>) {
        let mut save = false;
        for action in actions {
            match action {
                Action::SaveRequested => save = true,
                Action::EditTextRequested(request) => {
                    debug!(id = request.id, text = %request.text, "inline edit requested");
                }
                Action::SetCursor(cursor) => debug!(cursor = cursor.as_css(), "cursor"),
                other => debug!(action = ?other, "engine action"),
            }
        }
        if save {
            self.saves_requested += 1;
            if let Some(autosave) = &self.autosave {
                autosave.schedule(self.engine.serialize());
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
