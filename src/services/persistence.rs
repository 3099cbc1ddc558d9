//! Persistence service: named card templates and the debounced autosave slot.
//!
//! DESIGN
//! ======
//! Templates are JSON records under `<store>/templates/`, one file per
//! sanitized name, each wrapping the card document with its display name and
//! a `savedAt` timestamp. The autosave slot is a single record at
//! `<store>/autosave.json` and is restored when a session starts.
//!
//! Autosave requests go through a `watch` channel that holds only the newest
//! document. Scheduling never waits on the worker; the worker writes the
//! latest document once no request has arrived for the debounce period, so a
//! drag or a burst of edits costs one write.
//!
//! ERROR HANDLING
//! ==============
//! Autosave failures are logged and never reach the editing session; the next
//! scheduled save writes the then-current document. Records are written to a
//! temporary file and renamed so a crash never leaves a truncated template.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use canvas::doc::{Document, sanitize_file_stem};
use canvas::error::CanvasError;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const TEMPLATES_DIR: &str = "templates";
const AUTOSAVE_FILE: &str = "autosave.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored document rejected: {0}")]
    Document(#[from] CanvasError),
    #[error("template `{0}` not found")]
    NotFound(String),
}

/// One stored card: the document plus its display name and save time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub saved_at: u64,
    pub document: Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub name: String,
    pub saved_at: u64,
}

/// File-backed template store rooted at one directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn template_path(&self, name: &str) -> PathBuf {
        self.root.join(TEMPLATES_DIR).join(format!("{}.json", sanitize_file_stem(name)))
    }

    fn autosave_path(&self) -> PathBuf {
        self.root.join(AUTOSAVE_FILE)
    }

    /// Save `document` under `name`, replacing any template with the same sanitized name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Json`] if the record cannot be written.
    pub async fn save_template(&self, name: &str, document: &Document) -> Result<TemplateRecord, StoreError> {
        let record = TemplateRecord { name: name.to_string(), saved_at: now_ms(), document: document.clone() };
        let path = self.template_path(name);
        write_record(&path, &record).await?;
        info!(name, path = %path.display(), "template saved");
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown name, and
    /// [`StoreError::Json`] or [`StoreError::Document`] for a malformed record.
    pub async fn load_template(&self, name: &str) -> Result<Document, StoreError> {
        match read_record(&self.template_path(name)).await {
            Ok(record) => Ok(record.document),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Stored templates, newest first. Unreadable records are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the template directory exists but cannot be listed.
    pub async fn list_templates(&self) -> Result<Vec<TemplateSummary>, StoreError> {
        let dir = self.root.join(TEMPLATES_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            match read_record(&path).await {
                Ok(record) => summaries.push(TemplateSummary { name: record.name, saved_at: record.saved_at }),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable template"),
            }
        }
        summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.name.cmp(&b.name)));
        Ok(summaries)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown name.
    pub async fn delete_template(&self, name: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.template_path(name)).await {
            Ok(()) => {
                info!(name, "template deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the autosave slot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Json`] if the record cannot be written.
    pub async fn write_autosave(&self, document: &Document) -> Result<(), StoreError> {
        let record = TemplateRecord { name: document.card.name.clone(), saved_at: now_ms(), document: document.clone() };
        write_record(&self.autosave_path(), &record).await
    }

    /// The autosaved document, if present and well formed.
    pub async fn load_autosave(&self) -> Option<Document> {
        match read_record(&self.autosave_path()).await {
            Ok(record) => Some(record.document),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(error = %e, "ignoring malformed autosave");
                None
            }
        }
    }
}

async fn write_record(path: &Path, record: &TemplateRecord) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(record)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_record(path: &Path) -> Result<TemplateRecord, StoreError> {
    let text = tokio::fs::read_to_string(path).await?;
    let record: TemplateRecord = serde_json::from_str(&text)?;
    record.document.validate()?;
    Ok(record)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

// =============================================================================
// Autosave worker
// =============================================================================

/// Handle to the autosave worker.
pub struct Autosave {
    tx: watch::Sender<Option<Document>>,
    task: JoinHandle<()>,
}

impl Autosave {
    /// Replace the pending autosave candidate with `document`. Never waits.
    pub fn schedule(&self, document: Document) {
        if self.tx.send(Some(document)).is_err() {
            warn!("autosave worker stopped; dropping save request");
        }
    }

    /// Write any pending document and stop the worker.
    pub async fn finish(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            warn!(error = %e, "autosave worker did not shut down cleanly");
        }
    }
}

/// Spawn the debounced autosave worker.
#[must_use]
pub fn spawn_autosave_worker(store: TemplateStore, debounce: Duration) -> Autosave {
    let (tx, mut rx) = watch::channel::<Option<Document>>(None);
    info!(
        debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX),
        root = %store.root().display(),
        "autosave worker configured"
    );

    let task = tokio::spawn(async move {
        let mut dirty = false;
        let deadline = tokio::time::sleep(debounce);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_ok() {
                        dirty = true;
                        deadline.as_mut().reset(tokio::time::Instant::now() + debounce);
                    } else {
                        // Sender dropped: write what is still pending, then stop.
                        if dirty {
                            let latest = rx.borrow().clone();
                            flush_autosave(&store, latest).await;
                        }
                        break;
                    }
                }
                () = &mut deadline, if dirty => {
                    dirty = false;
                    let latest = rx.borrow_and_update().clone();
                    flush_autosave(&store, latest).await;
                }
            }
        }
    });

    Autosave { tx, task }
}

async fn flush_autosave(store: &TemplateStore, pending: Option<Document>) {
    let Some(document) = pending else {
        return;
    };
    match store.write_autosave(&document).await {
        Ok(()) => debug!(components = document.components.len(), "autosave written"),
        Err(e) => warn!(error = %e, "autosave failed; will retry on next save"),
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
