use std::time::Duration;

use super::*;
use crate::services::persistence::{TemplateStore, spawn_autosave_worker};

fn temp_store(tag: &str) -> TemplateStore {
    TemplateStore::new(std::env::temp_dir().join(format!("cardsmith-session-{tag}-{}", std::process::id())))
}

#[tokio::test]
async fn commit_actions_schedule_autosave() {
    let store = temp_store("autosave");
    let autosave = spawn_autosave_worker(store.clone(), Duration::from_millis(5));
    let mut session = Session::new(load_fonts(None), Some(autosave));

    session.apply(&EngineEvent::AddText);
    session.apply(&EngineEvent::AddText);
    assert_eq!(session.saves_requested(), 2);
    session.close().await;

    let saved = store.load_autosave().await.unwrap();
    assert_eq!(saved.components.len(), 2);
}

#[tokio::test]
async fn selection_changes_do_not_save() {
    let mut session = Session::new(load_fonts(None), None);
    session.apply(&EngineEvent::AddText);
    session.apply(&EngineEvent::Select { id: None });
    assert_eq!(session.saves_requested(), 1);
    assert_eq!(session.core().selection(), None);
}

#[tokio::test]
async fn open_rejects_invalid_document_and_keeps_current() {
    let mut session = Session::new(load_fonts(None), None);
    session.apply(&EngineEvent::AddText);
    let mut document = session.document();
    document.components.push(document.components[0].clone());
    assert!(session.open(document).await.is_err());
    assert_eq!(session.core().doc.len(), 1);
}

#[tokio::test]
async fn card_edits_reach_the_document() {
    let mut session = Session::new(load_fonts(None), None);
    session.rename_card("Dragon");
    session.resize_card(3.0, 4.0, 150.0);
    let document = session.document();
    assert_eq!(document.card.name, "Dragon");
    assert_eq!((document.card.width_inches, document.card.height_inches, document.card.dpi), (3.0, 4.0, 150.0));
    assert_eq!(session.saves_requested(), 2);
}

#[test]
fn missing_font_dir_falls_back_to_bundled_face() {
    let fonts = load_fonts(Some(Path::new("/definitely/not/a/font/dir")));
    let spec = canvas::font::FontSpec::new("Arial", 10.0);
    assert!(fonts.measure("abcd", &spec) > 0.0);
    assert!(fonts.outline("abcd", &spec, 0.0, 10.0).is_some());
}

#[tokio::test]
async fn exported_card_contains_text() {
    let mut session = Session::new(load_fonts(None), None);
    session.apply(&EngineEvent::AddText);
    let surface = session.core().render(false).unwrap();
    assert!(surface.pixels().iter().any(|p| p.alpha() == 255 && p.red() < 64));
}
