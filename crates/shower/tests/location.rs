mod common;

use common::{deck_markup, setup, setup_with};
use serde_json::{Map, Value};
use shower::{Document, MemoryStorage, SessionStorage, ShowerContext, Window};
use std::rc::Rc;

const STATE_KEY: &str = "shower-shower.Location";

fn persisted_slide_mode(storage: &MemoryStorage) -> Option<bool> {
    let raw = storage.get_item(STATE_KEY)?;
    let state: Map<String, Value> = serde_json::from_str(&raw).ok()?;
    state.get("isSlideMode").and_then(Value::as_bool)
}

#[test]
fn test_fragment_selects_the_slide() {
    let f = setup_with(Rc::new(MemoryStorage::new()), Some("intro"));
    assert_eq!(f.shower.player().current_slide_index(), Some(2));
    assert_eq!(f.window.location_hash(), "#intro");
    assert!(f.shower.get(2).unwrap().is_active());
}

#[test]
fn test_unknown_fragment_falls_back_to_first_slide() {
    let f = setup_with(Rc::new(MemoryStorage::new()), Some("nowhere"));
    assert_eq!(f.shower.player().current_slide_index(), Some(0));
    assert_eq!(f.window.location_hash(), "#cover");
}

#[test]
fn test_no_fragment_leaves_nothing_selected() {
    let f = setup();
    assert_eq!(f.shower.player().current_slide_index(), None);
    assert_eq!(f.window.location_hash(), "");
}

#[test]
fn test_fragment_round_trip_across_reload() {
    let storage = Rc::new(MemoryStorage::new());
    let first = setup_with(storage.clone(), None);
    first.shower.player().go(2);
    assert_eq!(first.window.location_hash(), "#intro");

    let hash = first.window.hash_id();
    let reloaded = setup_with(storage, Some(&hash));
    assert_eq!(reloaded.shower.player().current_slide_index(), Some(2));
    assert_eq!(reloaded.window.location_hash(), "#intro");
}

#[test]
fn test_title_follows_slide_mode() {
    let f = setup();
    let document = f.window.document();
    let location = f.shower.location().unwrap();
    assert_eq!(location.document_title(), "Deck");

    f.shower.player().go(1);
    assert_eq!(document.title(), "Deck");

    f.shower.container().enter_slide_mode();
    assert_eq!(document.title(), "Slide 2 — Deck");
    f.shower.player().go(2);
    assert_eq!(document.title(), "Slide 3 — Deck");

    f.shower.container().exit_slide_mode();
    assert_eq!(document.title(), "Deck");
}

#[test]
fn test_slide_mode_survives_reload() {
    let storage = Rc::new(MemoryStorage::new());
    let first = setup_with(storage.clone(), None);
    assert_eq!(persisted_slide_mode(&storage), None);

    first.shower.container().enter_slide_mode();
    assert_eq!(first.shower.player().current_slide_index(), Some(0));
    assert_eq!(persisted_slide_mode(&storage), Some(true));
    assert_eq!(first.window.document().title(), "Slide 1 — Deck");

    let reloaded = setup_with(storage.clone(), None);
    let body = reloaded.window.document().body();
    assert!(reloaded.shower.container().is_slide_mode());
    assert!(body.has_class("full"));
    assert!(!body.has_class("list"));
    assert_eq!(reloaded.shower.player().current_slide_index(), Some(0));

    reloaded.shower.container().exit_slide_mode();
    assert_eq!(persisted_slide_mode(&storage), Some(false));
    assert_eq!(
        reloaded.shower.location().unwrap().state().get("isSlideMode"),
        Some(&Value::Bool(false))
    );
}

#[test]
fn test_malformed_session_state_is_ignored() {
    let storage = Rc::new(MemoryStorage::new());
    storage.set_item(STATE_KEY, "{not json");
    let f = setup_with(storage, None);
    assert!(!f.shower.container().is_slide_mode());
}

#[test]
fn test_popstate_follows_the_fragment() {
    let f = setup();
    let player = f.shower.player();
    player.go(0);

    f.window.navigate_hash("outro");
    assert_eq!(player.current_slide_index(), Some(4));

    f.window.navigate_hash("nope");
    assert_eq!(player.current_slide_index(), Some(4));

    f.window.back();
    assert_eq!(f.window.hash_id(), "outro");
    assert_eq!(player.current_slide_index(), Some(4));

    f.window.back();
    assert_eq!(f.window.hash_id(), "cover");
    assert_eq!(player.current_slide_index(), Some(0));
}

#[test]
fn test_popstate_without_current_slide() {
    let f = setup();
    let player = f.shower.player();

    f.window.navigate_hash("");
    assert_eq!(player.current_slide_index(), None);

    f.window.navigate_hash("intro");
    assert_eq!(player.current_slide_index(), Some(2));
}

#[test]
fn test_popstate_in_slide_mode_without_current_slide_restarts() {
    let f = setup();
    let player = f.shower.player();
    f.shower.container().enter_slide_mode();
    player.go(2);

    f.shower.remove(2usize).unwrap();
    assert_eq!(player.current_slide_index(), None);

    f.window.navigate_hash("outro");
    assert_eq!(player.current_slide_index(), Some(0));
    assert_eq!(f.window.hash_id(), "cover");
}

#[test]
fn test_full_class_in_markup_starts_slide_mode() {
    let markup = deck_markup().replace("<body>", "<body class=\"full\">");
    let window = Window::new(Document::parse(&markup).unwrap());
    let shower = ShowerContext::new()
        .init(&window, None, Map::new())
        .unwrap();

    assert!(shower.container().is_slide_mode());
    assert!(!window.document().body().has_class("list"));
    assert_eq!(shower.player().current_slide_index(), None);

    window.navigate_hash("");
    assert_eq!(shower.player().current_slide_index(), Some(0));
}

#[test]
fn test_custom_session_key() {
    let storage = Rc::new(MemoryStorage::new());
    let session: Rc<dyn SessionStorage> = storage.clone();
    let window = Window::with_storage(Document::parse(&deck_markup()).unwrap(), session);
    let mut options = Map::new();
    options.insert("sessionstore_key".into(), Value::from("talk"));
    let shower = ShowerContext::new().init(&window, None, options).unwrap();

    shower.container().enter_slide_mode();
    assert!(storage.get_item("talk-shower.Location").is_some());
    assert!(storage.get_item(STATE_KEY).is_none());
}

#[test]
fn test_destroyed_presentation_ignores_history() {
    let f = setup();
    f.shower.destroy();
    f.window.navigate_hash("intro");
    assert_eq!(f.shower.player().current_slide_index(), None);
    assert_eq!(f.window.document().title(), "Deck");
}
