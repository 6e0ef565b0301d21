#![allow(dead_code)]

use serde_json::Map;
use shower::{Document, MemoryStorage, SessionStorage, Shower, ShowerContext, Window};
use std::rc::Rc;

/// Ids of the deck's slides. `None` gets a generated id.
pub const IDS: [Option<&str>; 5] = [Some("cover"), None, Some("intro"), None, Some("outro")];

pub fn deck_markup() -> String {
    let mut markup = String::from(
        "<!DOCTYPE html><html><head><title>Deck</title></head><body><div class=\"shower\">",
    );
    for (i, id) in IDS.iter().enumerate() {
        let id = id.map(|id| format!(" id=\"{}\"", id)).unwrap_or_default();
        markup.push_str(&format!(
            "<section class=\"slide\"{}><h2>Slide {}</h2><p>Body {}</p></section>",
            id,
            i + 1,
            i + 1
        ));
    }
    markup.push_str("</div></body></html>");
    markup
}

pub struct Fixture {
    pub context: ShowerContext,
    pub window: Window,
    pub shower: Shower,
    pub storage: Rc<MemoryStorage>,
}

pub fn setup() -> Fixture {
    setup_with(Rc::new(MemoryStorage::new()), None)
}

/// Loads the deck into a fresh window sharing `storage`, optionally opened
/// at `#hash`.
pub fn setup_with(storage: Rc<MemoryStorage>, hash: Option<&str>) -> Fixture {
    let document = Document::parse(&deck_markup()).unwrap();
    let session: Rc<dyn SessionStorage> = storage.clone();
    let window = Window::with_storage(document, session);
    if let Some(hash) = hash {
        window.set_location_hash(hash);
    }
    let context = ShowerContext::new();
    let shower = context.init(&window, None, Map::new()).unwrap();
    Fixture {
        context,
        window,
        shower,
        storage,
    }
}
