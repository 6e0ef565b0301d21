//! Browser window model: location fragment, history, session storage and
//! keyboard events

use crate::dom::Document;
use crate::store::{MemoryStorage, SessionStorage};
use shower_event_system::{ContextId, Emitter, Event, EventData};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

/// Keys the runtime tells apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    PageUp,
    PageDown,
    End,
    Home,
    Left,
    Up,
    Right,
    Down,
    Space,
    Enter,
    Escape,
    Tab,
    /// Letters (lowercase) and digits
    Char(char),
    Other(u32),
}

impl Key {
    /// Maps a legacy DOM key code (`KeyboardEvent.which`).
    pub fn from_code(code: u32) -> Self {
        match code {
            9 => Key::Tab,
            13 => Key::Enter,
            27 => Key::Escape,
            32 => Key::Space,
            33 => Key::PageUp,
            34 => Key::PageDown,
            35 => Key::End,
            36 => Key::Home,
            37 => Key::Left,
            38 => Key::Up,
            39 => Key::Right,
            40 => Key::Down,
            48..=57 | 65..=90 => match char::from_u32(code) {
                Some(c) => Key::Char(c.to_ascii_lowercase()),
                None => Key::Other(code),
            },
            other => Key::Other(other),
        }
    }

    /// Parses a key name such as `pagedown`, `left`, `space` or `j`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let key = match lower.as_str() {
            "pageup" | "pgup" => Key::PageUp,
            "pagedown" | "pgdown" | "pgdn" => Key::PageDown,
            "end" => Key::End,
            "home" => Key::Home,
            "left" | "arrowleft" => Key::Left,
            "up" | "arrowup" => Key::Up,
            "right" | "arrowright" => Key::Right,
            "down" | "arrowdown" => Key::Down,
            "space" | " " => Key::Space,
            "enter" | "return" => Key::Enter,
            "escape" | "esc" => Key::Escape,
            "tab" => Key::Tab,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::default()
        }
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::default()
        }
    }
}

/// A key press. Clones share the default-prevented flag, so a handler
/// preventing a copy is visible to whoever dispatched the original.
#[derive(Clone, Debug)]
pub struct KeyboardEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Lowercase tag name of the focused element
    pub target_tag: String,
    default_prevented: Rc<Cell<bool>>,
}

impl KeyboardEvent {
    pub fn new(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::none())
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            target_tag: "body".to_string(),
            default_prevented: Rc::new(Cell::new(false)),
        }
    }

    pub fn with_target(mut self, tag: &str) -> Self {
        self.target_tag = tag.to_ascii_lowercase();
        self
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Whether the key went to a form control.
    pub fn is_editable_target(&self) -> bool {
        matches!(
            self.target_tag.as_str(),
            "button" | "input" | "select" | "textarea"
        )
    }
}

struct WindowInner {
    document: Document,
    hash: RefCell<String>,
    history: RefCell<Vec<String>>,
    session_storage: Rc<dyn SessionStorage>,
    events: Emitter,
}

/// The window a presentation lives in.
///
/// The fragment is stored without its leading `#`. Emits `popstate` with
/// `hash: String` when the user moves through history.
#[derive(Clone)]
pub struct Window {
    inner: Rc<WindowInner>,
}

impl Window {
    /// Creates a window with in-memory session storage.
    pub fn new(document: Document) -> Self {
        Self::with_storage(document, Rc::new(MemoryStorage::new()))
    }

    pub fn with_storage(document: Document, session_storage: Rc<dyn SessionStorage>) -> Self {
        Self {
            inner: Rc::new(WindowInner {
                document,
                hash: RefCell::new(String::new()),
                history: RefCell::new(Vec::new()),
                session_storage,
                events: Emitter::with_context(ContextId::new()),
            }),
        }
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn session_storage(&self) -> Rc<dyn SessionStorage> {
        self.inner.session_storage.clone()
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    /// `#id`, or an empty string when there is no fragment.
    pub fn location_hash(&self) -> String {
        let hash = self.inner.hash.borrow();
        if hash.is_empty() {
            String::new()
        } else {
            format!("#{}", hash)
        }
    }

    /// Fragment without the leading `#`.
    pub fn hash_id(&self) -> String {
        self.inner.hash.borrow().clone()
    }

    /// Programmatic fragment change. Records history, fires nothing.
    pub fn set_location_hash(&self, hash: &str) {
        let hash = hash.trim_start_matches('#');
        let previous = self.inner.hash.replace(hash.to_string());
        if previous != hash {
            self.inner.history.borrow_mut().push(previous);
        }
    }

    /// Fragment change made by the user (a followed link, an edited URL).
    /// Fires `popstate`.
    pub fn navigate_hash(&self, hash: &str) -> Event {
        self.set_location_hash(hash);
        self.pop_state()
    }

    /// Steps back one history entry and fires `popstate`. Returns `None` at
    /// the start of history.
    pub fn back(&self) -> Option<Event> {
        let previous = self.inner.history.borrow_mut().pop()?;
        *self.inner.hash.borrow_mut() = previous;
        Some(self.pop_state())
    }

    fn pop_state(&self) -> Event {
        let hash = self.hash_id();
        debug!("popstate #{}", hash);
        self.inner
            .events
            .emit("popstate", EventData::new().with("hash", hash))
    }

    /// Sends a key press to the document, targeted at the focused element.
    pub fn key_down(&self, key: Key, modifiers: Modifiers) -> KeyboardEvent {
        let document = &self.inner.document;
        let event = KeyboardEvent::with_modifiers(key, modifiers)
            .with_target(document.active_element().tag());
        document.dispatch_key(&event);
        event
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("hash", &self.location_hash())
            .field("history", &self.inner.history.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shower_event_system::Handler;

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code(34), Key::PageDown);
        assert_eq!(Key::from_code(72), Key::Char('h'));
        assert_eq!(Key::from_code(32), Key::Space);
        assert_eq!(Key::from_code(112), Key::Other(112));
        assert_eq!(Key::from_name("PgDown"), Some(Key::PageDown));
        assert_eq!(Key::from_name("J"), Some(Key::Char('j')));
        assert_eq!(Key::from_name("hyper"), None);
    }

    #[test]
    fn test_hash_and_history() {
        let window = Window::new(Document::new());
        let popped = Rc::new(RefCell::new(Vec::new()));
        let log = popped.clone();
        let handler = Handler::new(move |event| {
            log.borrow_mut().push(event.get::<String>("hash").cloned().unwrap_or_default());
        });
        window.events().on("popstate", &handler, None, 0).unwrap();

        assert_eq!(window.location_hash(), "");
        window.set_location_hash("intro");
        assert_eq!(window.location_hash(), "#intro");
        window.navigate_hash("#outro");
        assert_eq!(window.hash_id(), "outro");

        window.back();
        window.back();
        assert!(window.back().is_none());
        assert_eq!(*popped.borrow(), vec!["outro", "intro", ""]);
    }

    #[test]
    fn test_key_event_targets_focused_element() {
        let document = Document::new();
        let input = document.create_element("input");
        document.body().append_child(&input);
        let window = Window::new(document.clone());

        assert!(!window.key_down(Key::Right, Modifiers::none()).is_editable_target());
        document.focus(&input);
        assert!(window.key_down(Key::Right, Modifiers::none()).is_editable_target());
    }
}
