//! Keeps the URL fragment, the document title and the persisted view mode in
//! step with the presentation

use crate::options::{option_str, ShowerOptions};
use crate::shower::{Shower, WeakShower};
use crate::slide::Slide;
use crate::store::SessionStore;
use crate::window::Window;
use crate::Result;
use serde_json::{json, Map, Value};
use shower_event_system::{Event, EventGroup, Handler};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Appended to the `sessionstore_key` option to form the session item name.
pub const SESSION_STORE_SUFFIX: &str = "-shower.Location";

/// Separates the slide title from the document title in slide mode.
pub const TITLE_SEPARATOR: &str = " — ";

struct LocationInner {
    shower: WeakShower,
    window: Window,
    state: RefCell<SessionStore>,
    document_title: String,
    player_listeners: EventGroup,
    container_listeners: EventGroup,
    window_listeners: EventGroup,
}

/// History controller for one presentation.
#[derive(Clone)]
pub struct Location {
    inner: Rc<LocationInner>,
}

impl Location {
    /// Restores the persisted mode and the slide named by the fragment, then
    /// starts tracking.
    ///
    /// The fragment is cleared first. Slide mode is entered when it was
    /// persisted or the body already carries the full-mode class. A fragment
    /// naming no slide lands on the first one.
    pub fn new(shower: &Shower) -> Result<Self> {
        let key = format!(
            "{}{}",
            option_str(
                shower.options(),
                "sessionstore_key",
                &ShowerOptions::default().sessionstore_key
            ),
            SESSION_STORE_SUFFIX
        );
        let window = shower.window().clone();

        let mut init = Map::new();
        init.insert("isSlideMode".into(), json!(false));
        let state = SessionStore::new(&key, init, window.session_storage());

        let inner = Rc::new(LocationInner {
            shower: shower.downgrade(),
            document_title: window.document().title(),
            state: RefCell::new(state),
            player_listeners: shower.player().events().group(),
            container_listeners: shower.container().events().group(),
            window_listeners: window.events().group(),
            window,
        });
        let location = Self { inner };

        location.setup_listeners()?;
        location.restore(shower);
        Ok(location)
    }

    fn setup_listeners(&self) -> Result<()> {
        let weak = Rc::downgrade(&self.inner);
        self.inner.player_listeners.on(
            "activate",
            &handler(&weak, |location, event| location.on_slide_activate(event)),
            None,
            0,
        )?;
        self.inner.container_listeners.on(
            ["slidemodeenter", "slidemodeexit"],
            &handler(&weak, |location, _| {
                location.set_title();
                if let Err(e) = location.save() {
                    warn!("Failed to persist view mode: {}", e);
                }
            }),
            None,
            0,
        )?;
        self.inner.window_listeners.on(
            "popstate",
            &handler(&weak, |location, _| location.on_popstate()),
            None,
            0,
        )?;
        Ok(())
    }

    fn restore(&self, shower: &Shower) {
        let window = &self.inner.window;
        let slide_id = window.hash_id();
        window.set_location_hash("");

        let persisted = self
            .inner
            .state
            .borrow()
            .get("isSlideMode")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let full = option_str(
            shower.options(),
            "mode_full_classname",
            &ShowerOptions::default().mode_full_classname,
        );
        if persisted || window.document().body().has_class(&full) {
            shower.container().enter_slide_mode();
        }

        if !slide_id.is_empty() {
            let index = self.slide_by_id(&slide_id).map_or(0, |(index, _)| index);
            debug!("Restoring #{} as slide {}", slide_id, index);
            shower.player().go(index);
        }
    }

    /// Persists the current view mode.
    pub fn save(&self) -> Result<()> {
        let slide_mode = self.is_slide_mode();
        self.inner.state.borrow_mut().set("isSlideMode", slide_mode)
    }

    /// Stops tracking. The fragment and title are left as they are.
    pub fn destroy(&self) {
        self.inner.window_listeners.off_all();
        self.inner.player_listeners.off_all();
        self.inner.container_listeners.off_all();
    }

    /// The document title before any slide title was added.
    pub fn document_title(&self) -> &str {
        &self.inner.document_title
    }

    /// Copy of the persisted state.
    pub fn state(&self) -> Map<String, Value> {
        self.inner.state.borrow().all()
    }

    fn shower(&self) -> Option<Shower> {
        self.inner.shower.upgrade()
    }

    fn is_slide_mode(&self) -> bool {
        self.shower()
            .is_some_and(|shower| shower.container().is_slide_mode())
    }

    /// Last slide carrying `id`, with its position.
    fn slide_by_id(&self, id: &str) -> Option<(usize, Slide)> {
        let shower = self.shower()?;
        shower
            .slides()
            .into_iter()
            .enumerate()
            .rev()
            .find(|(_, slide)| slide.id().as_deref() == Some(id))
    }

    fn on_slide_activate(&self, event: &Event) {
        if let Some(slide) = event.get::<Slide>("slide") {
            self.inner
                .window
                .set_location_hash(&slide.id().unwrap_or_default());
        }
        self.set_title();
    }

    fn on_popstate(&self) {
        let Some(shower) = self.shower() else {
            return;
        };
        let player = shower.player();
        let slide_id = self.inner.window.hash_id();
        let resolved = self.slide_by_id(&slide_id).map(|(index, _)| index);

        match player.current_slide() {
            None if self.is_slide_mode() => {
                player.go(0);
            }
            None => {
                if !slide_id.is_empty() {
                    player.go(resolved.unwrap_or(0));
                }
            }
            Some(current) => {
                if current.id().as_deref() != Some(slide_id.as_str()) {
                    if let Some(index) = resolved {
                        player.go(index);
                    }
                }
            }
        }
    }

    fn set_title(&self) {
        let document = self.inner.window.document();
        let original = &self.inner.document_title;
        let current = self
            .shower()
            .and_then(|shower| shower.player().current_slide());

        match current {
            Some(slide) if self.is_slide_mode() => {
                let title = match slide.title() {
                    Some(title) if !title.is_empty() => {
                        format!("{}{}{}", title, TITLE_SEPARATOR, original)
                    }
                    _ => original.clone(),
                };
                document.set_title(&title);
            }
            _ => {
                if document.title() != *original {
                    document.set_title(original);
                }
            }
        }
    }
}

impl std::fmt::Debug for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Location")
            .field("key", &self.inner.state.borrow().key())
            .field("document_title", &self.inner.document_title)
            .finish()
    }
}

fn handler<F>(weak: &Weak<LocationInner>, callback: F) -> Handler
where
    F: Fn(&Location, &Event) + 'static,
{
    let weak = weak.clone();
    Handler::new(move |event| {
        if let Some(inner) = weak.upgrade() {
            callback(&Location { inner }, event);
        }
    })
}
