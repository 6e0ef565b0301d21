//! Slide navigation

use crate::dom::Document;
use crate::shower::{Shower, WeakShower};
use crate::slide::{Slide, WeakSlide};
use crate::window::{Key, KeyboardEvent};
use crate::Result;
use shower_event_system::{ContextId, Emitter, Event, EventData, EventGroup, Handler};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// Where [`Player::go`] should move.
#[derive(Debug, Clone)]
pub enum GoTarget {
    /// Position in the presentation. Negative values are out of range.
    Index(isize),
    /// A slide, resolved to its position. Unknown slides are out of range.
    Slide(Slide),
}

impl From<isize> for GoTarget {
    fn from(index: isize) -> Self {
        GoTarget::Index(index)
    }
}

impl From<i32> for GoTarget {
    fn from(index: i32) -> Self {
        GoTarget::Index(index as isize)
    }
}

impl From<usize> for GoTarget {
    fn from(index: usize) -> Self {
        GoTarget::Index(isize::try_from(index).unwrap_or(isize::MAX))
    }
}

impl From<Slide> for GoTarget {
    fn from(slide: Slide) -> Self {
        GoTarget::Slide(slide)
    }
}

impl From<&Slide> for GoTarget {
    fn from(slide: &Slide) -> Self {
        GoTarget::Slide(slide.clone())
    }
}

struct PlayerInner {
    shower: WeakShower,
    events: Emitter,
    current_index: Cell<Option<usize>>,
    current_slide: RefCell<Option<WeakSlide>>,
    shower_listeners: EventGroup,
    player_listeners: EventGroup,
    document_listeners: RefCell<Option<EventGroup>>,
    on_slide_activate: Handler,
}

/// Moves through the slides of one presentation.
///
/// Emits `activate` with `index: usize` and `slide: Slide` after every
/// successful move, plus `next`, `prev` and `keydown` (with
/// `event: KeyboardEvent`). `next` and `prev` are carried out by the player's
/// own listeners at priority 0, so a listener with a higher priority can
/// cancel a move with `prevent_default`.
#[derive(Clone)]
pub struct Player {
    inner: Rc<PlayerInner>,
}

impl Player {
    pub(crate) fn new(shower: WeakShower, shower_events: &Emitter) -> Self {
        let events = Emitter::child_of(shower_events, Some(ContextId::new()));
        let inner = Rc::new_cyclic(|weak: &Weak<PlayerInner>| PlayerInner {
            shower,
            player_listeners: events.group(),
            events,
            current_index: Cell::new(None),
            current_slide: RefCell::new(None),
            shower_listeners: shower_events.group(),
            document_listeners: RefCell::new(None),
            on_slide_activate: handler(weak, |player, event| {
                if let Some(slide) = event.get::<Slide>("slide") {
                    player.go(slide);
                }
            }),
        });

        Self { inner }
    }

    /// Registers the player on the presentation, its own emitter and the
    /// document's `keydown`.
    pub(crate) fn init(&self, document: &Document) -> Result<()> {
        let weak = Rc::downgrade(&self.inner);

        self.inner
            .shower_listeners
            .on(
                "slideadd",
                &handler(&weak, |player, event| player.on_slide_add(event)),
                None,
                0,
            )?
            .on(
                "slideremove",
                &handler(&weak, |player, event| player.on_slide_remove(event)),
                None,
                0,
            )?
            .on(
                "slidemodeenter",
                &handler(&weak, |player, _| {
                    if player.current_slide().is_none() {
                        player.first();
                    }
                }),
                None,
                0,
            )?;

        self.inner
            .player_listeners
            .on("prev", &handler(&weak, |player, _| player.step(-1)), None, 0)?
            .on("next", &handler(&weak, |player, _| player.step(1)), None, 0)?;

        let document_listeners = document.events().group();
        document_listeners.on(
            "keydown",
            &handler(&weak, |player, event| {
                if let Some(key) = event.get::<KeyboardEvent>("event") {
                    player.on_key_down(key);
                }
            }),
            None,
            0,
        )?;
        *self.inner.document_listeners.borrow_mut() = Some(document_listeners);

        Ok(())
    }

    /// Detaches every listener and forgets the current slide.
    pub fn destroy(&self) {
        self.inner.shower_listeners.off_all();
        self.inner.player_listeners.off_all();
        if let Some(group) = self.inner.document_listeners.borrow_mut().take() {
            group.off_all();
        }
        if let Some(shower) = self.shower() {
            for slide in shower.slides() {
                slide
                    .events()
                    .off("activate", &self.inner.on_slide_activate, None, 0);
            }
        }
        self.inner.current_index.set(None);
        *self.inner.current_slide.borrow_mut() = None;
    }

    /// Emits `next`; unless cancelled, moves one slide forward.
    pub fn next(&self) -> &Self {
        self.inner.events.emit("next", EventData::new());
        self
    }

    /// Emits `prev`; unless cancelled, moves one slide back.
    pub fn prev(&self) -> &Self {
        self.inner.events.emit("prev", EventData::new());
        self
    }

    pub fn first(&self) -> &Self {
        self.go(0)
    }

    pub fn last(&self) -> &Self {
        let count = self.shower().map_or(0, |shower| shower.slides_count());
        self.go(count as isize - 1)
    }

    /// Activates the slide at `target`.
    ///
    /// Does nothing when the target is the current slide or out of range.
    /// Otherwise deactivates the current slide, records the new position,
    /// activates the target and emits `activate`.
    pub fn go(&self, target: impl Into<GoTarget>) -> &Self {
        let Some(shower) = self.shower() else {
            return self;
        };

        let index = match target.into() {
            GoTarget::Index(index) => index,
            GoTarget::Slide(slide) => shower
                .slide_index(&slide)
                .map_or(-1, |index| index as isize),
        };
        let count = shower.slides_count() as isize;
        if index == self.current_position() || index < 0 || index >= count {
            trace!("go({}) ignored", index);
            return self;
        }
        let index = index as usize;
        let Some(slide) = shower.get(index) else {
            return self;
        };

        if let Some(previous) = self.current_slide() {
            if previous.is_active() {
                previous.deactivate();
            }
        }

        *self.inner.current_slide.borrow_mut() = Some(slide.downgrade());
        self.inner.current_index.set(Some(index));

        if !slide.is_active() {
            slide.activate();
        }

        debug!("Slide {} ({:?}) is now current", index, slide.id());
        self.inner.events.emit(
            "activate",
            EventData::new().with("index", index).with("slide", slide),
        );
        self
    }

    pub fn current_slide(&self) -> Option<Slide> {
        self.inner
            .current_slide
            .borrow()
            .as_ref()
            .and_then(WeakSlide::upgrade)
    }

    /// Index of the current slide, `None` before the first move.
    pub fn current_slide_index(&self) -> Option<usize> {
        self.inner.current_index.get()
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    /// Target stamped on the player's own events.
    pub fn context(&self) -> Option<ContextId> {
        self.inner.events.context()
    }

    fn shower(&self) -> Option<Shower> {
        self.inner.shower.upgrade()
    }

    fn current_position(&self) -> isize {
        self.inner
            .current_index
            .get()
            .map_or(-1, |index| index as isize)
    }

    fn step(&self, delta: isize) {
        self.go(self.current_position() + delta);
    }

    fn on_slide_add(&self, event: &Event) {
        if let Some(slide) = event.get::<Slide>("slide") {
            if let Err(e) = slide
                .events()
                .on("activate", &self.inner.on_slide_activate, None, 0)
            {
                warn!("Cannot follow slide activation: {}", e);
            }
        }
    }

    fn on_slide_remove(&self, event: &Event) {
        if let Some(slide) = event.get::<Slide>("slide") {
            slide
                .events()
                .off("activate", &self.inner.on_slide_activate, None, 0);
        }
        let Some(&removed) = event.get::<usize>("index") else {
            return;
        };

        match self.inner.current_index.get() {
            Some(current) if current == removed => {
                debug!("Current slide removed, player reset");
                self.inner.current_index.set(None);
                *self.inner.current_slide.borrow_mut() = None;
            }
            Some(current) if removed < current => {
                self.inner.current_index.set(Some(current - 1));
            }
            _ => {}
        }
    }

    fn on_key_down(&self, key: &KeyboardEvent) {
        let Some(shower) = self.shower() else {
            return;
        };
        if !shower.is_hotkeys_enabled() || key.is_editable_target() {
            return;
        }

        let event = self
            .inner
            .events
            .emit("keydown", EventData::new().with("event", key.clone()));
        if event.default_prevented() {
            return;
        }

        let modifiers = key.modifiers;
        let chord = modifiers.alt || modifiers.ctrl || modifiers.meta;
        match key.key {
            Key::PageUp | Key::Up | Key::Left | Key::Char('h') | Key::Char('k') => {
                if chord {
                    return;
                }
                key.prevent_default();
                self.prev();
            }
            Key::PageDown | Key::Down | Key::Right | Key::Char('l') | Key::Char('j') => {
                if chord {
                    return;
                }
                key.prevent_default();
                self.next();
            }
            Key::Home => {
                key.prevent_default();
                self.first();
            }
            Key::End => {
                key.prevent_default();
                self.last();
            }
            Key::Space => {
                if shower.container().is_slide_mode() {
                    key.prevent_default();
                    if modifiers.shift {
                        self.prev();
                    } else {
                        self.next();
                    }
                }
            }
            _ => {}
        }
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("current_slide_index", &self.current_slide_index())
            .finish()
    }
}

fn handler<F>(weak: &Weak<PlayerInner>, callback: F) -> Handler
where
    F: Fn(&Player, &Event) + 'static,
{
    let weak = weak.clone();
    Handler::new(move |event| {
        if let Some(inner) = weak.upgrade() {
            callback(&Player { inner }, event);
        }
    })
}
