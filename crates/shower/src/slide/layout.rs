//! Slide view: the element behind a slide and its DOM-facing behaviour

use super::{Slide, WeakSlide};
use crate::dom::Element;
use crate::options::{option_str, Options, ShowerOptions};
use serde_json::{Map, Value};
use shower_event_system::{Emitter, EventData, EventGroup, Handler};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::warn;

struct LayoutInner {
    element: Element,
    options: Options,
    events: Emitter,
    parent: RefCell<Option<WeakSlide>>,
    parent_element: RefCell<Option<Element>>,
    slide_listeners: RefCell<Option<EventGroup>>,
    element_listeners: EventGroup,
    on_click: Handler,
}

impl LayoutInner {
    fn active_classname(&self) -> String {
        option_str(&self.options, "active_classname", &ShowerOptions::default().slide_active_classname)
    }

    fn visited_classname(&self) -> String {
        option_str(&self.options, "visited_classname", &ShowerOptions::default().slide_visited_classname)
    }

    fn title_selector(&self) -> String {
        option_str(
            &self.options,
            "title_element_selector",
            &ShowerOptions::default().slide_title_element_selector,
        )
    }

    fn clear_listeners(&self) {
        if let Some(group) = self.slide_listeners.borrow_mut().take() {
            group.off_all();
        }
        self.element_listeners.off_all();
    }
}

/// Element-side half of a slide.
///
/// Options: `title_element_selector`, `active_classname`,
/// `visited_classname`. Emits `click` when the element is clicked while a
/// slide is attached, `parentchange` and `parentelementchange`.
#[derive(Clone)]
pub struct Layout {
    inner: Rc<LayoutInner>,
}

impl Layout {
    pub fn new(element: Element, options: Map<String, Value>) -> Self {
        let defaults = ShowerOptions::default();
        let mut base = Map::new();
        base.insert(
            "title_element_selector".into(),
            Value::String(defaults.slide_title_element_selector),
        );
        base.insert(
            "active_classname".into(),
            Value::String(defaults.slide_active_classname),
        );
        base.insert(
            "visited_classname".into(),
            Value::String(defaults.slide_visited_classname),
        );

        let parent_element = element.parent();
        let events = Emitter::new();

        let inner = Rc::new_cyclic(|weak: &Weak<LayoutInner>| {
            let weak = weak.clone();
            let on_click = Handler::new(move |_| {
                if let Some(layout) = weak.upgrade() {
                    layout.events.emit("click", EventData::new());
                }
            });

            LayoutInner {
                element_listeners: element.events().group(),
                element,
                options: Options::layered([base, options]),
                events,
                parent: RefCell::new(None),
                parent_element: RefCell::new(parent_element),
                slide_listeners: RefCell::new(None),
                on_click,
            }
        });

        Self { inner }
    }

    pub fn element(&self) -> &Element {
        &self.inner.element
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Attaches the layout to `parent`, or detaches it with `None`.
    ///
    /// While attached, the slide's `activate` adds the active class and its
    /// `deactivate` swaps it for the visited class.
    pub fn set_parent(&self, parent: Option<&Slide>) -> crate::Result<()> {
        let current = self.parent();
        let unchanged = match (&current, parent) {
            (Some(a), Some(b)) => a == b,
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(());
        }

        self.inner.clear_listeners();
        *self.inner.parent.borrow_mut() = parent.map(Slide::downgrade);

        if let Some(slide) = parent {
            self.setup_listeners(slide)?;
        }

        self.inner.events.emit(
            "parentchange",
            EventData::new().with("parent", parent.cloned()),
        );
        Ok(())
    }

    fn setup_listeners(&self, slide: &Slide) -> crate::Result<()> {
        let weak = Rc::downgrade(&self.inner);
        let on_activate = Handler::new(move |_| {
            if let Some(layout) = weak.upgrade() {
                layout.element.add_class(&layout.active_classname());
            }
        });
        let weak = Rc::downgrade(&self.inner);
        let on_deactivate = Handler::new(move |_| {
            if let Some(layout) = weak.upgrade() {
                layout.element.remove_class(&layout.active_classname());
                layout.element.add_class(&layout.visited_classname());
            }
        });

        let group = slide.events().group();
        group
            .on("activate", &on_activate, None, 0)?
            .on("deactivate", &on_deactivate, None, 0)?;
        *self.inner.slide_listeners.borrow_mut() = Some(group);

        self.inner
            .element_listeners
            .on("click", &self.inner.on_click, None, 0)?;
        Ok(())
    }

    pub fn parent(&self) -> Option<Slide> {
        self.inner
            .parent
            .borrow()
            .as_ref()
            .and_then(WeakSlide::upgrade)
    }

    /// Moves the element under `parent_element`.
    pub fn set_parent_element(&self, parent_element: &Element) {
        let unchanged = self
            .inner
            .parent_element
            .borrow()
            .as_ref()
            .is_some_and(|current| current == parent_element);
        if unchanged {
            return;
        }

        *self.inner.parent_element.borrow_mut() = Some(parent_element.clone());
        parent_element.append_child(&self.inner.element);
        self.inner.events.emit(
            "parentelementchange",
            EventData::new().with("parent_element", parent_element.clone()),
        );
    }

    pub fn parent_element(&self) -> Option<Element> {
        self.inner.parent_element.borrow().clone()
    }

    fn title_element(&self) -> Option<Element> {
        let selector = self.inner.title_selector();
        match self.inner.element.query_selector(&selector) {
            Ok(found) => found,
            Err(e) => {
                warn!("Cannot look up slide title: {}", e);
                None
            }
        }
    }

    /// Text of the title element, if there is one.
    pub fn title(&self) -> Option<String> {
        self.title_element().map(|element| element.text_content())
    }

    /// Sets the title text, creating the title element as the first child
    /// when it is missing.
    pub fn set_title(&self, title: &str) {
        if let Some(element) = self.title_element() {
            element.set_text_content(title);
            return;
        }

        let selector = self.inner.title_selector();
        let tag = if selector.chars().all(|c| c.is_ascii_alphanumeric()) {
            selector.as_str()
        } else {
            "h2"
        };
        let element = Element::new(tag);
        element.set_text_content(title);
        self.inner.element.prepend_child(&element);
    }

    pub fn data(&self, name: &str) -> Option<String> {
        self.inner.element.data(name)
    }

    pub fn content(&self) -> String {
        self.inner.element.inner_html()
    }

    /// Detaches from the slide and the element.
    pub fn destroy(&self) {
        if let Err(e) = self.set_parent(None) {
            warn!("Failed to detach layout: {}", e);
        }
    }
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("element", &self.inner.element)
            .field("attached", &self.parent().is_some())
            .finish()
    }
}
