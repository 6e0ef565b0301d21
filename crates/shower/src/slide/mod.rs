//! Slides
//!
//! A [`Slide`] is the model half: activation state, a visit counter and its
//! position in the presentation. The element-facing half is its [`Layout`].

pub mod factory;
pub mod layout;

pub use layout::Layout;

use crate::dom::Element;
use crate::options::Options;
use crate::store::Store;
use crate::Result;
use serde_json::{json, Map, Value};
use shower_event_system::{ContextId, Emitter, EventData, EventGroup, Handler};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::trace;

struct SlideInner {
    events: Emitter,
    options: Options,
    layout: Layout,
    state: RefCell<Store>,
    active: Cell<bool>,
    layout_listeners: EventGroup,
}

/// One slide of a presentation.
///
/// Emits `activate`, `deactivate` and `click`, each with `slide: Slide`.
#[derive(Clone)]
pub struct Slide {
    inner: Rc<SlideInner>,
}

impl Slide {
    /// Wraps an existing element.
    ///
    /// # Arguments
    ///
    /// * `element` - The slide's element, usually already in a document
    /// * `options` - Layout options (`title_element_selector`,
    ///   `active_classname`, `visited_classname`)
    pub fn new(element: Element, options: Map<String, Value>) -> Result<Self> {
        let layout = Layout::new(element, options.clone());
        Self::with_layout(layout, options)
    }

    /// Builds a slide from markup through the layout factory.
    pub fn from_content(content: &str, options: Map<String, Value>) -> Result<Self> {
        let layout = factory::create_layout(content, None, options.clone())?;
        Self::with_layout(layout, options)
    }

    fn with_layout(layout: Layout, options: Map<String, Value>) -> Result<Self> {
        let inner = Rc::new(SlideInner {
            events: Emitter::with_context(ContextId::new()),
            options: Options::new(options),
            layout_listeners: layout.events().group(),
            layout,
            state: RefCell::new(Store::new(initial_state())),
            active: Cell::new(false),
        });
        let slide = Slide { inner };
        slide.inner.layout.set_parent(Some(&slide))?;

        let weak = Rc::downgrade(&slide.inner);
        let on_click = Handler::new(move |_| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let slide = Slide { inner };
            slide.activate();
            slide
                .inner
                .events
                .emit("click", EventData::new().with("slide", slide.clone()));
        });
        slide.inner.layout_listeners.on("click", &on_click, None, 0)?;

        Ok(slide)
    }

    /// Marks the slide active, counts the visit and emits `activate`.
    pub fn activate(&self) -> &Self {
        self.inner.active.set(true);
        let visited = self.visited() + 1;
        self.inner.state.borrow_mut().set("visited", visited);
        trace!("Slide {:?} activated ({} visits)", self.id(), visited);

        self.inner
            .events
            .emit("activate", EventData::new().with("slide", self.clone()));
        self
    }

    pub fn deactivate(&self) -> &Self {
        self.inner.active.set(false);
        self.inner
            .events
            .emit("deactivate", EventData::new().with("slide", self.clone()));
        self
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub fn is_visited(&self) -> bool {
        self.visited() > 0
    }

    /// Number of activations so far.
    pub fn visited(&self) -> u64 {
        self.inner
            .state
            .borrow()
            .get("visited")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Position in the owning presentation, `None` until added.
    pub fn index(&self) -> Option<usize> {
        self.inner
            .state
            .borrow()
            .get("index")
            .and_then(Value::as_u64)
            .map(|index| index as usize)
    }

    pub(crate) fn set_index(&self, index: Option<usize>) {
        let value = index.map_or(Value::Null, |index| json!(index));
        self.inner.state.borrow_mut().set("index", value);
    }

    /// Copy of `{visited, index}`.
    pub fn state(&self) -> Map<String, Value> {
        self.inner.state.borrow().all()
    }

    pub fn id(&self) -> Option<String> {
        self.inner.layout.element().id()
    }

    pub fn title(&self) -> Option<String> {
        self.inner.layout.title()
    }

    pub fn set_title(&self, title: &str) -> &Self {
        self.inner.layout.set_title(title);
        self
    }

    /// Inner markup of the slide element.
    pub fn content(&self) -> String {
        self.inner.layout.content()
    }

    pub fn data(&self, name: &str) -> Option<String> {
        self.inner.layout.data(name)
    }

    pub fn element(&self) -> &Element {
        self.inner.layout.element()
    }

    pub fn layout(&self) -> &Layout {
        &self.inner.layout
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Detaches the slide from its layout. The slide stops reacting to clicks.
    pub fn destroy(&self) {
        self.inner.layout_listeners.off_all();
        self.inner.active.set(false);
        self.inner.layout.destroy();
    }

    pub fn downgrade(&self) -> WeakSlide {
        WeakSlide(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Slide) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Slide {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Slide {}

impl std::fmt::Debug for Slide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slide")
            .field("id", &self.id())
            .field("index", &self.index())
            .field("active", &self.is_active())
            .field("visited", &self.visited())
            .finish()
    }
}

/// Non-owning slide reference.
#[derive(Clone)]
pub struct WeakSlide(Weak<SlideInner>);

impl WeakSlide {
    pub fn upgrade(&self) -> Option<Slide> {
        self.0.upgrade().map(|inner| Slide { inner })
    }
}

impl std::fmt::Debug for WeakSlide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.upgrade() {
            Some(slide) => write!(f, "WeakSlide({:?})", slide.id()),
            None => write!(f, "WeakSlide(dropped)"),
        }
    }
}

fn initial_state() -> Map<String, Value> {
    let mut state = Map::new();
    state.insert("visited".into(), json!(0));
    state.insert("index".into(), Value::Null);
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(markup: &str) -> Slide {
        let element = Element::new("section");
        element.add_class("slide");
        element.set_inner_html(markup).unwrap();
        Slide::new(element, Map::new()).unwrap()
    }

    #[test]
    fn test_activation_toggles_classes() {
        let slide = slide("<h2>One</h2>");
        assert!(!slide.is_visited());
        assert_eq!(slide.index(), None);

        slide.activate();
        assert!(slide.is_active());
        assert!(slide.element().has_class("active"));
        assert_eq!(slide.visited(), 1);

        slide.deactivate();
        assert!(!slide.is_active());
        assert!(!slide.element().has_class("active"));
        assert!(slide.element().has_class("visited"));

        slide.activate();
        assert_eq!(slide.visited(), 2);
    }

    #[test]
    fn test_custom_classnames() {
        let mut options = Map::new();
        options.insert("active_classname".into(), json!("current"));
        let element = Element::new("section");
        let slide = Slide::new(element, options).unwrap();

        slide.activate();
        assert!(slide.element().has_class("current"));
        assert!(!slide.element().has_class("active"));
    }

    #[test]
    fn test_click_activates_and_reemits() {
        let slide = slide("<p>body</p>");
        let clicked = Rc::new(Cell::new(0));
        let counter = clicked.clone();
        let handler = Handler::new(move |event| {
            assert!(event.get::<Slide>("slide").is_some());
            counter.set(counter.get() + 1);
        });
        slide.events().on("click", &handler, None, 0).unwrap();

        slide.element().children()[0].click();
        assert!(slide.is_active());
        assert_eq!(clicked.get(), 1);

        slide.destroy();
        slide.element().click();
        assert_eq!(clicked.get(), 1);
        assert!(slide.layout().parent().is_none());
    }

    #[test]
    fn test_title_and_content() {
        let titled = slide("<h2>Intro</h2><p>text</p>");
        assert_eq!(titled.title().as_deref(), Some("Intro"));
        titled.set_title("Welcome");
        assert_eq!(titled.title().as_deref(), Some("Welcome"));

        let untitled = slide("<p>text</p>");
        assert_eq!(untitled.title(), None);
        untitled.set_title("Added");
        assert_eq!(untitled.content(), "<h2>Added</h2><p>text</p>");
    }

    #[test]
    fn test_from_content() {
        let slide = Slide::from_content("<h2>Generated</h2>", Map::new()).unwrap();
        assert!(slide.element().has_class("slide"));
        assert_eq!(slide.title().as_deref(), Some("Generated"));
        assert_eq!(slide.layout().parent(), Some(slide.clone()));
    }

    #[test]
    fn test_data_attributes() {
        let element = Element::new("section");
        element.set_attribute("data-timing", "00:30");
        let slide = Slide::new(element, Map::new()).unwrap();
        assert_eq!(slide.data("timing").as_deref(), Some("00:30"));
    }
}
