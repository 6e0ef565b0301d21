//! Presentation composition root
//!
//! A [`Shower`] owns the slide list and wires the [`Player`], [`Container`]
//! and [`Location`] of one presentation together.

use crate::container::Container;
use crate::context::ShowerContext;
use crate::dom::{Document, Element};
use crate::error::ShowerError;
use crate::location::Location;
use crate::options::{option_str, Options, ShowerOptions};
use crate::parser::{default_parser, SlidesParser};
use crate::player::Player;
use crate::slide::Slide;
use crate::window::Window;
use crate::Result;
use serde_json::{Map, Value};
use shower_event_system::{ContextId, Emitter, EventData, EventGroup, Handler};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

/// How to find the container element.
#[derive(Debug, Clone)]
pub enum ContainerRef {
    Element(Element),
    Selector(String),
}

impl From<Element> for ContainerRef {
    fn from(element: Element) -> Self {
        ContainerRef::Element(element)
    }
}

impl From<&Element> for ContainerRef {
    fn from(element: &Element) -> Self {
        ContainerRef::Element(element.clone())
    }
}

impl From<&str> for ContainerRef {
    fn from(selector: &str) -> Self {
        ContainerRef::Selector(selector.to_string())
    }
}

impl From<String> for ContainerRef {
    fn from(selector: String) -> Self {
        ContainerRef::Selector(selector)
    }
}

/// A slide given by position or by handle.
#[derive(Debug, Clone)]
pub enum SlideRef {
    Index(usize),
    Slide(Slide),
}

impl From<usize> for SlideRef {
    fn from(index: usize) -> Self {
        SlideRef::Index(index)
    }
}

impl From<Slide> for SlideRef {
    fn from(slide: Slide) -> Self {
        SlideRef::Slide(slide)
    }
}

impl From<&Slide> for SlideRef {
    fn from(slide: &Slide) -> Self {
        SlideRef::Slide(slide.clone())
    }
}

pub(crate) struct ShowerInner {
    context: ContextId,
    events: Emitter,
    options: Options,
    window: Window,
    player: Player,
    container: Container,
    location: RefCell<Option<Location>>,
    slides: RefCell<Vec<Slide>>,
    hotkeys: Cell<bool>,
    live_region: RefCell<Option<Element>>,
    player_listeners: EventGroup,
}

/// Non-owning presentation reference held by its parts.
#[derive(Clone)]
pub struct WeakShower(Weak<ShowerInner>);

impl WeakShower {
    pub fn upgrade(&self) -> Option<Shower> {
        self.0.upgrade().map(|inner| Shower { inner })
    }
}

/// Configures and builds a [`Shower`].
pub struct ShowerBuilder {
    context: ShowerContext,
    window: Window,
    container: Option<ContainerRef>,
    options: Map<String, Value>,
    slides_parser: Option<SlidesParser>,
}

impl ShowerBuilder {
    pub fn new(context: &ShowerContext, window: &Window) -> Self {
        Self {
            context: context.clone(),
            window: window.clone(),
            container: None,
            options: Map::new(),
            slides_parser: None,
        }
    }

    /// Container element or selector. Defaults to the `container_selector` option.
    pub fn container(mut self, container: impl Into<ContainerRef>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Explicit options, layered over the context defaults.
    pub fn options(mut self, options: Map<String, Value>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn option(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.options.insert(name.to_string(), value.into());
        self
    }

    pub fn slides_parser(mut self, parser: SlidesParser) -> Self {
        self.slides_parser = Some(parser);
        self
    }

    /// Builds the presentation and announces it on the context.
    ///
    /// # Returns
    ///
    /// The presentation, or `ContainerNotFound` when the container selector
    /// matches nothing.
    pub fn build(self) -> Result<Shower> {
        let options = Options::layered([self.context.default_options(), self.options]);
        let document = self.window.document().clone();

        let element = match self.container {
            Some(ContainerRef::Element(element)) => element,
            Some(ContainerRef::Selector(selector)) => find_container(&document, &selector)?,
            None => {
                let selector = option_str(
                    &options,
                    "container_selector",
                    &ShowerOptions::default().container_selector,
                );
                find_container(&document, &selector)?
            }
        };

        let context = ContextId::new();
        let events = Emitter::child_of(self.context.events(), Some(context));
        let body = document.body().clone();
        let window = self.window;

        let inner = Rc::new_cyclic(|weak: &Weak<ShowerInner>| {
            let player = Player::new(WeakShower(weak.clone()), &events);
            let container = Container::new(&events, element, body, options.clone());
            ShowerInner {
                context,
                player_listeners: player.events().group(),
                player,
                container,
                events,
                options,
                window,
                location: RefCell::new(None),
                slides: RefCell::new(Vec::new()),
                hotkeys: Cell::new(true),
                live_region: RefCell::new(None),
            }
        });
        let shower = Shower { inner };

        shower.inner.player.init(&document)?;
        shower.init_slides(self.slides_parser.unwrap_or_else(default_parser))?;
        shower.init_live_region(&document);

        let options = &shower.inner.options;
        if options.get_bool("debug_mode") {
            let class = option_str(
                options,
                "debug_mode_classname",
                &ShowerOptions::default().debug_mode_classname,
            );
            document.body().add_class(&class);
            info!("🐞 Debug mode on");
        }
        if options.contains("hotkeys") && !options.get_bool("hotkeys") {
            shower.disable_hotkeys();
        }

        let weak = shower.downgrade();
        let on_activate = Handler::new(move |event| {
            let (Some(shower), Some(slide)) = (weak.upgrade(), event.get::<Slide>("slide")) else {
                return;
            };
            if let Err(e) = shower.update_live_region(&slide.content()) {
                warn!("Failed to update live region: {}", e);
            }
        });
        shower
            .inner
            .player_listeners
            .on("activate", &on_activate, None, 0)?;

        let location = Location::new(&shower)?;
        *shower.inner.location.borrow_mut() = Some(location);

        info!(
            "🎬 Presentation {} ready with {} slides",
            shower.inner.context,
            shower.slides_count()
        );
        self.context.notify(&shower);
        Ok(shower)
    }
}

fn find_container(document: &Document, selector: &str) -> Result<Element> {
    document
        .query_selector(selector)?
        .ok_or_else(|| ShowerError::ContainerNotFound(selector.to_string()))
}

/// One presentation.
///
/// Its emitter is a child of the context emitter; player and container
/// emitters are children of it. Emits `slideadd {slide}`,
/// `slideremove {slide, index}` and `destroy`.
#[derive(Clone)]
pub struct Shower {
    inner: Rc<ShowerInner>,
}

impl Shower {
    /// Builds a presentation with the default slides parser.
    ///
    /// # Arguments
    ///
    /// * `context` - Registry the presentation announces itself to
    /// * `window` - Window holding the document
    /// * `container` - Container element or selector, `None` for the
    ///   `container_selector` option
    /// * `options` - Explicit options, layered over the context defaults
    pub fn new(
        context: &ShowerContext,
        window: &Window,
        container: Option<ContainerRef>,
        options: Map<String, Value>,
    ) -> Result<Self> {
        let mut builder = ShowerBuilder::new(context, window).options(options);
        if let Some(container) = container {
            builder = builder.container(container);
        }
        builder.build()
    }

    pub fn builder(context: &ShowerContext, window: &Window) -> ShowerBuilder {
        ShowerBuilder::new(context, window)
    }

    fn init_slides(&self, parser: SlidesParser) -> Result<()> {
        let selector = option_str(
            &self.inner.options,
            "slides_selector",
            &ShowerOptions::default().slides_selector,
        );
        let slides = parser(self.inner.container.element(), &selector, &self.inner.options)?;
        self.add_many(slides);
        Ok(())
    }

    fn init_live_region(&self, document: &Document) {
        let region = document.create_element("section");
        region.set_attribute("role", "region");
        region.set_attribute("aria-live", "assertive");
        region.set_attribute("aria-relevant", "additions");
        region.set_attribute("aria-label", "Slide Content: Auto-updating");
        region.add_class("region");
        document.body().append_child(&region);
        *self.inner.live_region.borrow_mut() = Some(region);
    }

    /// Appends `slide`, stamps its index and emits `slideadd`.
    pub fn add(&self, slide: Slide) -> &Self {
        {
            let mut slides = self.inner.slides.borrow_mut();
            slide.set_index(Some(slides.len()));
            slides.push(slide.clone());
        }
        debug!("Added slide {:?}", slide.id());
        self.inner
            .events
            .emit("slideadd", EventData::new().with("slide", slide));
        self
    }

    pub fn add_many(&self, slides: impl IntoIterator<Item = Slide>) -> &Self {
        for slide in slides {
            self.add(slide);
        }
        self
    }

    /// Removes a slide, renumbers the rest, emits `slideremove` and destroys
    /// the removed slide.
    pub fn remove(&self, target: impl Into<SlideRef>) -> Result<&Self> {
        let index = match target.into() {
            SlideRef::Index(index) => index,
            SlideRef::Slide(slide) => self.slide_index(&slide).ok_or(ShowerError::SlideNotFound)?,
        };

        let slide = {
            let mut slides = self.inner.slides.borrow_mut();
            if index >= slides.len() {
                return Err(ShowerError::SlideNotFound);
            }
            let slide = slides.remove(index);
            for (position, rest) in slides.iter().enumerate().skip(index) {
                rest.set_index(Some(position));
            }
            slide
        };
        slide.set_index(None);

        debug!("Removed slide {:?} at {}", slide.id(), index);
        self.inner.events.emit(
            "slideremove",
            EventData::new()
                .with("slide", slide.clone())
                .with("index", index),
        );
        slide.destroy();
        Ok(self)
    }

    pub fn get(&self, index: usize) -> Option<Slide> {
        self.inner.slides.borrow().get(index).cloned()
    }

    /// Copy of the slide list.
    pub fn slides(&self) -> Vec<Slide> {
        self.inner.slides.borrow().clone()
    }

    pub fn slides_count(&self) -> usize {
        self.inner.slides.borrow().len()
    }

    pub fn slide_index(&self, slide: &Slide) -> Option<usize> {
        self.inner.slides.borrow().iter().position(|s| s == slide)
    }

    pub fn enable_hotkeys(&self) -> &Self {
        self.inner.hotkeys.set(true);
        self
    }

    pub fn disable_hotkeys(&self) -> &Self {
        self.inner.hotkeys.set(false);
        self
    }

    pub fn is_hotkeys_enabled(&self) -> bool {
        self.inner.hotkeys.get()
    }

    /// The ARIA live region announcing slide content.
    pub fn live_region(&self) -> Option<Element> {
        self.inner.live_region.borrow().clone()
    }

    pub fn update_live_region(&self, content: &str) -> Result<&Self> {
        if let Some(region) = self.live_region() {
            region.set_inner_html(content)?;
        }
        Ok(self)
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn player(&self) -> &Player {
        &self.inner.player
    }

    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    pub fn location(&self) -> Option<Location> {
        self.inner.location.borrow().clone()
    }

    pub fn window(&self) -> &Window {
        &self.inner.window
    }

    pub fn document(&self) -> &Document {
        self.inner.window.document()
    }

    pub fn context(&self) -> ContextId {
        self.inner.context
    }

    /// Emits `destroy`, then tears down location, container and player and
    /// drops the slide list.
    pub fn destroy(&self) {
        self.inner.events.emit("destroy", EventData::new());

        let location = self.inner.location.borrow_mut().take();
        if let Some(location) = location {
            location.destroy();
        }
        self.inner.container.destroy();
        self.inner.player.destroy();
        self.inner.player_listeners.off_all();
        self.inner.slides.borrow_mut().clear();

        info!("Presentation {} destroyed", self.inner.context);
    }

    pub fn downgrade(&self) -> WeakShower {
        WeakShower(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Shower) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Shower {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for Shower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shower")
            .field("context", &self.inner.context)
            .field("slides", &self.slides_count())
            .field("current", &self.inner.player.current_slide_index())
            .field("slide_mode", &self.inner.container.is_slide_mode())
            .finish()
    }
}
