//! List/slide mode switching on the document body

use crate::dom::Element;
use crate::options::{option_str, Options, ShowerOptions};
use shower_event_system::{Emitter, EventData};
use std::rc::Rc;
use tracing::debug;

struct ContainerInner {
    element: Element,
    body: Element,
    options: Options,
    events: Emitter,
}

/// The presentation's container element and its view mode.
///
/// Slide (full screen) mode is the body carrying `mode_full_classname`; list
/// mode is `mode_list_classname`. Emits `slidemodeenter` and `slidemodeexit`
/// on the container emitter, which bubbles to the presentation.
#[derive(Clone)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

impl Container {
    pub fn new(parent_events: &Emitter, element: Element, body: Element, options: Options) -> Self {
        let container = Self {
            inner: Rc::new(ContainerInner {
                element,
                body,
                options,
                events: Emitter::child_of(parent_events, parent_events.context()),
            }),
        };

        let (full, list) = (container.full_classname(), container.list_classname());
        if !container.inner.body.has_class(&full) && !container.inner.body.has_class(&list) {
            container.inner.body.add_class(&list);
        }
        container
    }

    fn full_classname(&self) -> String {
        option_str(
            &self.inner.options,
            "mode_full_classname",
            &ShowerOptions::default().mode_full_classname,
        )
    }

    fn list_classname(&self) -> String {
        option_str(
            &self.inner.options,
            "mode_list_classname",
            &ShowerOptions::default().mode_list_classname,
        )
    }

    /// Switches to slide mode. Emits `slidemodeenter` only on an actual change.
    pub fn enter_slide_mode(&self) -> &Self {
        if self.is_slide_mode() {
            return self;
        }
        let body = &self.inner.body;
        body.remove_class(&self.list_classname());
        body.add_class(&self.full_classname());

        debug!("Entered slide mode");
        self.inner.events.emit("slidemodeenter", EventData::new());
        self
    }

    /// Switches to list mode. Emits `slidemodeexit` only on an actual change.
    pub fn exit_slide_mode(&self) -> &Self {
        let body = &self.inner.body;
        let full = self.full_classname();
        let list = self.list_classname();
        if !body.has_class(&full) && body.has_class(&list) {
            return self;
        }
        let was_slide_mode = body.has_class(&full);
        body.remove_class(&full);
        body.add_class(&list);

        if was_slide_mode {
            debug!("Exited slide mode");
            self.inner.events.emit("slidemodeexit", EventData::new());
        }
        self
    }

    pub fn toggle_mode(&self) -> &Self {
        if self.is_slide_mode() {
            self.exit_slide_mode()
        } else {
            self.enter_slide_mode()
        }
    }

    pub fn is_slide_mode(&self) -> bool {
        self.inner.body.has_class(&self.full_classname())
    }

    pub fn element(&self) -> &Element {
        &self.inner.element
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    /// Detaches the container emitter from the presentation.
    pub fn destroy(&self) {
        self.inner.events.set_parent(None);
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("element", &self.inner.element)
            .field("slide_mode", &self.is_slide_mode())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shower_event_system::Handler;
    use std::cell::RefCell;

    fn setup(body_class: Option<&str>) -> (Container, Element, Emitter) {
        let parent = Emitter::new();
        let body = Element::new("body");
        if let Some(class) = body_class {
            body.add_class(class);
        }
        let element = Element::new("div");
        body.append_child(&element);
        let container = Container::new(&parent, element, body.clone(), Options::default());
        (container, body, parent)
    }

    #[test]
    fn test_body_defaults_to_list_mode() {
        let (container, body, _parent) = setup(None);
        assert!(body.has_class("list"));
        assert!(!container.is_slide_mode());

        let (container, body, _parent) = setup(Some("full"));
        assert!(!body.has_class("list"));
        assert!(container.is_slide_mode());
    }

    #[test]
    fn test_mode_events_only_on_change() {
        let (container, body, parent) = setup(None);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let handler = Handler::new(move |event| log.borrow_mut().push(event.event_type().to_string()));
        parent
            .on(["slidemodeenter", "slidemodeexit"], &handler, None, 0)
            .unwrap();

        container.enter_slide_mode().enter_slide_mode();
        assert!(body.has_class("full") && !body.has_class("list"));
        container.exit_slide_mode().exit_slide_mode();
        container.toggle_mode();

        assert_eq!(
            *seen.borrow(),
            vec!["slidemodeenter", "slidemodeexit", "slidemodeenter"]
        );
    }
}
