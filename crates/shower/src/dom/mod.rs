//! In-process document model
//!
//! A small element tree with the parts of the browser DOM the runtime
//! touches: attributes and classes, selector queries, markup in and out, and
//! per-element event emitters that bubble along the tree.

pub mod markup;
pub mod selector;

pub use selector::Selector;

use crate::window::KeyboardEvent;
use crate::Result;
use compact_str::CompactString;
use shower_event_system::{ContextId, Emitter, Event, EventData};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::warn;

/// A child of an element.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

struct ElementInner {
    tag: CompactString,
    attributes: RefCell<Vec<(String, String)>>,
    children: RefCell<Vec<Node>>,
    parent: RefCell<Weak<ElementInner>>,
    events: Emitter,
}

/// Shared handle to a document element. Clones refer to the same node.
///
/// An element's emitter is parented to its parent element's emitter while it
/// is attached, so events dispatched on an element bubble to its ancestors.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    /// Creates a detached element. The tag name is lowercased.
    pub fn new(tag: &str) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                tag: CompactString::new(tag.to_ascii_lowercase()),
                attributes: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
                parent: RefCell::new(Weak::new()),
                events: Emitter::with_context(ContextId::new()),
            }),
        }
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    // Attributes

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner
            .attributes
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.inner.attributes.borrow().iter().any(|(n, _)| n == name)
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let mut attributes = self.inner.attributes.borrow_mut();
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Returns whether the attribute was present.
    pub fn remove_attribute(&self, name: &str) -> bool {
        let mut attributes = self.inner.attributes.borrow_mut();
        let before = attributes.len();
        attributes.retain(|(n, _)| n != name);
        attributes.len() != before
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.inner.attributes.borrow().clone()
    }

    pub fn id(&self) -> Option<String> {
        self.attribute("id").filter(|id| !id.is_empty())
    }

    pub fn set_id(&self, id: &str) {
        self.set_attribute("id", id);
    }

    /// Value of a `data-*` attribute. Accepts `autoInit` or `auto-init`.
    pub fn data(&self, name: &str) -> Option<String> {
        let mut attribute = String::from("data-");
        for c in name.chars() {
            if c.is_ascii_uppercase() {
                attribute.push('-');
                attribute.push(c.to_ascii_lowercase());
            } else {
                attribute.push(c);
            }
        }
        self.attribute(&attribute)
    }

    // Classes

    pub fn classes(&self) -> Vec<String> {
        self.attribute("class")
            .map(|class| class.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&self, class: &str) {
        if class.is_empty() || self.has_class(class) {
            return;
        }
        let mut classes = self.classes();
        classes.push(class.to_string());
        self.set_attribute("class", &classes.join(" "));
    }

    pub fn remove_class(&self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let classes: Vec<String> = self.classes().into_iter().filter(|c| c != class).collect();
        self.set_attribute("class", &classes.join(" "));
    }

    /// Flips `class`, or forces it on/off. Returns whether it is now present.
    pub fn toggle_class(&self, class: &str, force: Option<bool>) -> bool {
        let on = force.unwrap_or(!self.has_class(class));
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
        on
    }

    // Tree

    pub fn parent(&self) -> Option<Element> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Element { inner })
    }

    /// Element children, text skipped.
    pub fn children(&self) -> Vec<Element> {
        self.inner
            .children
            .borrow()
            .iter()
            .filter_map(|node| match node {
                Node::Element(element) => Some(element.clone()),
                Node::Text(_) => None,
            })
            .collect()
    }

    pub fn child_nodes(&self) -> Vec<Node> {
        self.inner.children.borrow().clone()
    }

    pub fn first_child(&self) -> Option<Element> {
        self.children().into_iter().next()
    }

    /// Appends `child`, detaching it from its current parent first.
    pub fn append_child(&self, child: &Element) {
        self.insert_child(child, None);
    }

    /// Inserts `child` before every existing node.
    pub fn prepend_child(&self, child: &Element) {
        self.insert_child(child, Some(0));
    }

    fn insert_child(&self, child: &Element, position: Option<usize>) {
        if child.ptr_eq(self) {
            warn!("Refusing to append <{}> to itself", self.tag());
            return;
        }
        child.remove();

        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        child.inner.events.set_parent(Some(&self.inner.events));

        let mut children = self.inner.children.borrow_mut();
        let node = Node::Element(child.clone());
        match position {
            Some(index) => {
                let len = children.len();
                children.insert(index.min(len), node)
            }
            None => children.push(node),
        }
    }

    pub fn append_text(&self, text: &str) {
        self.append_node(Node::Text(text.to_string()));
    }

    pub(crate) fn append_node(&self, node: Node) {
        match node {
            Node::Element(element) => self.append_child(&element),
            text => self.inner.children.borrow_mut().push(text),
        }
    }

    /// Returns whether `child` was a child of this element.
    pub fn remove_child(&self, child: &Element) -> bool {
        let removed = {
            let mut children = self.inner.children.borrow_mut();
            let before = children.len();
            children.retain(|node| !matches!(node, Node::Element(e) if e.ptr_eq(child)));
            children.len() != before
        };
        if removed {
            *child.inner.parent.borrow_mut() = Weak::new();
            child.inner.events.set_parent(None);
        }
        removed
    }

    /// Detaches this element from its parent.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    pub fn clear_children(&self) {
        for child in self.children() {
            self.remove_child(&child);
        }
        self.inner.children.borrow_mut().clear();
    }

    /// Whether `other` is this element or one of its descendants.
    pub fn contains(&self, other: &Element) -> bool {
        let mut current = Some(other.clone());
        while let Some(element) = current {
            if element.ptr_eq(self) {
                return true;
            }
            current = element.parent();
        }
        false
    }

    /// Descendants in document order, self excluded.
    pub fn descendants(&self) -> Vec<Element> {
        let mut out = Vec::new();
        fn walk(element: &Element, out: &mut Vec<Element>) {
            for child in element.children() {
                out.push(child.clone());
                walk(&child, out);
            }
        }
        walk(self, &mut out);
        out
    }

    // Content

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        fn collect(element: &Element, out: &mut String) {
            for node in element.inner.children.borrow().iter() {
                match node {
                    Node::Text(text) => out.push_str(text),
                    Node::Element(child) => collect(child, out),
                }
            }
        }
        collect(self, &mut out);
        out
    }

    pub fn set_text_content(&self, text: &str) {
        self.clear_children();
        if !text.is_empty() {
            self.append_text(text);
        }
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        markup::serialize_children(self, &mut out);
        out
    }

    /// Replaces the children with parsed `html`. On a parse error the
    /// element is left untouched.
    pub fn set_inner_html(&self, html: &str) -> Result<()> {
        let nodes = markup::parse_fragment(html)?;
        self.clear_children();
        for node in nodes {
            self.append_node(node);
        }
        Ok(())
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        markup::serialize_element(self, &mut out);
        out
    }

    // Queries

    /// First descendant matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<Element>> {
        let selector = Selector::parse(selector)?;
        Ok(self.descendants().into_iter().find(|e| selector.matches(e)))
    }

    /// Every descendant matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Element>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants()
            .into_iter()
            .filter(|e| selector.matches(e))
            .collect())
    }

    pub fn matches(&self, selector: &str) -> Result<bool> {
        Ok(Selector::parse(selector)?.matches(self))
    }

    // Events

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    /// Dispatches `event_type` on this element; it bubbles to the ancestors.
    pub fn dispatch(&self, event_type: &str, data: EventData) -> Event {
        self.inner.events.emit(event_type, data)
    }

    pub fn click(&self) -> Event {
        self.dispatch("click", EventData::new())
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag())
            .field("id", &self.id())
            .field("classes", &self.classes())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

struct DocumentInner {
    root: Element,
    head: Element,
    body: Element,
    events: Emitter,
    active_element: RefCell<Option<Element>>,
}

/// A document: `<html>` with a head and a body, plus a document-level emitter
/// that receives `keydown`.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        let root = Element::new("html");
        let head = Element::new("head");
        let body = Element::new("body");
        root.append_child(&head);
        root.append_child(&body);

        Self {
            inner: Rc::new(DocumentInner {
                root,
                head,
                body,
                events: Emitter::with_context(ContextId::new()),
                active_element: RefCell::new(None),
            }),
        }
    }

    /// Builds a document from markup.
    ///
    /// A full page keeps its head and body (body attributes included). Any
    /// other content ends up in the body.
    pub fn parse(html: &str) -> Result<Self> {
        let document = Self::new();
        for node in markup::parse_fragment(html)? {
            document.adopt(node);
        }
        Ok(document)
    }

    fn adopt(&self, node: Node) {
        let element = match node {
            Node::Element(element) => element,
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    self.inner.body.append_text(&text);
                }
                return;
            }
        };

        match element.tag() {
            "html" => {
                copy_attributes(&element, &self.inner.root);
                for child in element.child_nodes() {
                    self.adopt(child);
                }
            }
            "head" => move_children(&element, &self.inner.head),
            "body" => {
                copy_attributes(&element, &self.inner.body);
                move_children(&element, &self.inner.body);
            }
            "title" | "meta" | "link" | "style" | "base" => self.inner.head.append_child(&element),
            _ => self.inner.body.append_child(&element),
        }
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> &Element {
        &self.inner.root
    }

    pub fn head(&self) -> &Element {
        &self.inner.head
    }

    pub fn body(&self) -> &Element {
        &self.inner.body
    }

    /// Text of the `<title>` element, empty when there is none.
    pub fn title(&self) -> String {
        self.title_element()
            .map(|title| title.text_content().trim().to_string())
            .unwrap_or_default()
    }

    pub fn set_title(&self, title: &str) {
        let element = match self.title_element() {
            Some(element) => element,
            None => {
                let element = Element::new("title");
                self.inner.head.append_child(&element);
                element
            }
        };
        element.set_text_content(title);
    }

    fn title_element(&self) -> Option<Element> {
        self.inner
            .head
            .descendants()
            .into_iter()
            .find(|e| e.tag() == "title")
    }

    pub fn create_element(&self, tag: &str) -> Element {
        Element::new(tag)
    }

    /// First element matching `selector`, the root included.
    pub fn query_selector(&self, selector: &str) -> Result<Option<Element>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Element>> {
        let parsed = Selector::parse(selector)?;
        let root = &self.inner.root;
        let mut found: Vec<Element> = Vec::new();
        if parsed.matches(root) {
            found.push(root.clone());
        }
        found.extend(root.descendants().into_iter().filter(|e| parsed.matches(e)));
        Ok(found)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.inner
            .root
            .descendants()
            .into_iter()
            .find(|e| e.id().as_deref() == Some(id))
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    /// Moves focus to `element`. Key events pick up its tag as their target.
    pub fn focus(&self, element: &Element) {
        *self.inner.active_element.borrow_mut() = Some(element.clone());
    }

    pub fn blur(&self) {
        *self.inner.active_element.borrow_mut() = None;
    }

    /// The focused element, `body` when nothing is focused.
    pub fn active_element(&self) -> Element {
        self.inner
            .active_element
            .borrow()
            .clone()
            .unwrap_or_else(|| self.inner.body.clone())
    }

    /// Dispatches `keydown` with the key event under `event`.
    pub fn dispatch_key(&self, event: &KeyboardEvent) -> Event {
        self.inner
            .events
            .emit("keydown", EventData::new().with("event", event.clone()))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("title", &self.title())
            .field("body", &self.inner.body)
            .finish()
    }
}

fn copy_attributes(from: &Element, to: &Element) {
    for (name, value) in from.attributes() {
        to.set_attribute(&name, &value);
    }
}

fn move_children(from: &Element, to: &Element) {
    for node in from.child_nodes() {
        match node {
            Node::Element(child) => to.append_child(&child),
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    to.append_text(&text);
                }
            }
        }
    }
}
