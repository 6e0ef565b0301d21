//! Event payloads, events and handlers

use crate::context::ContextId;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Heterogeneous key/value payload carried by an [`Event`].
///
/// Values are stored behind `Rc<dyn Any>` so payloads can carry handles to
/// runtime objects (slides, presentations) as well as plain data. Cloning a
/// payload is cheap and shares the values.
#[derive(Clone, Default)]
pub struct EventData {
    entries: SmallVec<[(CompactString, Rc<dyn Any>); 4]>,
}

impl EventData {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with<T: 'static>(mut self, key: &str, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a value.
    pub fn insert<T: 'static>(&mut self, key: &str, value: T) {
        let value: Rc<dyn Any> = Rc::new(value);
        match self.entries.iter_mut().find(|(k, _)| k.as_str() == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((CompactString::new(key), value)),
        }
    }

    /// Typed lookup. Returns `None` when the key is missing or holds another type.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .and_then(|(_, v)| v.downcast_ref::<T>())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.as_str() == key)
    }

    /// Copies every entry of `other` into `self`, overriding existing keys.
    pub fn merge(&mut self, other: &EventData) {
        for (key, value) in other.entries.iter() {
            match self.entries.iter_mut().find(|(k, _)| k.as_str() == key.as_str()) {
                Some(entry) => entry.1 = value.clone(),
                None => self.entries.push((key.clone(), value.clone())),
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for EventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

/// A dispatched event.
///
/// Everything but the two control flags is fixed at construction. The flags
/// only move forward: once prevented or stopped, an event stays that way.
pub struct Event {
    event_type: CompactString,
    target: Option<ContextId>,
    data: EventData,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    /// Creates an event with no target.
    pub fn new(event_type: &str, data: EventData) -> Self {
        Self::with_target(event_type, None, data)
    }

    /// Creates an event stamped with the context of the emitter that built it.
    pub fn with_target(event_type: &str, target: Option<ContextId>, data: EventData) -> Self {
        Self {
            event_type: CompactString::new(event_type),
            target,
            data,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> Option<ContextId> {
        self.target
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// Shorthand for `self.data().get(key)`.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.data.get(key)
    }

    /// Halts delivery to every listener that has not run yet, parents included.
    pub fn prevent_default(&self) -> bool {
        self.default_prevented.set(true);
        true
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Keeps the event from bubbling to the parent emitter.
    pub fn stop_propagation(&self) -> bool {
        self.propagation_stopped.set(true);
        true
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("type", &self.event_type)
            .field("target", &self.target)
            .field("data", &self.data)
            .field("default_prevented", &self.default_prevented.get())
            .field("propagation_stopped", &self.propagation_stopped.get())
            .finish()
    }
}

/// Shared event callback.
///
/// Handlers compare by identity: two clones of the same `Handler` are equal,
/// two handlers built from identical closures are not. Keep a clone around to
/// remove a registration later.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Event) + 'static,
    {
        Self(Rc::new(callback))
    }

    /// Invokes the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// One or many event type names.
///
/// Lets `on`/`off` accept either `"activate"` or `["slidemodeenter", "slidemodeexit"]`.
pub trait EventTypes {
    fn event_types(&self) -> SmallVec<[&str; 2]>;
}

impl EventTypes for &str {
    fn event_types(&self) -> SmallVec<[&str; 2]> {
        smallvec::smallvec![*self]
    }
}

impl EventTypes for String {
    fn event_types(&self) -> SmallVec<[&str; 2]> {
        smallvec::smallvec![self.as_str()]
    }
}

impl<const N: usize> EventTypes for [&str; N] {
    fn event_types(&self) -> SmallVec<[&str; 2]> {
        self.iter().copied().collect()
    }
}

impl EventTypes for &[&str] {
    fn event_types(&self) -> SmallVec<[&str; 2]> {
        self.iter().copied().collect()
    }
}

impl EventTypes for Vec<&str> {
    fn event_types(&self) -> SmallVec<[&str; 2]> {
        self.iter().copied().collect()
    }
}
