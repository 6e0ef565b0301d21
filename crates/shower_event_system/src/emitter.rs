//! Prioritised event emitter with parent-chain propagation

use crate::context::ContextId;
use crate::error::EventError;
use crate::event::{Event, EventData, EventTypes, Handler};
use crate::group::EventGroup;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::trace;

/// Identifies one registration inside an emitter. Ids grow monotonically, so
/// they double as registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Clone)]
struct Listener {
    id: ListenerId,
    handler: Handler,
    context: Option<ContextId>,
    priority: i32,
}

impl Listener {
    fn matches(&self, handler: &Handler, context: Option<ContextId>, priority: i32) -> bool {
        self.handler == *handler && self.context == context && self.priority == priority
    }
}

struct EmitterInner {
    context: Option<ContextId>,
    parent: RefCell<Weak<EmitterInner>>,
    listeners: RefCell<HashMap<CompactString, SmallVec<[Listener; 4]>>>,
    next_id: Cell<u64>,
}

impl EmitterInner {
    fn add_listener(
        &self,
        event_type: &str,
        handler: Handler,
        context: Option<ContextId>,
        priority: i32,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.listeners
            .borrow_mut()
            .entry(CompactString::new(event_type))
            .or_default()
            .push(Listener {
                id,
                handler,
                context,
                priority,
            });

        trace!("Registered listener {:?} for '{}' (priority {})", id, event_type, priority);
        id
    }

    fn remove_where(&self, event_type: &str, predicate: impl Fn(&Listener) -> bool) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(event_type) else {
            return false;
        };
        let Some(position) = list.iter().position(|listener| predicate(listener)) else {
            return false;
        };

        list.remove(position);
        if list.is_empty() {
            listeners.remove(event_type);
        }
        true
    }

    fn is_registered(&self, event_type: &str, id: ListenerId) -> bool {
        self.listeners
            .borrow()
            .get(event_type)
            .is_some_and(|list| list.iter().any(|listener| listener.id == id))
    }
}

/// Owner-scoped registry of prioritised listeners.
///
/// `Emitter` is a cheap handle: clones share the same registry. The parent
/// link is weak, so a child never keeps its propagation target alive.
///
/// # Dispatch
///
/// Listeners for a type run from the highest priority to the lowest. Equal
/// priorities run in registration order. Dispatch works over a snapshot taken
/// when the emit starts: listeners added by a callback do not see the event
/// in flight, and listeners removed by a callback are skipped if they have
/// not run yet. Once a listener calls [`Event::prevent_default`] nothing else
/// sees the event, ancestors included.
#[derive(Clone)]
pub struct Emitter {
    inner: Rc<EmitterInner>,
}

impl Emitter {
    /// Creates an emitter with no context and no parent.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates an emitter whose events carry `context` as their target.
    pub fn with_context(context: ContextId) -> Self {
        Self::build(Some(context))
    }

    /// Creates a context-bound emitter that propagates to `parent`.
    pub fn child_of(parent: &Emitter, context: Option<ContextId>) -> Self {
        let emitter = Self::build(context);
        emitter.set_parent(Some(parent));
        emitter
    }

    fn build(context: Option<ContextId>) -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                context,
                parent: RefCell::new(Weak::new()),
                listeners: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Registers `handler` for one or more event types.
    ///
    /// The same handler may be registered several times; every registration is
    /// independent. An empty type name is rejected.
    pub fn on(
        &self,
        types: impl EventTypes,
        handler: &Handler,
        context: Option<ContextId>,
        priority: i32,
    ) -> Result<&Self, EventError> {
        let types = types.event_types();
        validate_types(&types)?;

        for event_type in types {
            self.inner
                .add_listener(event_type, handler.clone(), context, priority);
        }
        Ok(self)
    }

    /// Removes the first registration matching `(handler, context, priority)`
    /// for each type. Unmatched removals are silently ignored.
    pub fn off(
        &self,
        types: impl EventTypes,
        handler: &Handler,
        context: Option<ContextId>,
        priority: i32,
    ) -> &Self {
        for event_type in types.event_types() {
            let removed = self
                .inner
                .remove_where(event_type, |listener| listener.matches(handler, context, priority));
            if removed {
                trace!("Removed listener for '{}' (priority {})", event_type, priority);
            }
        }
        self
    }

    /// Registers `handler` to run at most once.
    ///
    /// The wrapper removes its own registration before calling `handler`, so
    /// an emit of the same type from inside the callback does not reach it
    /// again.
    pub fn once(
        &self,
        event_type: &str,
        handler: &Handler,
        context: Option<ContextId>,
        priority: i32,
    ) -> Result<&Self, EventError> {
        validate_types(&[event_type])?;

        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let wrapper = {
            let slot = slot.clone();
            let emitter = Rc::downgrade(&self.inner);
            let event_type = CompactString::new(event_type);
            let handler = handler.clone();
            Handler::new(move |event| {
                let Some(id) = slot.take() else {
                    return;
                };
                if let Some(emitter) = emitter.upgrade() {
                    emitter.remove_where(&event_type, |listener| listener.id == id);
                }
                handler.call(event);
            })
        };

        let id = self.inner.add_listener(event_type, wrapper, context, priority);
        slot.set(Some(id));
        Ok(self)
    }

    /// Builds an event targeted at this emitter's context and dispatches it.
    ///
    /// Returns the event so callers can inspect its flags afterwards.
    pub fn emit(&self, event_type: &str, data: EventData) -> Event {
        let event = Event::with_target(event_type, self.inner.context, data);
        self.emit_event(event_type, &event);
        event
    }

    /// Dispatches an existing event as-is, then bubbles it up the parent chain.
    pub fn emit_event(&self, event_type: &str, event: &Event) {
        if event.is_propagation_stopped() {
            return;
        }

        self.call_listeners(event_type, event);

        if event.is_propagation_stopped() {
            return;
        }
        if let Some(parent) = self.parent() {
            parent.emit_event(event_type, event);
        }
    }

    fn call_listeners(&self, event_type: &str, event: &Event) {
        let mut snapshot: SmallVec<[(ListenerId, i32, Handler); 8]> = match self
            .inner
            .listeners
            .borrow()
            .get(event_type)
        {
            Some(list) => list
                .iter()
                .map(|listener| (listener.id, listener.priority, listener.handler.clone()))
                .collect(),
            None => return,
        };

        // Stable: equal priorities keep registration order.
        snapshot.sort_by_key(|(_, priority, _)| std::cmp::Reverse(*priority));

        for (id, _, handler) in snapshot {
            if event.default_prevented() {
                trace!("'{}' default prevented, halting dispatch", event_type);
                break;
            }
            if !self.inner.is_registered(event_type, id) {
                continue;
            }
            handler.call(event);
        }
    }

    /// Reassigns the propagation target. Listeners are not copied.
    pub fn set_parent(&self, parent: Option<&Emitter>) {
        *self.inner.parent.borrow_mut() = match parent {
            Some(parent) => Rc::downgrade(&parent.inner),
            None => Weak::new(),
        };
    }

    /// Current propagation target, if it is still alive.
    pub fn parent(&self) -> Option<Emitter> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Emitter { inner })
    }

    pub fn context(&self) -> Option<ContextId> {
        self.inner.context
    }

    /// Starts a group of registrations on this emitter that can be revoked together.
    pub fn group(&self) -> EventGroup {
        EventGroup::new(self.clone())
    }

    pub fn has_listeners(&self, event_type: &str) -> bool {
        self.inner.listeners.borrow().contains_key(event_type)
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner
            .listeners
            .borrow()
            .get(event_type)
            .map_or(0, |list| list.len())
    }

    /// Types with at least one registration, sorted by name.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .inner
            .listeners
            .borrow()
            .keys()
            .map(|key| key.to_string())
            .collect();
        types.sort();
        types
    }

    /// Whether both handles share the same registry.
    pub fn ptr_eq(&self, other: &Emitter) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("context", &self.inner.context)
            .field("event_types", &self.event_types())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}

fn validate_types(types: &[&str]) -> Result<(), EventError> {
    if types.is_empty() {
        return Err(EventError::InvalidArgument("no event type given".to_string()));
    }
    if types.iter().any(|event_type| event_type.is_empty()) {
        return Err(EventError::InvalidArgument("event type must not be empty".to_string()));
    }
    Ok(())
}
