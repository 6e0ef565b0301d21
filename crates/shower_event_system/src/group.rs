//! Scoped batches of registrations

use crate::context::ContextId;
use crate::emitter::Emitter;
use crate::error::EventError;
use crate::event::{EventTypes, Handler};
use compact_str::CompactString;
use std::cell::RefCell;

struct Registration {
    event_type: CompactString,
    handler: Handler,
    context: Option<ContextId>,
    priority: i32,
}

/// Records registrations made through it so they can be revoked as a unit.
///
/// ```
/// use shower_event_system::{Emitter, Handler};
///
/// let emitter = Emitter::new();
/// let handler = Handler::new(|_| {});
/// let group = emitter.group();
/// group.on("activate", &handler, None, 0).unwrap()
///      .on("deactivate", &handler, None, 0).unwrap();
///
/// group.off_all();
/// assert!(!emitter.has_listeners("activate"));
/// ```
pub struct EventGroup {
    emitter: Emitter,
    registrations: RefCell<Vec<Registration>>,
}

impl EventGroup {
    pub fn new(emitter: Emitter) -> Self {
        Self {
            emitter,
            registrations: RefCell::new(Vec::new()),
        }
    }

    /// Registers through the underlying emitter and records the registration.
    pub fn on(
        &self,
        types: impl EventTypes,
        handler: &Handler,
        context: Option<ContextId>,
        priority: i32,
    ) -> Result<&Self, EventError> {
        let types = types.event_types();
        self.emitter.on(types.as_slice(), handler, context, priority)?;

        let mut registrations = self.registrations.borrow_mut();
        for event_type in types {
            registrations.push(Registration {
                event_type: CompactString::new(event_type),
                handler: handler.clone(),
                context,
                priority,
            });
        }
        Ok(self)
    }

    /// Removes exactly the registrations recorded by this group, in order.
    /// Calling it again is a no-op.
    pub fn off_all(&self) -> &Self {
        let registrations = std::mem::take(&mut *self.registrations.borrow_mut());
        for registration in registrations {
            self.emitter.off(
                registration.event_type.as_str(),
                &registration.handler,
                registration.context,
                registration.priority,
            );
        }
        self
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn len(&self) -> usize {
        self.registrations.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.borrow().is_empty()
    }
}

impl std::fmt::Debug for EventGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventGroup")
            .field("registrations", &self.len())
            .finish()
    }
}
