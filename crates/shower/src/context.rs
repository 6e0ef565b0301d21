//! Process-wide registry of presentations

use crate::options::ShowerOptions;
use crate::shower::{ContainerRef, Shower, ShowerBuilder};
use crate::window::Window;
use crate::Result;
use serde_json::{Map, Value};
use shower_event_system::{ContextId, Emitter, EventData, Handler};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

struct ContextInner {
    events: Emitter,
    inited: RefCell<Vec<Shower>>,
    default_options: RefCell<Map<String, Value>>,
}

/// Shared context every presentation registers with.
///
/// Presentation emitters are children of the context emitter, so listeners
/// here see the events of every presentation. Emits `notify` and then `init`
/// with `shower: Shower` for each new presentation.
#[derive(Clone)]
pub struct ShowerContext {
    inner: Rc<ContextInner>,
}

impl ShowerContext {
    pub fn new() -> Self {
        Self::with_default_options(ShowerOptions::default().to_map())
    }

    /// Uses `defaults` as the bottom option layer of every presentation.
    pub fn with_default_options(defaults: Map<String, Value>) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                events: Emitter::with_context(ContextId::new()),
                inited: RefCell::new(Vec::new()),
                default_options: RefCell::new(defaults),
            }),
        }
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    pub fn default_options(&self) -> Map<String, Value> {
        self.inner.default_options.borrow().clone()
    }

    pub fn set_default_options(&self, defaults: Map<String, Value>) {
        *self.inner.default_options.borrow_mut() = defaults;
    }

    /// Calls `callback` for every initialised presentation, or once for the
    /// next one if there is none yet.
    ///
    /// # Returns
    ///
    /// Whether a presentation was already initialised.
    pub fn ready<F>(&self, callback: F) -> Result<bool>
    where
        F: Fn(&Shower) + 'static,
    {
        let inited = self.inited();
        if !inited.is_empty() {
            inited.iter().for_each(callback);
            return Ok(true);
        }

        let handler = Handler::new(move |event| {
            if let Some(shower) = event.get::<Shower>("shower") {
                callback(shower);
            }
        });
        self.inner.events.once("init", &handler, None, 0)?;
        Ok(false)
    }

    /// Builds a presentation in `window`.
    pub fn init(
        &self,
        window: &Window,
        container: Option<ContainerRef>,
        options: Map<String, Value>,
    ) -> Result<Shower> {
        Shower::new(self, window, container, options)
    }

    pub fn builder(&self, window: &Window) -> ShowerBuilder {
        ShowerBuilder::new(self, window)
    }

    /// Presentations initialised so far, oldest first.
    pub fn inited(&self) -> Vec<Shower> {
        self.inner.inited.borrow().clone()
    }

    pub(crate) fn notify(&self, shower: &Shower) {
        let data = EventData::new().with("shower", shower.clone());
        self.inner.events.emit("notify", data.clone());
        self.inner.inited.borrow_mut().push(shower.clone());
        self.inner.events.emit("init", data);
    }

    /// Destroys and forgets every presentation.
    pub fn teardown(&self) {
        let inited = std::mem::take(&mut *self.inner.inited.borrow_mut());
        for shower in &inited {
            shower.destroy();
        }
        info!("Context torn down ({} presentations)", inited.len());
    }
}

impl Default for ShowerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShowerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowerContext")
            .field("inited", &self.inner.inited.borrow().len())
            .finish()
    }
}
