//! Presentation options and change monitoring
//!
//! [`Options`] is a flat map of JSON values with an emitter that announces
//! every change. [`Monitor`] sits on top of that emitter and calls per-field
//! handlers with the new value.

use crate::error::ShowerError;
use crate::store::Store;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shower_event_system::{ContextId, Emitter, EventData, EventGroup, Handler};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Built-in option values. Field names are the option keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowerOptions {
    pub container_selector: String,
    pub debug_mode: bool,
    pub debug_mode_classname: String,
    pub hotkeys: bool,
    pub sessionstore_key: String,
    pub slides_selector: String,
    pub mode_full_classname: String,
    pub mode_list_classname: String,
    pub slide_title_element_selector: String,
    pub slide_active_classname: String,
    pub slide_visited_classname: String,
    pub auto_init: bool,
}

impl Default for ShowerOptions {
    fn default() -> Self {
        Self {
            container_selector: ".shower".to_string(),
            debug_mode: false,
            debug_mode_classname: "debug".to_string(),
            hotkeys: true,
            sessionstore_key: "shower".to_string(),
            slides_selector: ".shower .slide".to_string(),
            mode_full_classname: "full".to_string(),
            mode_list_classname: "list".to_string(),
            slide_title_element_selector: "h2".to_string(),
            slide_active_classname: "active".to_string(),
            slide_visited_classname: "visited".to_string(),
            auto_init: true,
        }
    }
}

impl ShowerOptions {
    /// The options as a key/value map.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// One entry of a `set` event's `items` list.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionChange {
    pub name: String,
    pub value: Value,
}

struct OptionsInner {
    store: RefCell<Store>,
    events: Emitter,
}

/// Shared, observable option map.
///
/// Emits `set` with `items: Vec<OptionChange>` and `unset` with
/// `name: String`.
#[derive(Clone)]
pub struct Options {
    inner: Rc<OptionsInner>,
}

impl Options {
    pub fn new(init: Map<String, Value>) -> Self {
        Self::from_store(Store::new(init))
    }

    /// Builds options from layers, later layers overriding earlier ones.
    pub fn layered<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        Self::from_store(Store::layered(layers))
    }

    fn from_store(store: Store) -> Self {
        Self {
            inner: Rc::new(OptionsInner {
                store: RefCell::new(store),
                events: Emitter::new(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.store.borrow().get(name).cloned()
    }

    pub fn get_or(&self, name: &str, default: Value) -> Value {
        self.inner.store.borrow().get_or(name, default)
    }

    /// String value of `name`. Numbers and booleans are rendered as text.
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Truthiness of `name`.
    ///
    /// Values coming from data attributes are strings, so `"false"`, `"0"`
    /// and the empty string count as false.
    pub fn get_bool(&self, name: &str) -> bool {
        match self.get(name) {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => !matches!(s.trim(), "" | "false" | "0"),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.store.borrow().contains(name)
    }

    /// Sets one option and emits `set`.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> &Self {
        let value = value.into();
        self.inner.store.borrow_mut().set(name, value.clone());
        self.emit_set(vec![OptionChange {
            name: name.to_string(),
            value,
        }]);
        self
    }

    /// Sets several options and emits a single `set`. An empty map emits nothing.
    pub fn set_many(&self, options: Map<String, Value>) -> &Self {
        let mut changed = Vec::with_capacity(options.len());
        {
            let mut store = self.inner.store.borrow_mut();
            for (name, value) in options {
                store.set(&name, value.clone());
                changed.push(OptionChange { name, value });
            }
        }
        if !changed.is_empty() {
            self.emit_set(changed);
        }
        self
    }

    /// Removes an option and emits `unset`.
    pub fn unset(&self, name: &str) -> Result<&Self> {
        self.inner.store.borrow_mut().unset(name)?;
        self.inner
            .events
            .emit("unset", EventData::new().with("name", name.to_string()));
        Ok(self)
    }

    pub fn all(&self) -> Map<String, Value> {
        self.inner.store.borrow().all()
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    /// Starts watching individual fields of these options.
    pub fn monitor(&self) -> Result<Monitor> {
        Monitor::new(self)
    }

    fn emit_set(&self, items: Vec<OptionChange>) {
        debug!("Options changed: {:?}", items.iter().map(|c| &c.name).collect::<Vec<_>>());
        self.inner
            .events
            .emit("set", EventData::new().with("items", items));
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new(ShowerOptions::default().to_map())
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("values", &self.all())
            .finish()
    }
}

/// Callback for a watched field. Receives the field's new value, `None` once
/// it is unset.
#[derive(Clone)]
pub struct FieldHandler(Rc<dyn Fn(Option<&Value>)>);

impl FieldHandler {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Option<&Value>) + 'static,
    {
        Self(Rc::new(callback))
    }

    pub fn call(&self, value: Option<&Value>) {
        (self.0)(value)
    }
}

impl PartialEq for FieldHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for FieldHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

#[derive(Clone)]
struct FieldEntry {
    handler: FieldHandler,
    context: Option<ContextId>,
}

struct MonitorInner {
    options: Options,
    options_events: EventGroup,
    fields: RefCell<HashMap<String, Vec<FieldEntry>>>,
}

impl MonitorInner {
    fn on_change(&self, changed: &[String]) {
        for field in changed {
            let entries = match self.fields.borrow().get(field) {
                Some(entries) => entries.clone(),
                None => continue,
            };
            let value = self.options.get(field);
            for entry in entries {
                entry.handler.call(value.as_ref());
            }
        }
    }
}

/// Calls field handlers when watched options change.
#[derive(Clone)]
pub struct Monitor {
    inner: Rc<MonitorInner>,
}

impl Monitor {
    pub fn new(options: &Options) -> Result<Self> {
        let inner = Rc::new(MonitorInner {
            options: options.clone(),
            options_events: options.events().group(),
            fields: RefCell::new(HashMap::new()),
        });

        let weak: Weak<MonitorInner> = Rc::downgrade(&inner);
        let on_change = Handler::new(move |event| {
            let Some(monitor) = weak.upgrade() else {
                return;
            };
            let changed: Vec<String> = if event.event_type() == "unset" {
                event.get::<String>("name").cloned().into_iter().collect()
            } else {
                event
                    .get::<Vec<OptionChange>>("items")
                    .map(|items| items.iter().map(|item| item.name.clone()).collect())
                    .unwrap_or_default()
            };
            monitor.on_change(&changed);
        });
        inner
            .options_events
            .on(["set", "unset"], &on_change, None, 0)?;

        Ok(Self { inner })
    }

    /// Watches every field in `fields` with `handler`.
    pub fn add(&self, fields: &[&str], handler: &FieldHandler, context: Option<ContextId>) -> &Self {
        let mut map = self.inner.fields.borrow_mut();
        for field in fields {
            map.entry(field.to_string()).or_default().push(FieldEntry {
                handler: handler.clone(),
                context,
            });
        }
        self
    }

    /// Stops watching. Fails on a field with no handlers or an unknown
    /// handler, in which case nothing is removed.
    pub fn remove(
        &self,
        fields: &[&str],
        handler: &FieldHandler,
        context: Option<ContextId>,
    ) -> Result<&Self> {
        let matches = |entry: &FieldEntry| entry.handler == *handler && entry.context == context;
        let mut map = self.inner.fields.borrow_mut();

        if let Some(missing) = fields.iter().find(|field| {
            !map.get(**field)
                .is_some_and(|entries| entries.iter().any(matches))
        }) {
            return Err(ShowerError::HandlerNotFound(missing.to_string()));
        }

        for field in fields {
            let Some(entries) = map.get_mut(*field) else {
                continue;
            };
            if let Some(position) = entries.iter().position(matches) {
                entries.remove(position);
            }
            if entries.is_empty() {
                map.remove(*field);
            }
        }
        Ok(self)
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Detaches from the options and forgets every handler.
    pub fn destroy(&self) {
        self.inner.options_events.off_all();
        self.inner.fields.borrow_mut().clear();
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<String> = self.inner.fields.borrow().keys().cloned().collect();
        f.debug_struct("Monitor").field("fields", &fields).finish()
    }
}

/// Reads a string option, falling back to the built-in default when it is
/// missing or empty.
pub(crate) fn option_str(options: &Options, name: &str, default: &str) -> String {
    match options.get_str(name) {
        Some(value) if !value.is_empty() => value,
        Some(_) => {
            warn!("Option '{}' is empty, using '{}'", name, default);
            default.to_string()
        }
        None => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.get_str("container_selector").as_deref(), Some(".shower"));
        assert_eq!(options.get_str("slides_selector").as_deref(), Some(".shower .slide"));
        assert!(options.get_bool("hotkeys"));
        assert!(!options.get_bool("debug_mode"));
        assert_eq!(options.get("missing"), None);
        assert_eq!(options.get_or("missing", json!("hello")), json!("hello"));
    }

    #[test]
    fn test_string_booleans() {
        let options = Options::new(Map::new());
        options.set("hotkeys", "false");
        assert!(!options.get_bool("hotkeys"));
        options.set("hotkeys", "true");
        assert!(options.get_bool("hotkeys"));
        options.set("hotkeys", "0");
        assert!(!options.get_bool("hotkeys"));
    }

    #[test]
    fn test_set_emits_changed_items() {
        let options = Options::new(Map::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let handler = Handler::new(move |event| {
            let items = event.get::<Vec<OptionChange>>("items").unwrap();
            log.borrow_mut().extend(items.iter().map(|i| i.name.clone()));
        });
        options.events().on("set", &handler, None, 0).unwrap();

        let mut many = Map::new();
        many.insert("a".into(), json!(1));
        many.insert("b".into(), json!(2));
        options.set("debug_mode", true).set_many(many).set_many(Map::new());

        assert_eq!(*seen.borrow(), vec!["debug_mode", "a", "b"]);
    }

    #[test]
    fn test_unset_unknown_option_fails() {
        let options = Options::new(Map::new());
        assert!(matches!(options.unset("nope"), Err(ShowerError::KeyNotFound(_))));
    }

    #[test]
    fn test_monitor_calls_field_handlers() {
        let options = Options::default();
        let monitor = options.monitor().unwrap();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = calls.clone();
        let handler = FieldHandler::new(move |value| log.borrow_mut().push(value.cloned()));

        monitor.add(&["hotkeys"], &handler, None);
        options.set("hotkeys", false);
        options.set("debug_mode", true);
        options.unset("hotkeys").unwrap();

        assert_eq!(*calls.borrow(), vec![Some(json!(false)), None]);
    }

    #[test]
    fn test_monitor_remove_and_destroy() {
        let options = Options::default();
        let monitor = options.monitor().unwrap();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let handler = FieldHandler::new(move |_| counter.set(counter.get() + 1));
        let other = FieldHandler::new(|_| {});

        monitor.add(&["hotkeys", "debug_mode"], &handler, None);
        assert!(matches!(
            monitor.remove(&["hotkeys"], &other, None),
            Err(ShowerError::HandlerNotFound(_))
        ));
        monitor.remove(&["hotkeys"], &handler, None).unwrap();
        assert!(matches!(
            monitor.remove(&["hotkeys"], &handler, None),
            Err(ShowerError::HandlerNotFound(_))
        ));

        options.set("hotkeys", false);
        options.set("debug_mode", true);
        assert_eq!(count.get(), 1);

        monitor.destroy();
        options.set("debug_mode", false);
        assert_eq!(count.get(), 1);
        assert!(!options.events().has_listeners("set"));
    }

    #[test]
    fn test_failed_remove_keeps_every_field() {
        let options = Options::default();
        let monitor = options.monitor().unwrap();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let handler = FieldHandler::new(move |_| counter.set(counter.get() + 1));

        monitor.add(&["hotkeys"], &handler, None);
        assert!(matches!(
            monitor.remove(&["hotkeys", "debug_mode"], &handler, None),
            Err(ShowerError::HandlerNotFound(ref field)) if field == "debug_mode"
        ));

        options.set("hotkeys", false);
        assert_eq!(count.get(), 1);
    }
}
