//! Key/value stores and session-scoped persistence

use crate::error::ShowerError;
use crate::Result;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// Flat key/value data holder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    data: Map<String, Value>,
}

impl Store {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Builds a store from layers, later layers overriding earlier ones.
    pub fn layered<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        let mut data = Map::new();
        for layer in layers {
            data.extend(layer);
        }
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Value for `key`, or `default` when it is not set.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.data.get(key).cloned().unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Removes `key`. Fails when the key was never set.
    pub fn unset(&mut self, key: &str) -> Result<&mut Self> {
        if self.data.remove(key).is_none() {
            return Err(ShowerError::KeyNotFound(key.to_string()));
        }
        Ok(self)
    }

    /// Copy of everything in the store.
    pub fn all(&self) -> Map<String, Value> {
        self.data.clone()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Per-session string storage, the shape of the browser's `sessionStorage`.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// In-process session storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

/// A [`Store`] mirrored as one JSON object into a [`SessionStorage`] item.
///
/// Existing data under the key replaces the initial data entirely. Every
/// mutation writes the whole object back.
pub struct SessionStore {
    store: Store,
    key: String,
    storage: Rc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(key: &str, init: Map<String, Value>, storage: Rc<dyn SessionStorage>) -> Self {
        let data = match storage.get_item(key) {
            Some(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(data) => {
                    debug!("Restored session state '{}'", key);
                    data
                }
                Err(e) => {
                    warn!("Ignoring malformed session state '{}': {}", key, e);
                    init
                }
            },
            None => init,
        };

        Self {
            store: Store::new(data),
            key: key.to_string(),
            storage,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.store.get_or(key, default)
    }

    pub fn all(&self) -> Map<String, Value> {
        self.store.all()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.store.set(key, value);
        self.save()
    }

    pub fn unset(&mut self, key: &str) -> Result<()> {
        self.store.unset(key)?;
        self.save()
    }

    fn save(&self) -> Result<()> {
        let raw = serde_json::to_string(&Value::Object(self.store.all()))?;
        self.storage.set_item(&self.key, &raw);
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("key", &self.key)
            .field("store", &self.store)
            .finish()
    }
}
