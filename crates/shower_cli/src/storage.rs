//! Session storage backed by a JSON file, so the view mode outlives the
//! process.

use shower::SessionStorage;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// [`SessionStorage`] kept as one JSON object of string items on disk.
///
/// The file is read once when opened and rewritten on every change. Write
/// failures are logged; the in-memory items stay authoritative.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RefCell<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens `path`. A missing or unreadable file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items: BTreeMap<String, String> = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!("Ignoring malformed session file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Cannot read session file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        debug!("Session file {} holds {} items", path.display(), items.len());
        Self {
            path,
            items: RefCell::new(items),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        let result = serde_json::to_string_pretty(&*self.items.borrow())
            .map_err(std::io::Error::from)
            .and_then(|json| std::fs::write(&self.path, json));
        if let Err(e) = result {
            warn!("Cannot write session file {}: {}", self.path.display(), e);
        }
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove_item(&self, key: &str) {
        if self.items.borrow_mut().remove(key).is_some() {
            self.flush();
        }
    }
}
