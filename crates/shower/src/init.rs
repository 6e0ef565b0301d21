//! Automatic initialisation from the container's data attributes

use crate::context::ShowerContext;
use crate::error::ShowerError;
use crate::options::{Options, ShowerOptions};
use crate::shower::Shower;
use crate::window::Window;
use crate::Result;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Data attributes read from the container, as `data-<name>`.
pub const DATA_ATTRIBUTE_OPTIONS: &[&str] = &["debug-mode", "slides-selector", "hotkeys"];

/// Starts a presentation on the element matched by `container_selector`.
///
/// # Arguments
///
/// * `context` - Registry to initialise into
/// * `window` - Window holding the document
/// * `options` - Explicit options. When given, data attributes are ignored.
///
/// # Returns
///
/// `None` when both `data-auto-init="false"` and the `auto_init` option
/// turn initialisation off.
pub fn auto_init(
    context: &ShowerContext,
    window: &Window,
    options: Option<Map<String, Value>>,
) -> Result<Option<Shower>> {
    let has_options = options.is_some();
    let mut merged = context.default_options();
    merged.extend(options.unwrap_or_default());

    let view = Options::new(merged.clone());
    let selector = view
        .get_str("container_selector")
        .unwrap_or_else(|| ShowerOptions::default().container_selector);
    let element = window
        .document()
        .query_selector(&selector)?
        .ok_or_else(|| ShowerError::ContainerNotFound(selector.clone()))?;

    let auto_init = if view.contains("auto_init") {
        view.get_bool("auto_init")
    } else {
        true
    };
    if element.data("auto-init").as_deref() == Some("false") && !auto_init {
        info!("Auto init disabled for '{}'", selector);
        return Ok(None);
    }

    if !has_options {
        for name in DATA_ATTRIBUTE_OPTIONS {
            if let Some(value) = element.data(name) {
                let key = name.replace('-', "_");
                debug!("Option '{}' = '{}' from data attribute", key, value);
                merged.insert(key, Value::String(value));
            }
        }
    }

    context
        .init(window, Some(element.into()), merged)
        .map(Some)
}
