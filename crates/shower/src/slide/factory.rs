//! Layouts built from markup instead of an existing element

use super::layout::Layout;
use crate::dom::Element;
use crate::Result;
use serde_json::{Map, Value};

/// Content type used when none is given.
pub const DEFAULT_CONTENT_TYPE: &str = "slide";

/// Creates a detached `<section>` carrying `content_type` as its class and
/// `content` as its markup, wrapped in a [`Layout`].
pub fn create_layout(
    content: &str,
    content_type: Option<&str>,
    options: Map<String, Value>,
) -> Result<Layout> {
    let element = Element::new("section");
    element.set_inner_html(content)?;
    element.add_class(content_type.unwrap_or(DEFAULT_CONTENT_TYPE));
    Ok(Layout::new(element, options))
}
