//! Turns container markup into slides

use crate::dom::Element;
use crate::options::{Options, ShowerOptions};
use crate::slide::Slide;
use crate::Result;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::debug;

/// Custom slide discovery. Receives the container element, the slides
/// selector and the presentation options.
pub type SlidesParser = Rc<dyn Fn(&Element, &str, &Options) -> Result<Vec<Slide>>>;

/// Layout options for slides derived from the presentation's `slide_*` options.
pub fn slide_options(options: &Options) -> Map<String, Value> {
    let defaults = ShowerOptions::default();
    let mut map = Map::new();
    for (slide_key, layout_key, default) in [
        (
            "slide_title_element_selector",
            "title_element_selector",
            defaults.slide_title_element_selector,
        ),
        (
            "slide_active_classname",
            "active_classname",
            defaults.slide_active_classname,
        ),
        (
            "slide_visited_classname",
            "visited_classname",
            defaults.slide_visited_classname,
        ),
    ] {
        let value = options.get(slide_key).unwrap_or(Value::String(default));
        map.insert(layout_key.to_string(), value);
    }
    map
}

/// Default parser: every element under `container` matching `selector`
/// becomes a slide, in document order. Elements without an id get their
/// one-based position as id.
pub fn parse(container: &Element, selector: &str, options: &Options) -> Result<Vec<Slide>> {
    let elements = container.query_selector_all(selector)?;
    let slide_options = slide_options(options);

    let slides = elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            if element.id().is_none() {
                element.set_id(&(index + 1).to_string());
            }
            Slide::new(element, slide_options.clone())
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} slides with '{}'", slides.len(), selector);
    Ok(slides)
}

/// The default parser as a [`SlidesParser`].
pub fn default_parser() -> SlidesParser {
    Rc::new(parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use serde_json::json;

    #[test]
    fn test_parse_assigns_missing_ids() {
        let document = Document::parse(
            "<div class=\"shower\">\
               <section class=\"slide\" id=\"cover\"></section>\
               <section class=\"slide\"></section>\
               <div class=\"note\"></div>\
               <section class=\"slide\"></section>\
             </div>",
        )
        .unwrap();
        let container = document.query_selector(".shower").unwrap().unwrap();

        let slides = parse(&container, ".shower .slide", &Options::default()).unwrap();
        let ids: Vec<_> = slides.iter().map(|s| s.id().unwrap()).collect();
        assert_eq!(ids, vec!["cover", "2", "3"]);
    }

    #[test]
    fn test_slide_options_follow_presentation() {
        let options = Options::default();
        options.set("slide_active_classname", json!("on"));
        let map = slide_options(&options);
        assert_eq!(map.get("active_classname"), Some(&json!("on")));
        assert_eq!(map.get("visited_classname"), Some(&json!("visited")));
    }

    #[test]
    fn test_invalid_selector() {
        let container = Element::new("div");
        assert!(parse(&container, ".slide:first", &Options::default()).is_err());
    }
}
