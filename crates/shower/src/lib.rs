//! # Shower
//!
//! Slide presentation runtime. Turns the slide elements of a document into a
//! navigable presentation with keyboard control, fragment deep links and a
//! view mode that survives reloads.
//!
//! ## Architecture
//!
//! - [`Shower`] owns the slides and wires one [`Player`] (navigation), one
//!   [`Container`] (list/slide mode) and one [`Location`] (fragment, title,
//!   session state) together
//! - [`Slide`] and its [`Layout`] keep element classes in step with
//!   activation
//! - [`ShowerContext`] is the registry every presentation announces itself to
//! - [`dom`] and [`window`] model the parts of the browser the runtime needs
//!
//! Everything communicates through [`shower_event_system`] emitters.
//! Presentation emitters are children of the context emitter, player and
//! container emitters are children of their presentation.
//!
//! ## Usage
//!
//! ```rust
//! use shower::{Document, ShowerContext, Window};
//! use serde_json::Map;
//!
//! let document = Document::parse(
//!     "<title>Deck</title>\
//!      <div class=\"shower\">\
//!        <section class=\"slide\" id=\"intro\"><h2>Hello</h2></section>\
//!        <section class=\"slide\"><h2>World</h2></section>\
//!      </div>",
//! )?;
//! let window = Window::new(document);
//! let context = ShowerContext::new();
//!
//! let shower = context.init(&window, None, Map::new())?;
//! shower.player().go(1);
//!
//! assert_eq!(shower.player().current_slide_index(), Some(1));
//! assert_eq!(window.location_hash(), "#2");
//! # Ok::<(), shower::ShowerError>(())
//! ```

pub mod container;
pub mod context;
pub mod dom;
pub mod error;
pub mod init;
pub mod location;
pub mod options;
pub mod parser;
pub mod player;
pub mod shower;
pub mod slide;
pub mod store;
pub mod window;

pub use container::Container;
pub use context::ShowerContext;
pub use dom::{Document, Element, Node, Selector};
pub use error::ShowerError;
pub use init::auto_init;
pub use location::Location;
pub use options::{FieldHandler, Monitor, OptionChange, Options, ShowerOptions};
pub use parser::SlidesParser;
pub use player::{GoTarget, Player};
pub use shower::{ContainerRef, Shower, ShowerBuilder, SlideRef, WeakShower};
pub use slide::{Layout, Slide, WeakSlide};
pub use store::{MemoryStorage, SessionStorage, SessionStore, Store};
pub use window::{Key, KeyboardEvent, Modifiers, Window};

pub use shower_event_system::{ContextId, Emitter, Event, EventData, EventGroup, Handler};

/// Result type used throughout the runtime
pub type Result<T> = std::result::Result<T, ShowerError>;
