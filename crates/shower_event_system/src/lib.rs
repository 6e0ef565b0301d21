//! # Shower Event System
//!
//! Owner-scoped event emitters used by every part of the Shower presentation
//! runtime: slides, the player, the container, options and the process-wide
//! context all talk through them.
//!
//! ## Key Features
//!
//! - **Prioritised listeners**: higher priority runs first, ties run in
//!   registration order
//! - **Cancellation**: `prevent_default` halts dispatch, `stop_propagation`
//!   stops bubbling
//! - **Propagation**: events bubble along a weak parent chain with the same
//!   event object, so flags set anywhere are visible everywhere
//! - **Groups**: batches of registrations revocable as a unit
//! - **Reentrancy**: dispatch works over a snapshot, callbacks may emit, add
//!   or remove listeners freely
//!
//! ## Usage
//!
//! ```rust
//! use shower_event_system::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let root = Emitter::new();
//! let slide = Emitter::child_of(&root, Some(ContextId::new()));
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! let handler = Handler::new(move |event| {
//!     log.borrow_mut().push(*event.get::<usize>("index").unwrap());
//! });
//!
//! root.on("activate", &handler, None, 0)?;
//! slide.emit("activate", EventData::new().with("index", 3usize));
//!
//! assert_eq!(*seen.borrow(), vec![3]);
//! # Ok::<(), EventError>(())
//! ```

pub mod context;
pub mod emitter;
pub mod error;
pub mod event;
pub mod group;

#[cfg(test)]
mod tests;

pub use context::ContextId;
pub use emitter::{Emitter, ListenerId};
pub use error::EventError;
pub use event::{Event, EventData, EventTypes, Handler};
pub use group::EventGroup;

/// Result type used throughout the event system
pub type Result<T> = std::result::Result<T, EventError>;
