//! Error types for the presentation runtime

use shower_event_system::EventError;

/// Main error type for the runtime
#[derive(Debug, thiserror::Error)]
pub enum ShowerError {
    /// The configured container element is absent from the document
    #[error("Shower element with selector {0} not found")]
    ContainerNotFound(String),

    /// A slide reference or index is not part of the presentation
    #[error("Slide not found")]
    SlideNotFound,

    /// Unsetting a key that was never set
    #[error("{0} not found")]
    KeyNotFound(String),

    /// Removing a field handler that was never added
    #[error("Handler for {0} field not found")]
    HandlerNotFound(String),

    /// A CSS selector the query engine cannot parse
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Markup that cannot be turned into elements
    #[error("Markup error at byte {position}: {reason}")]
    Markup { position: usize, reason: String },

    /// Event system error
    #[error("Event system error: {0}")]
    Event(#[from] EventError),

    /// Session state could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ShowerError {
    fn from(err: serde_json::Error) -> Self {
        ShowerError::Serialization(err.to_string())
    }
}
