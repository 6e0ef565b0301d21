//! Error types for the event system

/// Errors that can occur while registering or dispatching events
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// A registration was attempted with an argument the emitter cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
