use thiserror::Error;

/// Errors that can occur while dispatching domain events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Event serialization failed: {0}")]
    Serialization(String),
    #[error("Event publish failed: {0}")]
    PublishFailed(String),
    #[error("Event subscription failed: {0}")]
    SubscribeFailed(String),
}

/// Result type for event operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
