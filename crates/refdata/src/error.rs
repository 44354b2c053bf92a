use thiserror::Error;

use refdata_core::aggregate::LifecycleError;
use refdata_core::cache::CacheError;
use refdata_core::events::DispatchError;
use refdata_core::storage::RepositoryError;
use refdata_core::{lifecycle_error_to_status_code, repository_error_to_status_code};

/// Errors returned by the aggregate services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// HTTP status code a transport adapter should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Lifecycle(e) => lifecycle_error_to_status_code(e),
            ServiceError::Repository(e) => repository_error_to_status_code(e),
        }
    }

    /// Returns the lifecycle error, if this is one.
    pub fn as_lifecycle(&self) -> Option<&LifecycleError> {
        match self {
            ServiceError::Lifecycle(e) => Some(e),
            ServiceError::Repository(_) => None,
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors raised while connecting the cache and event backends.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Cache backend unavailable: {0}")]
    Cache(#[from] CacheError),
    #[error("Event backend unavailable: {0}")]
    Events(#[from] DispatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_transparent() {
        let error: ServiceError = LifecycleError::NotFound {
            entity_type: "Bank",
            id: "x".to_string(),
        }
        .into();
        assert_eq!(error.to_string(), "Bank not found: x");
    }

    #[test]
    fn test_status_codes() {
        let conflict: ServiceError = LifecycleError::AlreadyExists {
            entity_type: "Bank",
            field: "code",
            value: "B1".to_string(),
        }
        .into();
        let cancelled: ServiceError = RepositoryError::Cancelled.into();
        assert_eq!(conflict.status_code(), 409);
        assert_eq!(cancelled.status_code(), 499);
        assert!(conflict.as_lifecycle().is_some());
        assert!(cancelled.as_lifecycle().is_none());
    }

    #[test]
    fn test_startup_error_display() {
        let error: StartupError = CacheError::ConnectionFailed("refused".to_string()).into();
        assert!(error.to_string().starts_with("Cache backend unavailable: "));
    }
}
