//! Pure functions for mapping core errors to HTTP status codes.
//!
//! Transport adapters use these to translate errors without the core
//! depending on any HTTP crate.

use crate::aggregate::LifecycleError;
use crate::storage::RepositoryError;

/// Status code for requests abandoned by the client (nginx convention).
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `AlreadyExists` -> 409 (Conflict)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - `QueryFailed` / `Serialization` -> 500 (Internal Server Error)
/// - `InvalidData` -> 400 (Bad Request)
/// - `Cancelled` -> 499 (Client Closed Request)
///
/// # Examples
///
/// ```
/// use refdata_core::repository_error_to_status_code;
/// use refdata_core::storage::RepositoryError;
///
/// assert_eq!(repository_error_to_status_code(&RepositoryError::Cancelled), 499);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_) => 500,
        RepositoryError::Serialization(_) => 500,
        RepositoryError::InvalidData(_) => 400,
        RepositoryError::Cancelled => CLIENT_CLOSED_REQUEST,
    }
}

/// Maps a [`LifecycleError`] to an HTTP status code.
///
/// Both duplicate natural keys and blocked disables are conflicts.
pub fn lifecycle_error_to_status_code(error: &LifecycleError) -> u16 {
    match error {
        LifecycleError::NotFound { .. } => 404,
        LifecycleError::AlreadyExists { .. } => 409,
        LifecycleError::DependencyConflict { .. } => 409,
        LifecycleError::Validation { .. } => 400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let error = RepositoryError::NotFound {
            entity_type: "Country",
            id: "abc".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&error), 404);
    }

    #[test]
    fn test_repository_connection_failed_maps_to_503() {
        let error = RepositoryError::ConnectionFailed("pool exhausted".to_string());
        assert_eq!(repository_error_to_status_code(&error), 503);
    }

    #[test]
    fn test_repository_invalid_data_maps_to_400() {
        let error = RepositoryError::InvalidData("unknown include".to_string());
        assert_eq!(repository_error_to_status_code(&error), 400);
    }

    #[test]
    fn test_repository_cancelled_maps_to_499() {
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::Cancelled),
            499
        );
    }

    #[test]
    fn test_lifecycle_errors() {
        let not_found = LifecycleError::NotFound {
            entity_type: "Bank",
            id: "x".to_string(),
        };
        let exists = LifecycleError::AlreadyExists {
            entity_type: "Bank",
            field: "code",
            value: "B1".to_string(),
        };
        let conflict = LifecycleError::DependencyConflict {
            entity_type: "Bank",
            id: "x".to_string(),
            blockers: Vec::new(),
        };
        let invalid = LifecycleError::Validation {
            field: "code",
            reason: "must not be empty".to_string(),
        };
        assert_eq!(lifecycle_error_to_status_code(&not_found), 404);
        assert_eq!(lifecycle_error_to_status_code(&exists), 409);
        assert_eq!(lifecycle_error_to_status_code(&conflict), 409);
        assert_eq!(lifecycle_error_to_status_code(&invalid), 400);
    }
}
