use thiserror::Error;

use super::DependentSummary;

/// Errors raised by the aggregate lifecycle guards.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} with {field} '{value}' already exists")]
    AlreadyExists {
        entity_type: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{entity_type} {id} has live dependents: {}", describe_blockers(.blockers))]
    DependencyConflict {
        entity_type: &'static str,
        id: String,
        blockers: Vec<DependentSummary>,
    },
    #[error("Invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },
}

fn describe_blockers(blockers: &[DependentSummary]) -> String {
    blockers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
