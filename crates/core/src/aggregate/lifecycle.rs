//! Pure lifecycle transitions.
//!
//! Each transition takes the current state (and whatever the caller
//! gathered from storage, such as a clashing entity or blocking dependents)
//! and returns a [`Mutation`]. Persisting the state and dispatching the
//! events is left to the caller.

use crate::events::{EventKind, Mutation};

use super::{Aggregate, DependentSummary, LifecycleError};

/// A state awaiting the natural-key uniqueness check.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal<A> {
    kind: EventKind,
    state: A,
}

impl<A: Aggregate> Proposal<A> {
    pub fn natural_key(&self) -> &str {
        self.state.natural_key()
    }

    pub fn state(&self) -> &A {
        &self.state
    }

    /// Accepts the proposal unless `clash` is another entity holding the same natural key.
    pub fn resolve(self, clash: Option<&A>) -> Result<Mutation<A>, LifecycleError> {
        if let Some(existing) = clash {
            if existing.id() != self.state.id() {
                return Err(LifecycleError::AlreadyExists {
                    entity_type: A::ENTITY,
                    field: A::NATURAL_KEY,
                    value: self.state.natural_key().to_string(),
                });
            }
        }
        Ok(Mutation::single(self.state, self.kind))
    }
}

/// Builds a new enabled aggregate.
pub fn create<A: Aggregate>(id: A::Id, draft: A::Draft) -> Result<Proposal<A>, LifecycleError> {
    A::validate_draft(&draft)?;
    let mut state = A::from_draft(id, draft);
    state.status_mut().set_enabled(true);
    Ok(Proposal {
        kind: EventKind::Created,
        state,
    })
}

/// Replaces every mutable field of `current`.
pub fn update<A: Aggregate>(current: A, draft: A::Draft) -> Result<Proposal<A>, LifecycleError> {
    A::validate_draft(&draft)?;
    let mut state = current;
    state.replace(draft);
    Ok(Proposal {
        kind: EventKind::Updated,
        state,
    })
}

/// Applies the fields present in `patch`.
pub fn patch<A: Aggregate>(current: A, patch: A::Patch) -> Result<Proposal<A>, LifecycleError> {
    let mut state = current;
    state.apply_patch(patch)?;
    Ok(Proposal {
        kind: EventKind::Patched,
        state,
    })
}

/// Disables `current` unless any link still has live dependents.
///
/// Disabling an already disabled aggregate is a no-op without events.
pub fn disable<A: Aggregate>(
    current: A,
    blockers: Vec<DependentSummary>,
) -> Result<Mutation<A>, LifecycleError> {
    if !blockers.is_empty() {
        return Err(LifecycleError::DependencyConflict {
            entity_type: A::ENTITY,
            id: current.id().to_string(),
            blockers,
        });
    }
    if !current.is_enabled() {
        return Ok(Mutation::unchanged(current));
    }
    let mut state = current;
    state.status_mut().set_enabled(false);
    Ok(Mutation::single(state, EventKind::Disabled))
}

/// Enables `current`. Activating an enabled aggregate is a no-op.
pub fn activate<A: Aggregate>(current: A) -> Mutation<A> {
    if current.is_enabled() {
        return Mutation::unchanged(current);
    }
    let mut state = current;
    state.status_mut().set_enabled(true);
    Mutation::single(state, EventKind::Activated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geography::{Country, CountryDraft, CountryPatch};
    use crate::id::CountryId;

    fn draft(code: &str, name: &str) -> CountryDraft {
        CountryDraft {
            code: code.to_string(),
            name: name.to_string(),
            iso3: None,
            monetary_zone_id: None,
        }
    }

    fn morocco() -> Country {
        create::<Country>(CountryId::new(), draft("MA", "Morocco"))
            .unwrap()
            .resolve(None)
            .unwrap()
            .aggregate
    }

    fn blocker() -> DependentSummary {
        DependentSummary {
            link: "regions",
            entity: "Region",
            total: 1,
            keys: vec!["60".to_string()],
        }
    }

    #[test]
    fn test_create_emits_created_and_is_enabled() {
        let mutation = create::<Country>(CountryId::new(), draft("MA", "Morocco"))
            .unwrap()
            .resolve(None)
            .unwrap();
        assert!(mutation.aggregate.is_enabled());
        assert_eq!(mutation.events.len(), 1);
        assert_eq!(mutation.events[0].kind, EventKind::Created);
        assert_eq!(mutation.events[0].state, mutation.aggregate);
    }

    #[test]
    fn test_create_clash_is_already_exists() {
        let existing = morocco();
        let result = create::<Country>(CountryId::new(), draft("MA", "Maroc"))
            .unwrap()
            .resolve(Some(&existing));
        assert_eq!(
            result,
            Err(LifecycleError::AlreadyExists {
                entity_type: "Country",
                field: "code",
                value: "MA".to_string(),
            })
        );
    }

    #[test]
    fn test_update_excludes_self_from_clash() {
        let current = morocco();
        let snapshot = current.clone();
        let mutation = update(current, draft("MA", "Kingdom of Morocco"))
            .unwrap()
            .resolve(Some(&snapshot))
            .unwrap();
        assert_eq!(mutation.aggregate.name, "Kingdom of Morocco");
        assert_eq!(mutation.aggregate.id, snapshot.id);
        assert_eq!(mutation.events[0].kind, EventKind::Updated);
    }

    #[test]
    fn test_update_keeps_status() {
        let disabled = disable(morocco(), Vec::new()).unwrap().aggregate;
        let mutation = update(disabled, draft("MA", "Morocco"))
            .unwrap()
            .resolve(None)
            .unwrap();
        assert!(!mutation.aggregate.is_enabled());
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let current = morocco();
        let mutation = patch(current.clone(), CountryPatch::default())
            .unwrap()
            .resolve(None)
            .unwrap();
        assert_eq!(mutation.aggregate, current);
        assert_eq!(mutation.events[0].kind, EventKind::Patched);
    }

    #[test]
    fn test_patch_field_is_carried_by_event() {
        let patch_request = CountryPatch {
            name: Some("Royaume du Maroc".to_string()),
            ..Default::default()
        };
        let mutation = patch(morocco(), patch_request).unwrap().resolve(None).unwrap();
        assert_eq!(mutation.aggregate.name, "Royaume du Maroc");
        assert_eq!(mutation.events[0].state.name, "Royaume du Maroc");
    }

    #[test]
    fn test_patch_blank_required_field_is_validation() {
        let patch_request = CountryPatch {
            code: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            patch(morocco(), patch_request),
            Err(LifecycleError::Validation { field: "code", .. })
        ));
    }

    #[test]
    fn test_disable_without_dependents() {
        let mutation = disable(morocco(), Vec::new()).unwrap();
        assert!(!mutation.aggregate.is_enabled());
        assert_eq!(mutation.events[0].kind, EventKind::Disabled);
    }

    #[test]
    fn test_disable_with_dependents_never_flips() {
        let current = morocco();
        let result = disable(current.clone(), vec![blocker()]);
        match result {
            Err(LifecycleError::DependencyConflict { blockers, .. }) => {
                assert_eq!(blockers[0].keys, vec!["60".to_string()]);
            }
            other => panic!("expected DependencyConflict, got {other:?}"),
        }
        assert!(current.is_enabled());
    }

    #[test]
    fn test_disable_twice_is_idempotent() {
        let first = disable(morocco(), Vec::new()).unwrap();
        let second = disable(first.aggregate.clone(), Vec::new()).unwrap();
        assert!(!second.aggregate.is_enabled());
        assert!(!second.is_changed());
        assert_eq!(second.aggregate, first.aggregate);
    }

    #[test]
    fn test_dependency_check_runs_before_idempotence() {
        let disabled = disable(morocco(), Vec::new()).unwrap().aggregate;
        assert!(matches!(
            disable(disabled, vec![blocker()]),
            Err(LifecycleError::DependencyConflict { .. })
        ));
    }

    #[test]
    fn test_activate_round_trip() {
        let disabled = disable(morocco(), Vec::new()).unwrap().aggregate;
        let mutation = activate(disabled);
        assert!(mutation.aggregate.is_enabled());
        assert_eq!(mutation.events[0].kind, EventKind::Activated);
    }

    #[test]
    fn test_activate_enabled_is_noop() {
        let mutation = activate(morocco());
        assert!(!mutation.is_changed());
    }
}
