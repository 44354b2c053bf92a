use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use refdata_core::aggregate::lifecycle::{self, Proposal};
use refdata_core::aggregate::{natural_key_predicate, Aggregate, LifecycleError};
use refdata_core::events::{EventDispatcher, Mutation};
use refdata_core::id::EntityId;
use refdata_core::query::{Criteria, PagedResult, Predicate};
use refdata_core::storage::Repository;

use crate::error::Result;

use super::{DependencyGuard, Outbox};

#[derive(Debug, Clone, Copy)]
enum Write {
    Add,
    Update,
}

/// Query and command handler for one aggregate type.
///
/// Commands are serialized per service so the uniqueness check and the
/// commit see the same state within one process. Across processes the
/// store's commit-time constraint is authoritative.
pub struct AggregateService<A: Aggregate> {
    repository: Arc<dyn Repository<A>>,
    guards: Vec<Arc<dyn DependencyGuard<A>>>,
    dispatcher: Arc<dyn EventDispatcher>,
    commands: Mutex<()>,
}

impl<A: Aggregate> AggregateService<A> {
    pub fn new(repository: Arc<dyn Repository<A>>, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        Self {
            repository,
            guards: Vec::new(),
            dispatcher,
            commands: Mutex::new(()),
        }
    }

    /// Adds a guard consulted before every disable.
    pub fn with_guard(mut self, guard: Arc<dyn DependencyGuard<A>>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Fetches one page matching `criteria`.
    pub async fn fetch_page<C>(
        &self,
        criteria: &C,
        includes: &[&str],
        cancel: &CancellationToken,
    ) -> Result<PagedResult<A>>
    where
        C: Criteria<Entity = A>,
    {
        let predicate = criteria.predicate();
        let page = criteria.page();

        tracing::debug!(
            entity = A::ENTITY,
            predicate = %predicate,
            page = page.number(),
            size = page.size(),
            "Fetching page"
        );

        Ok(self
            .repository
            .fetch_page(&predicate, page, includes, cancel)
            .await?)
    }

    pub async fn get_by_id(&self, id: A::Id, cancel: &CancellationToken) -> Result<Option<A>> {
        Ok(self.repository.get_by_id(id, cancel).await?)
    }

    /// Like [`get_by_id`](Self::get_by_id), but a missing entity is `NotFound`.
    pub async fn find(&self, id: A::Id, cancel: &CancellationToken) -> Result<A> {
        self.repository
            .get_by_id(id, cancel)
            .await?
            .ok_or_else(|| {
                LifecycleError::NotFound {
                    entity_type: A::ENTITY,
                    id: id.to_string(),
                }
                .into()
            })
    }

    pub async fn get_one(
        &self,
        predicate: &Predicate<A>,
        cancel: &CancellationToken,
    ) -> Result<Option<A>> {
        Ok(self.repository.get_one(predicate, cancel).await?)
    }

    /// Looks an entity up by its natural key, whatever its status.
    pub async fn find_by_natural_key(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<A>> {
        self.get_one(&natural_key_predicate::<A>(key), cancel).await
    }

    /// Creates a new enabled entity.
    pub async fn create(&self, draft: A::Draft, cancel: &CancellationToken) -> Result<Mutation<A>> {
        let _serial = self.commands.lock().await;

        let proposal = lifecycle::create::<A>(A::Id::generate(), draft)?;
        let mutation = self.resolve_unique(proposal, cancel).await?;

        self.commit(&mutation, Write::Add, cancel).await?;
        Ok(mutation)
    }

    /// Replaces every mutable field. Status is kept.
    pub async fn update(
        &self,
        id: A::Id,
        draft: A::Draft,
        cancel: &CancellationToken,
    ) -> Result<Mutation<A>> {
        let _serial = self.commands.lock().await;

        let current = self.find(id, cancel).await?;
        let mutation = self
            .resolve_unique(lifecycle::update(current, draft)?, cancel)
            .await?;

        self.commit(&mutation, Write::Update, cancel).await?;
        Ok(mutation)
    }

    /// Applies the fields present in `patch`.
    pub async fn patch(
        &self,
        id: A::Id,
        patch: A::Patch,
        cancel: &CancellationToken,
    ) -> Result<Mutation<A>> {
        let _serial = self.commands.lock().await;

        let current = self.find(id, cancel).await?;
        let proposal = lifecycle::patch(current, patch)?;
        let mutation = self.resolve_unique(proposal, cancel).await?;

        self.commit(&mutation, Write::Update, cancel).await?;
        Ok(mutation)
    }

    /// Soft-deletes an entity that no live dependent references.
    pub async fn disable(&self, id: A::Id, cancel: &CancellationToken) -> Result<Mutation<A>> {
        let _serial = self.commands.lock().await;

        let current = self.find(id, cancel).await?;

        let mut blockers = Vec::new();
        for guard in &self.guards {
            if let Some(summary) = guard.live_dependents(&current, cancel).await? {
                blockers.push(summary);
            }
        }

        if !blockers.is_empty() {
            tracing::debug!(
                entity = A::ENTITY,
                id = %id,
                links = blockers.len(),
                "Disable blocked by live dependents"
            );
        }

        let mutation = lifecycle::disable(current, blockers)?;
        self.commit(&mutation, Write::Update, cancel).await?;
        Ok(mutation)
    }

    /// Re-enables a disabled entity.
    pub async fn activate(&self, id: A::Id, cancel: &CancellationToken) -> Result<Mutation<A>> {
        let _serial = self.commands.lock().await;

        let current = self.find(id, cancel).await?;
        let mutation = lifecycle::activate(current);

        self.commit(&mutation, Write::Update, cancel).await?;
        Ok(mutation)
    }

    async fn resolve_unique(
        &self,
        proposal: Proposal<A>,
        cancel: &CancellationToken,
    ) -> Result<Mutation<A>> {
        let predicate = natural_key_predicate::<A>(proposal.natural_key());
        let clash = self.repository.get_one(&predicate, cancel).await?;
        Ok(proposal.resolve(clash.as_ref())?)
    }

    async fn commit(
        &self,
        mutation: &Mutation<A>,
        write: Write,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let id = mutation.aggregate.id();

        if !mutation.is_changed() {
            tracing::debug!(entity = A::ENTITY, id = %id, "No change, nothing to commit");
            return Ok(());
        }

        let mut outbox = Outbox::new();
        outbox.record(&mutation.events);

        match write {
            Write::Add => self.repository.add(&mutation.aggregate).await?,
            Write::Update => self.repository.update(&mutation.aggregate).await?,
        }
        self.repository.save_changes(cancel).await?;

        tracing::debug!(
            entity = A::ENTITY,
            id = %id,
            events = outbox.len(),
            "Committed"
        );

        outbox.flush(self.dispatcher.as_ref()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    use refdata_core::events::{DispatchError, EventEnvelope, EventKind, Result as DispatchResult};
    use refdata_core::geography::{
        Country, CountryCriteria, CountryDraft, CountryPatch, Region, RegionDraft,
    };
    use refdata_core::id::CountryId;
    use refdata_core::storage::RepositoryError;

    use crate::error::ServiceError;
    use crate::service::ChildGuard;
    use crate::storage::InMemoryRepository;

    #[derive(Default)]
    struct Recording {
        seen: StdMutex<Vec<EventEnvelope>>,
    }

    impl Recording {
        fn kinds(&self) -> Vec<EventKind> {
            self.seen.lock().unwrap().iter().map(|e| e.kind).collect()
        }
    }

    #[async_trait]
    impl EventDispatcher for Recording {
        async fn dispatch(&self, events: &[EventEnvelope]) -> DispatchResult<()> {
            self.seen.lock().unwrap().extend_from_slice(events);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventDispatcher for Failing {
        async fn dispatch(&self, _events: &[EventEnvelope]) -> DispatchResult<()> {
            Err(DispatchError::PublishFailed("broker down".to_string()))
        }
    }

    struct Fixture {
        countries: AggregateService<Country>,
        regions: AggregateService<Region>,
        events: Arc<Recording>,
    }

    fn fixture(preview_limit: u32) -> Fixture {
        let events = Arc::new(Recording::default());
        let region_store = Arc::new(InMemoryRepository::<Region>::new());
        let country_store = Arc::new(InMemoryRepository::<Country>::new());

        let guard = ChildGuard::new(region_store.clone(), Country::REGIONS, preview_limit);
        let countries = AggregateService::<Country>::new(country_store, events.clone())
            .with_guard(Arc::new(guard));
        let regions = AggregateService::<Region>::new(region_store, events.clone());

        Fixture {
            countries,
            regions,
            events,
        }
    }

    fn country(code: &str, name: &str) -> CountryDraft {
        CountryDraft {
            code: code.to_string(),
            name: name.to_string(),
            iso3: None,
            monetary_zone_id: None,
        }
    }

    fn region(country_id: CountryId, code: &str) -> RegionDraft {
        RegionDraft {
            code: code.to_string(),
            name: format!("Region {code}"),
            country_id,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_roundtrip() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        let created = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap();
        let fetched = f
            .countries
            .get_by_id(created.aggregate.id, &cancel)
            .await
            .unwrap();

        assert_eq!(fetched, Some(created.aggregate.clone()));
        assert!(created.aggregate.is_enabled());
        assert_eq!(f.events.kinds(), vec![EventKind::Created]);
    }

    #[tokio::test]
    async fn test_create_duplicate_is_already_exists() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        f.countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap();
        let result = f.countries.create(country("MA", "Maroc"), &cancel).await;

        assert_eq!(
            result.unwrap_err(),
            ServiceError::Lifecycle(LifecycleError::AlreadyExists {
                entity_type: "Country",
                field: "code",
                value: "MA".to_string(),
            })
        );
        assert_eq!(f.events.kinds(), vec![EventKind::Created]);
    }

    #[tokio::test]
    async fn test_duplicate_check_includes_disabled_entities() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        let created = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap();
        f.countries
            .disable(created.aggregate.id, &cancel)
            .await
            .unwrap();

        let result = f.countries.create(country("MA", "Maroc"), &cancel).await;
        assert!(matches!(
            result,
            Err(ServiceError::Lifecycle(LifecycleError::AlreadyExists { .. }))
        ));
    }

    #[tokio::test]
    async fn test_update_to_taken_key_fails() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        f.countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap();
        let senegal = f
            .countries
            .create(country("SN", "Senegal"), &cancel)
            .await
            .unwrap();

        let result = f
            .countries
            .update(senegal.aggregate.id, country("MA", "Senegal"), &cancel)
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::Lifecycle(LifecycleError::AlreadyExists { .. }))
        ));

        let renamed = f
            .countries
            .update(senegal.aggregate.id, country("SN", "Republic of Senegal"), &cancel)
            .await
            .unwrap();
        assert_eq!(renamed.aggregate.name, "Republic of Senegal");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let f = fixture(10);
        let cancel = CancellationToken::new();
        let id = CountryId::new();

        let result = f.countries.update(id, country("MA", "Morocco"), &cancel).await;
        assert_eq!(
            result.unwrap_err(),
            ServiceError::Lifecycle(LifecycleError::NotFound {
                entity_type: "Country",
                id: id.to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_empty_patch_is_identity() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        let created = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap();
        let patched = f
            .countries
            .patch(created.aggregate.id, CountryPatch::default(), &cancel)
            .await
            .unwrap();

        assert_eq!(patched.aggregate, created.aggregate);
    }

    #[tokio::test]
    async fn test_blank_patch_field_is_rejected_and_not_persisted() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        let created = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap();
        let result = f
            .countries
            .patch(
                created.aggregate.id,
                CountryPatch {
                    name: Some(String::new()),
                    ..Default::default()
                },
                &cancel,
            )
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Lifecycle(LifecycleError::Validation { field: "name", .. }))
        ));
        let stored = f.countries.find(created.aggregate.id, &cancel).await.unwrap();
        assert_eq!(stored.name, "Morocco");
    }

    #[tokio::test]
    async fn test_disable_with_live_dependents_fails_and_keeps_status() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        let morocco = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap()
            .aggregate;
        f.regions.create(region(morocco.id, "60"), &cancel).await.unwrap();

        let err = f.countries.disable(morocco.id, &cancel).await.unwrap_err();
        match err.as_lifecycle() {
            Some(LifecycleError::DependencyConflict { blockers, .. }) => {
                assert_eq!(blockers.len(), 1);
                assert_eq!(blockers[0].keys, vec!["60"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let stored = f.countries.find(morocco.id, &cancel).await.unwrap();
        assert!(stored.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_dependents_do_not_block() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        let morocco = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap()
            .aggregate;
        let oriental = f
            .regions
            .create(region(morocco.id, "60"), &cancel)
            .await
            .unwrap()
            .aggregate;
        f.regions.disable(oriental.id, &cancel).await.unwrap();

        let mutation = f.countries.disable(morocco.id, &cancel).await.unwrap();
        assert!(!mutation.aggregate.is_enabled());
    }

    #[tokio::test]
    async fn test_conflict_preview_honours_limit() {
        let f = fixture(2);
        let cancel = CancellationToken::new();

        let morocco = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap()
            .aggregate;
        for code in ["01", "02", "03"] {
            f.regions.create(region(morocco.id, code), &cancel).await.unwrap();
        }

        let err = f.countries.disable(morocco.id, &cancel).await.unwrap_err();
        let Some(LifecycleError::DependencyConflict { blockers, .. }) = err.as_lifecycle() else {
            panic!("expected a dependency conflict, got {err:?}");
        };
        assert_eq!(blockers[0].total, 3);
        assert_eq!(blockers[0].keys, vec!["01", "02"]);
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_disable_is_idempotent() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        let id = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap()
            .aggregate
            .id;

        let first = f.countries.disable(id, &cancel).await.unwrap();
        let second = f.countries.disable(id, &cancel).await.unwrap();

        assert!(first.is_changed());
        assert!(!second.is_changed());
        assert_eq!(first.aggregate, second.aggregate);
        assert_eq!(f.events.kinds(), vec![EventKind::Created, EventKind::Disabled]);
    }

    #[tokio::test]
    async fn test_activate_restores_and_is_idempotent() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        let id = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap()
            .aggregate
            .id;
        f.countries.disable(id, &cancel).await.unwrap();

        let activated = f.countries.activate(id, &cancel).await.unwrap();
        let again = f.countries.activate(id, &cancel).await.unwrap();

        assert!(activated.aggregate.is_enabled());
        assert!(!again.is_changed());
        assert_eq!(
            f.events.kinds(),
            vec![EventKind::Created, EventKind::Disabled, EventKind::Activated]
        );
    }

    #[tokio::test]
    async fn test_default_listing_hides_disabled() {
        let f = fixture(10);
        let cancel = CancellationToken::new();

        let id = f
            .countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap()
            .aggregate
            .id;
        f.countries
            .create(country("SN", "Senegal"), &cancel)
            .await
            .unwrap();
        f.countries.disable(id, &cancel).await.unwrap();

        let enabled = f
            .countries
            .fetch_page(&CountryCriteria::default(), &[], &cancel)
            .await
            .unwrap();
        let disabled = f
            .countries
            .fetch_page(
                &CountryCriteria {
                    is_enabled: Some(false),
                    ..Default::default()
                },
                &[],
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(enabled.total_count, 1);
        assert_eq!(enabled.items[0].code, "SN");
        assert_eq!(disabled.total_count, 1);
        assert_eq!(disabled.items[0].code, "MA");
    }

    #[tokio::test]
    async fn test_dispatch_failure_does_not_fail_command() {
        let countries = AggregateService::<Country>::new(
            Arc::new(InMemoryRepository::<Country>::new()),
            Arc::new(Failing),
        );
        let cancel = CancellationToken::new();

        let created = countries
            .create(country("MA", "Morocco"), &cancel)
            .await
            .unwrap();
        assert!(countries
            .get_by_id(created.aggregate.id, &cancel)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_cancelled_command_writes_nothing() {
        let f = fixture(10);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = f.countries.create(country("MA", "Morocco"), &cancel).await;
        assert_eq!(
            result.unwrap_err(),
            ServiceError::Repository(RepositoryError::Cancelled)
        );
        assert!(f.events.kinds().is_empty());
    }
}
