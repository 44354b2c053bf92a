//! End-to-end behavior of the wired services over the in-memory backends.

#![cfg(feature = "memory")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use refdata::cache::{CacheGateway, MemoryCache, MemoryEventBus};
use refdata::service::AggregateService;
use refdata::storage::{CachedRepository, InMemoryRepository};
use refdata::{AppState, Config, ServiceError};
use refdata_core::aggregate::{Aggregate, LifecycleError};
use refdata_core::banking::BankDraft;
use refdata_core::events::{EventKind, EventSubscriber};
use refdata_core::geography::{Country, CountryCriteria, CountryDraft, RegionDraft};
use refdata_core::query::{Page, PagedResult, Predicate};
use refdata_core::storage::{Repository, Result as RepositoryResult};

fn config() -> Config {
    Config {
        cache_ttl_seconds: 600,
        cache_list_ttl_seconds: 300,
        cache_max_entries: 1_000,
        event_channel_capacity: 64,
        dependent_preview_limit: 10,
        redis_url: "redis://localhost:6379".to_string(),
    }
}

async fn state() -> AppState {
    AppState::from_config(&config()).await.unwrap()
}

fn country(code: &str, name: &str) -> CountryDraft {
    CountryDraft {
        code: code.to_string(),
        name: name.to_string(),
        iso3: None,
        monetary_zone_id: None,
    }
}

/// Country store that counts the page fetches reaching it.
#[derive(Default)]
struct CountingCountries {
    inner: InMemoryRepository<Country>,
    fetches: AtomicUsize,
}

#[async_trait]
impl Repository<Country> for CountingCountries {
    async fn fetch_page(
        &self,
        predicate: &Predicate<Country>,
        page: Page,
        includes: &[&str],
        cancel: &CancellationToken,
    ) -> RepositoryResult<PagedResult<Country>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_page(predicate, page, includes, cancel).await
    }

    async fn get_by_id(
        &self,
        id: <Country as Aggregate>::Id,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<Country>> {
        self.inner.get_by_id(id, cancel).await
    }

    async fn get_one(
        &self,
        predicate: &Predicate<Country>,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<Country>> {
        self.inner.get_one(predicate, cancel).await
    }

    async fn add(&self, entity: &Country) -> RepositoryResult<()> {
        self.inner.add(entity).await
    }

    async fn update(&self, entity: &Country) -> RepositoryResult<()> {
        self.inner.update(entity).await
    }

    async fn save_changes(&self, cancel: &CancellationToken) -> RepositoryResult<usize> {
        self.inner.save_changes(cancel).await
    }
}

#[tokio::test]
async fn disable_country_without_regions_succeeds() {
    let state = state().await;
    let cancel = CancellationToken::new();

    let morocco = state
        .countries
        .create(country("MA", "Morocco"), &cancel)
        .await
        .unwrap()
        .aggregate;

    let mutation = state.countries.disable(morocco.id, &cancel).await.unwrap();

    assert!(!mutation.aggregate.is_enabled());
    assert_eq!(mutation.events.len(), 1);
    assert_eq!(mutation.events[0].kind, EventKind::Disabled);

    let listed = state
        .countries
        .fetch_page(&CountryCriteria::default(), &[], &cancel)
        .await
        .unwrap();
    assert_eq!(listed.total_count, 0);
}

#[tokio::test]
async fn disable_country_with_live_region_is_a_dependency_conflict() {
    let state = state().await;
    let cancel = CancellationToken::new();

    let morocco = state
        .countries
        .create(country("MA", "Morocco"), &cancel)
        .await
        .unwrap()
        .aggregate;
    state
        .regions
        .create(
            RegionDraft {
                code: "60".to_string(),
                name: "Oriental".to_string(),
                country_id: morocco.id,
            },
            &cancel,
        )
        .await
        .unwrap();

    let err = state
        .countries
        .disable(morocco.id, &cancel)
        .await
        .unwrap_err();

    let Some(LifecycleError::DependencyConflict { blockers, .. }) = err.as_lifecycle() else {
        panic!("expected a dependency conflict, got {err:?}");
    };
    assert_eq!(blockers.len(), 1);
    assert_eq!(blockers[0].link, "regions");
    assert_eq!(blockers[0].keys, vec!["60"]);
    assert!(err.to_string().contains("60"));

    let stored = state.countries.find(morocco.id, &cancel).await.unwrap();
    assert!(stored.is_enabled());
}

#[tokio::test]
async fn repeated_query_hits_the_store_once() {
    let store = Arc::new(CountingCountries::default());
    let gateway = CacheGateway::new(
        Arc::new(MemoryCache::new(100)),
        Duration::from_secs(600),
        Duration::from_secs(300),
    );
    let countries = AggregateService::<Country>::new(
        Arc::new(CachedRepository::<Country, _>::new(store.clone(), gateway)),
        Arc::new(MemoryEventBus::default()),
    );
    let cancel = CancellationToken::new();
    let criteria = CountryCriteria {
        code: Some("XYZ".to_string()),
        ..Default::default()
    };

    let first = countries.fetch_page(&criteria, &[], &cancel).await.unwrap();
    let second = countries.fetch_page(&criteria, &[], &cancel).await.unwrap();

    assert_eq!(first, second);
    assert!(first.items.is_empty());
    assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn duplicate_bank_code_is_already_exists() {
    let state = state().await;
    let cancel = CancellationToken::new();
    let bank = |name: &str| BankDraft {
        code: "B1".to_string(),
        name: name.to_string(),
        swift_code: None,
        country_id: None,
    };

    state.banks.create(bank("First"), &cancel).await.unwrap();
    let err = state.banks.create(bank("Second"), &cancel).await.unwrap_err();

    assert_eq!(
        err,
        ServiceError::Lifecycle(LifecycleError::AlreadyExists {
            entity_type: "Bank",
            field: "code",
            value: "B1".to_string(),
        })
    );
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn paging_covers_every_item_once() {
    let state = state().await;
    let cancel = CancellationToken::new();

    for n in 0..7 {
        state
            .countries
            .create(country(&format!("C{n}"), &format!("Country {n}")), &cancel)
            .await
            .unwrap();
    }

    let mut codes = Vec::new();
    for page_number in 1..=3 {
        let page = state
            .countries
            .fetch_page(
                &CountryCriteria {
                    page_number,
                    page_size: 3,
                    ..Default::default()
                },
                &[],
                &cancel,
            )
            .await
            .unwrap();
        assert!(page.items.len() <= 3);
        assert_eq!(page.total_count, 7);
        codes.extend(page.items.into_iter().map(|c| c.code));
    }

    assert_eq!(codes, vec!["C0", "C1", "C2", "C3", "C4", "C5", "C6"]);
}

#[tokio::test]
async fn write_refreshes_cached_listing() {
    let state = state().await;
    let cancel = CancellationToken::new();
    let criteria = CountryCriteria {
        name: Some("mor".to_string()),
        ..Default::default()
    };

    let before = state
        .countries
        .fetch_page(&criteria, &[], &cancel)
        .await
        .unwrap();
    state
        .countries
        .create(country("MA", "Morocco"), &cancel)
        .await
        .unwrap();
    let after = state
        .countries
        .fetch_page(&criteria, &[], &cancel)
        .await
        .unwrap();

    assert_eq!(before.total_count, 0);
    assert_eq!(after.total_count, 1);
}

#[tokio::test]
async fn region_write_refreshes_country_pages_with_regions() {
    let state = state().await;
    let cancel = CancellationToken::new();

    let morocco = state
        .countries
        .create(country("MA", "Morocco"), &cancel)
        .await
        .unwrap()
        .aggregate;

    let before = state
        .countries
        .fetch_page(&CountryCriteria::default(), &["regions"], &cancel)
        .await
        .unwrap();
    assert_eq!(before.items[0].regions.as_deref().map(<[_]>::len), Some(0));

    state
        .regions
        .create(
            RegionDraft {
                code: "04".to_string(),
                name: "Rabat-Salé-Kénitra".to_string(),
                country_id: morocco.id,
            },
            &cancel,
        )
        .await
        .unwrap();

    let after = state
        .countries
        .fetch_page(&CountryCriteria::default(), &["regions"], &cancel)
        .await
        .unwrap();
    assert_eq!(after.items[0].regions.as_deref().map(<[_]>::len), Some(1));
}

#[tokio::test]
async fn unknown_include_is_rejected() {
    let state = state().await;
    let cancel = CancellationToken::new();

    let err = state
        .countries
        .fetch_page(&CountryCriteria::default(), &["cities"], &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn committed_writes_are_published() {
    let state = state().await;
    let cancel = CancellationToken::new();
    let mut events = state.events.subscribe(Country::CACHE_PREFIX).await.unwrap();

    let morocco = state
        .countries
        .create(country("MA", "Morocco"), &cancel)
        .await
        .unwrap()
        .aggregate;
    state.countries.disable(morocco.id, &cancel).await.unwrap();
    // Idempotent: no second event.
    state.countries.disable(morocco.id, &cancel).await.unwrap();

    let created = events.try_recv().unwrap();
    let disabled = events.try_recv().unwrap();

    assert_eq!(created.kind, EventKind::Created);
    assert_eq!(disabled.kind, EventKind::Disabled);
    assert_eq!(disabled.aggregate_id, morocco.id.as_uuid());
    assert_eq!(disabled.payload["is_enabled"], false);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn rejected_write_publishes_nothing() {
    let state = state().await;
    let cancel = CancellationToken::new();

    state
        .countries
        .create(country("MA", "Morocco"), &cancel)
        .await
        .unwrap();
    let mut events = state.events.subscribe(Country::CACHE_PREFIX).await.unwrap();

    let result = state.countries.create(country("MA", "Maroc"), &cancel).await;

    assert!(result.is_err());
    assert!(events.try_recv().is_err());
}
