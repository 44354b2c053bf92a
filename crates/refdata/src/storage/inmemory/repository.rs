//! In-memory repository implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use refdata_core::aggregate::Aggregate;
use refdata_core::query::{Page, PagedResult, Predicate};
use refdata_core::storage::{check_cancelled, Repository, RepositoryError, Result};

use super::NavigationLoader;

enum PendingWrite<T> {
    Add(T),
    Update(T),
}

/// In-memory storage backend for one aggregate type.
///
/// Rows live in a `BTreeMap` wrapped in `Arc<RwLock<_>>`. Writes are staged
/// until [`save_changes`](Repository::save_changes), which validates them
/// against a copy of the table and swaps it in only when every write and
/// the natural-key constraint hold.
pub struct InMemoryRepository<T: Aggregate> {
    rows: Arc<RwLock<BTreeMap<T::Id, T>>>,
    pending: Arc<Mutex<Vec<PendingWrite<T>>>>,
    navigations: HashMap<&'static str, Arc<dyn NavigationLoader<T>>>,
}

impl<T: Aggregate> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Aggregate> InMemoryRepository<T> {
    /// Creates a new empty repository without navigations.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            pending: Arc::new(Mutex::new(Vec::new())),
            navigations: HashMap::new(),
        }
    }

    /// Registers a navigation that `fetch_page` can eager-load under `name`.
    pub fn with_navigation(
        mut self,
        name: &'static str,
        loader: Arc<dyn NavigationLoader<T>>,
    ) -> Self {
        self.navigations.insert(name, loader);
        self
    }

    /// Number of committed rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn loaders(&self, includes: &[&str]) -> Result<Vec<Arc<dyn NavigationLoader<T>>>> {
        let mut names: Vec<&str> = includes.to_vec();
        names.sort_unstable();
        names.dedup();

        names
            .into_iter()
            .map(|name| {
                self.navigations.get(name).cloned().ok_or_else(|| {
                    RepositoryError::InvalidData(format!(
                        "unknown include '{}' for {}",
                        name,
                        T::ENTITY
                    ))
                })
            })
            .collect()
    }
}

fn by_natural_key<T: Aggregate>(a: &&T, b: &&T) -> std::cmp::Ordering {
    a.natural_key()
        .cmp(b.natural_key())
        .then_with(|| a.id().cmp(&b.id()))
}

fn detached<T: Aggregate>(entity: &T) -> T {
    let mut entity = entity.clone();
    entity.detach();
    entity
}

#[async_trait]
impl<T: Aggregate> Repository<T> for InMemoryRepository<T> {
    async fn fetch_page(
        &self,
        predicate: &Predicate<T>,
        page: Page,
        includes: &[&str],
        cancel: &CancellationToken,
    ) -> Result<PagedResult<T>> {
        check_cancelled(cancel)?;
        let loaders = self.loaders(includes)?;

        // Count and items come from the same snapshot.
        let (mut items, total) = {
            let rows = self.rows.read().await;
            let mut matched: Vec<&T> = rows.values().filter(|r| predicate.matches(r)).collect();
            matched.sort_by(by_natural_key);

            let total = matched.len() as u64;
            let items: Vec<T> = matched
                .into_iter()
                .skip(page.offset())
                .take(page.size() as usize)
                .cloned()
                .collect();
            (items, total)
        };

        for loader in loaders {
            loader.load(&mut items, cancel).await?;
        }

        tracing::trace!(
            entity = T::ENTITY,
            predicate = %predicate,
            page = page.number(),
            total,
            "Fetched page"
        );

        Ok(PagedResult::new(items, total, page))
    }

    async fn get_by_id(&self, id: T::Id, cancel: &CancellationToken) -> Result<Option<T>> {
        check_cancelled(cancel)?;
        let rows = self.rows.read().await;
        Ok(rows.get(&id).cloned())
    }

    async fn get_one(
        &self,
        predicate: &Predicate<T>,
        cancel: &CancellationToken,
    ) -> Result<Option<T>> {
        check_cancelled(cancel)?;
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|r| predicate.matches(r))
            .min_by(by_natural_key)
            .cloned())
    }

    async fn add(&self, entity: &T) -> Result<()> {
        self.pending
            .lock()
            .await
            .push(PendingWrite::Add(detached(entity)));
        Ok(())
    }

    async fn update(&self, entity: &T) -> Result<()> {
        self.pending
            .lock()
            .await
            .push(PendingWrite::Update(detached(entity)));
        Ok(())
    }

    /// Staged writes are discarded whether or not the commit succeeds.
    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize> {
        let writes = std::mem::take(&mut *self.pending.lock().await);
        check_cancelled(cancel)?;

        if writes.is_empty() {
            return Ok(0);
        }

        let mut rows = self.rows.write().await;
        let mut next = rows.clone();

        for write in &writes {
            match write {
                PendingWrite::Add(entity) => {
                    if next.contains_key(&entity.id()) {
                        return Err(RepositoryError::AlreadyExists {
                            entity_type: T::ENTITY,
                            id: entity.id().to_string(),
                        });
                    }
                    next.insert(entity.id(), entity.clone());
                }
                PendingWrite::Update(entity) => {
                    if !next.contains_key(&entity.id()) {
                        return Err(RepositoryError::NotFound {
                            entity_type: T::ENTITY,
                            id: entity.id().to_string(),
                        });
                    }
                    next.insert(entity.id(), entity.clone());
                }
            }
        }

        {
            let mut seen: HashMap<&str, T::Id> = HashMap::with_capacity(next.len());
            for row in next.values() {
                if seen.insert(row.natural_key(), row.id()).is_some() {
                    return Err(RepositoryError::AlreadyExists {
                        entity_type: T::ENTITY,
                        id: format!("{}={}", T::NATURAL_KEY, row.natural_key()),
                    });
                }
            }
        }

        *rows = next;

        tracing::debug!(entity = T::ENTITY, applied = writes.len(), "Changes saved");
        Ok(writes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::inmemory::ChildLoader;
    use refdata_core::aggregate::natural_key_predicate;
    use refdata_core::geography::{
        Country, CountryCriteria, CountryDraft, Region, RegionDraft,
    };
    use refdata_core::id::{CountryId, RegionId};
    use refdata_core::query::Criteria;

    fn country(code: &str, name: &str) -> Country {
        Country::from_draft(
            CountryId::new(),
            CountryDraft {
                code: code.to_string(),
                name: name.to_string(),
                iso3: None,
                monetary_zone_id: None,
            },
        )
    }

    fn region(country_id: CountryId, code: &str) -> Region {
        Region::from_draft(
            RegionId::new(),
            RegionDraft {
                code: code.to_string(),
                name: format!("Region {code}"),
                country_id,
            },
        )
    }

    async fn seeded(codes: &[&str]) -> InMemoryRepository<Country> {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        for code in codes {
            repo.add(&country(code, &format!("Country {code}")))
                .await
                .unwrap();
        }
        repo.save_changes(&cancel).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_fetch_page_orders_by_natural_key() {
        let repo = seeded(&["SN", "FR", "MA"]).await;
        let cancel = CancellationToken::new();

        let page = repo
            .fetch_page(&Predicate::all(), Page::new(1, 10), &[], &cancel)
            .await
            .unwrap();

        let codes: Vec<&str> = page.items.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["FR", "MA", "SN"]);
        assert_eq!(page.total_count, 3);
    }

    #[tokio::test]
    async fn test_total_count_is_the_same_on_every_page() {
        let repo = seeded(&["A1", "A2", "A3", "A4", "A5"]).await;
        let cancel = CancellationToken::new();

        let mut seen = Vec::new();
        for number in 1..=3 {
            let page = repo
                .fetch_page(&Predicate::all(), Page::new(number, 2), &[], &cancel)
                .await
                .unwrap();
            assert_eq!(page.total_count, 5);
            assert!(page.items.len() <= 2);
            seen.extend(page.items.into_iter().map(|c| c.code));
        }
        assert_eq!(seen, vec!["A1", "A2", "A3", "A4", "A5"]);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let repo = seeded(&["MA"]).await;
        let cancel = CancellationToken::new();

        let page = repo
            .fetch_page(&Predicate::all(), Page::new(5, 10), &[], &cancel)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 1);
    }

    #[tokio::test]
    async fn test_staged_writes_are_invisible_until_saved() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        let morocco = country("MA", "Morocco");

        repo.add(&morocco).await.unwrap();
        assert!(repo.get_by_id(morocco.id, &cancel).await.unwrap().is_none());

        assert_eq!(repo.save_changes(&cancel).await.unwrap(), 1);
        assert_eq!(
            repo.get_by_id(morocco.id, &cancel).await.unwrap(),
            Some(morocco)
        );
    }

    #[tokio::test]
    async fn test_save_changes_rejects_duplicate_natural_key() {
        let repo = seeded(&["MA"]).await;
        let cancel = CancellationToken::new();

        repo.add(&country("MA", "Maroc")).await.unwrap();
        let result = repo.save_changes(&cancel).await;

        assert_eq!(
            result,
            Err(RepositoryError::AlreadyExists {
                entity_type: "Country",
                id: "code=MA".to_string(),
            })
        );
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_commit_applies_nothing() {
        let repo = seeded(&["MA"]).await;
        let cancel = CancellationToken::new();

        repo.add(&country("SN", "Senegal")).await.unwrap();
        repo.update(&country("XX", "Nowhere")).await.unwrap();
        let result = repo.save_changes(&cancel).await;

        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
        assert_eq!(repo.len().await, 1);

        // The failed batch was discarded.
        assert_eq!(repo.save_changes(&cancel).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_existing_id_is_already_exists() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        let morocco = country("MA", "Morocco");

        repo.add(&morocco).await.unwrap();
        repo.save_changes(&cancel).await.unwrap();
        repo.add(&morocco).await.unwrap();

        assert!(matches!(
            repo.save_changes(&cancel).await,
            Err(RepositoryError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_one_by_natural_key() {
        let repo = seeded(&["MA", "SN"]).await;
        let cancel = CancellationToken::new();

        let found = repo
            .get_one(&natural_key_predicate::<Country>("SN"), &cancel)
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.code), Some("SN".to_string()));

        let missing = repo
            .get_one(&natural_key_predicate::<Country>("ZZ"), &cancel)
            .await
            .unwrap();
        assert!(missing.is_none());
        assert!(!repo
            .exists(&natural_key_predicate::<Country>("ZZ"), &cancel)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_token_fails_fast() {
        let repo = seeded(&["MA"]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = repo
            .fetch_page(&Predicate::all(), Page::default(), &[], &cancel)
            .await;
        assert_eq!(result, Err(RepositoryError::Cancelled));
    }

    #[tokio::test]
    async fn test_unknown_include_is_invalid_data() {
        let repo = seeded(&["MA"]).await;
        let cancel = CancellationToken::new();

        let result = repo
            .fetch_page(&Predicate::all(), Page::default(), &["agencies"], &cancel)
            .await;
        assert_eq!(
            result,
            Err(RepositoryError::InvalidData(
                "unknown include 'agencies' for Country".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_include_loads_navigation_only_when_requested() {
        let cancel = CancellationToken::new();
        let regions = Arc::new(InMemoryRepository::<Region>::new());
        let countries = InMemoryRepository::<Country>::new().with_navigation(
            Country::REGIONS.name,
            Arc::new(ChildLoader::new(regions.clone(), Country::REGIONS)),
        );

        let morocco = country("MA", "Morocco");
        countries.add(&morocco).await.unwrap();
        countries.save_changes(&cancel).await.unwrap();
        regions.add(&region(morocco.id, "60")).await.unwrap();
        regions.add(&region(morocco.id, "04")).await.unwrap();
        regions.save_changes(&cancel).await.unwrap();

        let criteria = CountryCriteria::default();
        let plain = countries
            .fetch_page(&criteria.predicate(), criteria.page(), &[], &cancel)
            .await
            .unwrap();
        assert!(plain.items[0].regions.is_none());

        let loaded = countries
            .fetch_page(&criteria.predicate(), criteria.page(), &["regions"], &cancel)
            .await
            .unwrap();
        let codes: Vec<String> = loaded.items[0]
            .regions
            .as_ref()
            .unwrap()
            .iter()
            .map(|r| r.code.clone())
            .collect();
        assert_eq!(codes, vec!["04", "60"]);
    }

    #[tokio::test]
    async fn test_navigations_are_not_stored() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        let mut morocco = country("MA", "Morocco");
        morocco.regions = Some(vec![region(morocco.id, "60")]);

        repo.add(&morocco).await.unwrap();
        repo.save_changes(&cancel).await.unwrap();

        let stored = repo.get_by_id(morocco.id, &cancel).await.unwrap().unwrap();
        assert!(stored.regions.is_none());
    }
}
