use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use refdata_core::aggregate::Aggregate;
use refdata_core::cache::{entity_key, list_key, list_prefix};
use refdata_core::id::EntityId;
use refdata_core::query::{Page, PagedResult, Predicate};
use refdata_core::storage::{Repository, Result};

use crate::cache::CacheGateway;

/// Cache-aside decorator for a [`Repository`].
///
/// Empty pages are cached like any other page; a missing entity is not.
/// Cache failures never surface: the gateway logs them and the call falls
/// through to the wrapped repository.
///
/// # Type Parameters
///
/// * `T` - The aggregate type
/// * `R` - The underlying repository implementation
pub struct CachedRepository<T: Aggregate, R: ?Sized> {
    repository: Arc<R>,
    cache: CacheGateway,
    written: Mutex<Vec<T::Id>>,
}

impl<T: Aggregate, R: Repository<T> + ?Sized> CachedRepository<T, R> {
    pub fn new(repository: Arc<R>, cache: CacheGateway) -> Self {
        Self {
            repository,
            cache,
            written: Mutex::new(Vec::new()),
        }
    }

    async fn invalidate(&self, written: &[T::Id]) {
        for id in written {
            self.cache
                .remove(&entity_key(T::CACHE_PREFIX, id.uuid()))
                .await;
        }

        self.cache.remove_by_prefix(&list_prefix(T::CACHE_PREFIX)).await;
        for parent in T::PARENT_PREFIXES {
            self.cache.remove_by_prefix(&list_prefix(parent)).await;
        }

        tracing::trace!(
            entity = T::ENTITY,
            count = written.len(),
            "Invalidated cached entries"
        );
    }
}

#[async_trait]
impl<T, R> Repository<T> for CachedRepository<T, R>
where
    T: Aggregate,
    R: Repository<T> + ?Sized + 'static,
{
    async fn fetch_page(
        &self,
        predicate: &Predicate<T>,
        page: Page,
        includes: &[&str],
        cancel: &CancellationToken,
    ) -> Result<PagedResult<T>> {
        let cache_key = list_key(T::CACHE_PREFIX, predicate, page, includes);

        if let Some(cached) = self.cache.get_page(&cache_key, cancel).await {
            tracing::trace!(entity = T::ENTITY, cache_key = %cache_key, "Page served from cache");
            return Ok(cached);
        }

        let result = self
            .repository
            .fetch_page(predicate, page, includes, cancel)
            .await?;

        self.cache.set_page(&cache_key, &result, cancel).await;
        Ok(result)
    }

    async fn get_by_id(&self, id: T::Id, cancel: &CancellationToken) -> Result<Option<T>> {
        let cache_key = entity_key(T::CACHE_PREFIX, id.uuid());

        if let Some(cached) = self.cache.get_entity(&cache_key, cancel).await {
            return Ok(Some(cached));
        }

        let entity = self.repository.get_by_id(id, cancel).await?;

        if let Some(ref e) = entity {
            self.cache.set_entity(&cache_key, e, cancel).await;
        }

        Ok(entity)
    }

    async fn get_one(
        &self,
        predicate: &Predicate<T>,
        cancel: &CancellationToken,
    ) -> Result<Option<T>> {
        self.repository.get_one(predicate, cancel).await
    }

    async fn exists(&self, predicate: &Predicate<T>, cancel: &CancellationToken) -> Result<bool> {
        self.repository.exists(predicate, cancel).await
    }

    async fn add(&self, entity: &T) -> Result<()> {
        self.repository.add(entity).await?;
        self.written.lock().await.push(entity.id());
        Ok(())
    }

    async fn update(&self, entity: &T) -> Result<()> {
        self.repository.update(entity).await?;
        self.written.lock().await.push(entity.id());
        Ok(())
    }

    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize> {
        let written = std::mem::take(&mut *self.written.lock().await);
        let applied = self.repository.save_changes(cancel).await?;

        if applied > 0 {
            self.invalidate(&written).await;
        }

        Ok(applied)
    }
}
