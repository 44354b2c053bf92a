use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::aggregate::Aggregate;
use crate::query::{Page, PagedResult, Predicate};

use super::{RepositoryError, Result};

/// Generic paged store for one aggregate type.
///
/// Writes are staged by [`add`](Repository::add) and
/// [`update`](Repository::update) and become visible only once
/// [`save_changes`](Repository::save_changes) succeeds.
#[async_trait]
pub trait Repository<T: Aggregate>: Send + Sync {
    /// Fetches one page of entities matching `predicate`, ordered by natural key.
    ///
    /// `includes` names the navigations to eager-load; every other
    /// navigation is left unloaded.
    async fn fetch_page(
        &self,
        predicate: &Predicate<T>,
        page: Page,
        includes: &[&str],
        cancel: &CancellationToken,
    ) -> Result<PagedResult<T>>;

    /// Gets an entity by its ID.
    async fn get_by_id(&self, id: T::Id, cancel: &CancellationToken) -> Result<Option<T>>;

    /// Gets the first entity matching `predicate`.
    async fn get_one(&self, predicate: &Predicate<T>, cancel: &CancellationToken)
        -> Result<Option<T>>;

    /// Checks whether any entity matches `predicate`.
    async fn exists(&self, predicate: &Predicate<T>, cancel: &CancellationToken) -> Result<bool> {
        Ok(self.get_one(predicate, cancel).await?.is_some())
    }

    /// Stages an insert.
    async fn add(&self, entity: &T) -> Result<()>;

    /// Stages an update of an existing entity.
    async fn update(&self, entity: &T) -> Result<()>;

    /// Applies every staged write atomically and returns how many were applied.
    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize>;
}

/// Fails with [`RepositoryError::Cancelled`] once `cancel` has fired.
pub fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(RepositoryError::Cancelled);
    }
    Ok(())
}
