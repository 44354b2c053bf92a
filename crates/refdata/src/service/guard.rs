//! Referential-integrity guards run before disabling an aggregate.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use refdata_core::aggregate::{Aggregate, DependentLink, DependentSummary};
use refdata_core::query::Page;
use refdata_core::storage::{Repository, Result};

/// Looks for live dependents of a parent through one link.
#[async_trait]
pub trait DependencyGuard<P: Aggregate>: Send + Sync {
    /// Name of the guarded link.
    fn link(&self) -> &'static str;

    /// Returns a summary when at least one live dependent exists.
    async fn live_dependents(
        &self,
        parent: &P,
        cancel: &CancellationToken,
    ) -> Result<Option<DependentSummary>>;
}

/// Guards a [`DependentLink`] by querying the child store.
///
/// The child store should be the uncached one so the check always sees
/// committed state.
pub struct ChildGuard<P, C> {
    children: Arc<dyn Repository<C>>,
    link: DependentLink<P, C>,
    preview_limit: u32,
}

impl<P: Aggregate, C: Aggregate> ChildGuard<P, C> {
    pub fn new(
        children: Arc<dyn Repository<C>>,
        link: DependentLink<P, C>,
        preview_limit: u32,
    ) -> Self {
        Self {
            children,
            link,
            preview_limit,
        }
    }
}

#[async_trait]
impl<P: Aggregate, C: Aggregate> DependencyGuard<P> for ChildGuard<P, C> {
    fn link(&self) -> &'static str {
        self.link.name
    }

    async fn live_dependents(
        &self,
        parent: &P,
        cancel: &CancellationToken,
    ) -> Result<Option<DependentSummary>> {
        let predicate = self.link.live_children(parent.id());
        let preview = self
            .children
            .fetch_page(&predicate, Page::new(1, self.preview_limit), &[], cancel)
            .await?;

        if preview.total_count == 0 {
            return Ok(None);
        }

        Ok(Some(self.link.summarize(&preview)))
    }
}
