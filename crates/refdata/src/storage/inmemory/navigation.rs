//! Eager loading of child collections.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use refdata_core::aggregate::{Aggregate, DependentLink};
use refdata_core::query::{Page, MAX_PAGE_SIZE};
use refdata_core::storage::{Repository, Result};

/// Fills one navigation collection on a batch of parents.
#[async_trait]
pub trait NavigationLoader<P: Aggregate>: Send + Sync {
    async fn load(&self, parents: &mut [P], cancel: &CancellationToken) -> Result<()>;
}

/// Loads the children reached through a [`DependentLink`], whatever their status.
pub struct ChildLoader<P, C> {
    children: Arc<dyn Repository<C>>,
    link: DependentLink<P, C>,
}

impl<P: Aggregate, C: Aggregate> ChildLoader<P, C> {
    pub fn new(children: Arc<dyn Repository<C>>, link: DependentLink<P, C>) -> Self {
        Self { children, link }
    }
}

#[async_trait]
impl<P: Aggregate, C: Aggregate> NavigationLoader<P> for ChildLoader<P, C> {
    async fn load(&self, parents: &mut [P], cancel: &CancellationToken) -> Result<()> {
        for parent in parents.iter_mut() {
            let predicate = self.link.children(parent.id());
            let mut loaded = Vec::new();
            let mut number = 1;

            loop {
                let page = Page::new(number, MAX_PAGE_SIZE);
                let result = self
                    .children
                    .fetch_page(&predicate, page, &[], cancel)
                    .await?;
                let total = result.total_count;
                let fetched = result.items.len();
                loaded.extend(result.items);

                if fetched == 0 || loaded.len() as u64 >= total {
                    break;
                }
                number += 1;
            }

            self.link.attach(parent, loaded);
        }
        Ok(())
    }
}
