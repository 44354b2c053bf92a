//! Application state.
//!
//! Wires one cached store, one service and the dependency guards for every
//! aggregate type. The cache and event backends are selected via feature
//! flags.

use std::sync::Arc;

use refdata_core::aggregate::{Aggregate, DependentLink};
use refdata_core::banking::{Bank, BankAccount};
use refdata_core::cache::Cache;
use refdata_core::catalog::{ParamType, Product, ProductService, TypeDefinition};
use refdata_core::events::{EventDispatcher, EventSubscriber};
use refdata_core::geography::{City, Country, Currency, MonetaryZone, Region};
use refdata_core::organization::{Agency, Sector};
use refdata_core::taxation::{Tax, TaxRuleDetail};

use crate::cache::CacheGateway;
use crate::config::Config;
use crate::service::{AggregateService, ChildGuard, DependencyGuard};
use crate::storage::{CachedRepository, ChildLoader, InMemoryRepository, NavigationLoader};

/// Shared application state.
///
/// Cheap to clone; every service is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub countries: Arc<AggregateService<Country>>,
    pub regions: Arc<AggregateService<Region>>,
    pub cities: Arc<AggregateService<City>>,
    pub monetary_zones: Arc<AggregateService<MonetaryZone>>,
    pub currencies: Arc<AggregateService<Currency>>,
    pub banks: Arc<AggregateService<Bank>>,
    pub bank_accounts: Arc<AggregateService<BankAccount>>,
    pub type_definitions: Arc<AggregateService<TypeDefinition>>,
    pub param_types: Arc<AggregateService<ParamType>>,
    pub products: Arc<AggregateService<Product>>,
    pub product_services: Arc<AggregateService<ProductService>>,
    pub sectors: Arc<AggregateService<Sector>>,
    pub agencies: Arc<AggregateService<Agency>>,
    pub taxes: Arc<AggregateService<Tax>>,
    pub tax_rule_details: Arc<AggregateService<TaxRuleDetail>>,
    /// Subscription side of the event transport.
    pub events: Arc<dyn EventSubscriber>,
}

/// Shared pieces every service is built from.
struct Wiring {
    gateway: CacheGateway,
    dispatcher: Arc<dyn EventDispatcher>,
    preview_limit: u32,
}

impl Wiring {
    fn service<A: Aggregate>(&self, store: &Arc<InMemoryRepository<A>>) -> AggregateService<A> {
        let cached = CachedRepository::<A, _>::new(store.clone(), self.gateway.clone());
        AggregateService::new(Arc::new(cached), self.dispatcher.clone())
    }

    /// Guards read the raw store so they always see committed state.
    fn guard<P: Aggregate, C: Aggregate>(
        &self,
        children: &Arc<InMemoryRepository<C>>,
        link: DependentLink<P, C>,
    ) -> Arc<dyn DependencyGuard<P>> {
        Arc::new(ChildGuard::new(children.clone(), link, self.preview_limit))
    }
}

fn loader<P: Aggregate, C: Aggregate>(
    children: &Arc<InMemoryRepository<C>>,
    link: DependentLink<P, C>,
) -> Arc<dyn NavigationLoader<P>> {
    Arc::new(ChildLoader::new(children.clone(), link))
}

impl AppState {
    /// Builds the state over in-memory stores.
    ///
    /// Child stores are created first so parents can eager-load and guard
    /// them.
    pub fn build(
        cache: Arc<dyn Cache>,
        dispatcher: Arc<dyn EventDispatcher>,
        events: Arc<dyn EventSubscriber>,
        config: &Config,
    ) -> Self {
        let w = Wiring {
            gateway: CacheGateway::new(cache, config.cache_ttl(), config.cache_list_ttl()),
            dispatcher,
            preview_limit: config.dependent_preview_limit,
        };

        // Geography
        let cities = Arc::new(InMemoryRepository::<City>::new());
        let regions = Arc::new(
            InMemoryRepository::<Region>::new()
                .with_navigation(Region::CITIES.name, loader(&cities, Region::CITIES)),
        );
        let countries = Arc::new(
            InMemoryRepository::<Country>::new()
                .with_navigation(Country::REGIONS.name, loader(&regions, Country::REGIONS)),
        );
        let monetary_zones = Arc::new(InMemoryRepository::<MonetaryZone>::new().with_navigation(
            MonetaryZone::COUNTRIES.name,
            loader(&countries, MonetaryZone::COUNTRIES),
        ));
        let currencies = Arc::new(InMemoryRepository::<Currency>::new());

        // Banking
        let bank_accounts = Arc::new(InMemoryRepository::<BankAccount>::new());
        let banks = Arc::new(
            InMemoryRepository::<Bank>::new()
                .with_navigation(Bank::ACCOUNTS.name, loader(&bank_accounts, Bank::ACCOUNTS)),
        );

        // Catalog
        let param_types = Arc::new(InMemoryRepository::<ParamType>::new());
        let type_definitions = Arc::new(InMemoryRepository::<TypeDefinition>::new().with_navigation(
            TypeDefinition::PARAM_TYPES.name,
            loader(&param_types, TypeDefinition::PARAM_TYPES),
        ));
        let product_services = Arc::new(InMemoryRepository::<ProductService>::new());
        let products = Arc::new(
            InMemoryRepository::<Product>::new()
                .with_navigation(Product::SERVICES.name, loader(&product_services, Product::SERVICES)),
        );

        // Organization
        let agencies = Arc::new(InMemoryRepository::<Agency>::new());
        let sectors = Arc::new(
            InMemoryRepository::<Sector>::new()
                .with_navigation(Sector::AGENCIES.name, loader(&agencies, Sector::AGENCIES)),
        );

        // Taxation
        let tax_rule_details = Arc::new(InMemoryRepository::<TaxRuleDetail>::new());
        let taxes = Arc::new(InMemoryRepository::<Tax>::new().with_navigation(
            Tax::RULE_DETAILS.name,
            loader(&tax_rule_details, Tax::RULE_DETAILS),
        ));

        Self {
            countries: Arc::new(
                w.service(&countries)
                    .with_guard(w.guard(&regions, Country::REGIONS)),
            ),
            regions: Arc::new(w.service(&regions).with_guard(w.guard(&cities, Region::CITIES))),
            cities: Arc::new(w.service(&cities)),
            monetary_zones: Arc::new(
                w.service(&monetary_zones)
                    .with_guard(w.guard(&countries, MonetaryZone::COUNTRIES)),
            ),
            currencies: Arc::new(w.service(&currencies)),
            banks: Arc::new(
                w.service(&banks)
                    .with_guard(w.guard(&bank_accounts, Bank::ACCOUNTS)),
            ),
            bank_accounts: Arc::new(w.service(&bank_accounts)),
            type_definitions: Arc::new(
                w.service(&type_definitions)
                    .with_guard(w.guard(&param_types, TypeDefinition::PARAM_TYPES)),
            ),
            param_types: Arc::new(w.service(&param_types)),
            products: Arc::new(
                w.service(&products)
                    .with_guard(w.guard(&product_services, Product::SERVICES)),
            ),
            product_services: Arc::new(w.service(&product_services)),
            sectors: Arc::new(
                w.service(&sectors)
                    .with_guard(w.guard(&agencies, Sector::AGENCIES)),
            ),
            agencies: Arc::new(w.service(&agencies)),
            taxes: Arc::new(
                w.service(&taxes)
                    .with_guard(w.guard(&tax_rule_details, Tax::RULE_DETAILS)),
            ),
            tax_rule_details: Arc::new(w.service(&tax_rule_details)),
            events,
        }
    }
}

#[cfg(feature = "memory")]
mod memory_state {
    use super::*;
    use crate::cache::{MemoryCache, MemoryEventBus};
    use crate::error::StartupError;

    impl AppState {
        /// Creates the state with the in-memory cache and event bus.
        pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
            let cache = Arc::new(MemoryCache::new(config.cache_max_entries));
            let bus = Arc::new(MemoryEventBus::new(config.event_channel_capacity));

            tracing::info!(
                max_entries = config.cache_max_entries,
                "Using in-memory cache"
            );

            Ok(Self::build(cache, bus.clone(), bus, config))
        }
    }
}

#[cfg(feature = "redis")]
mod redis_state {
    use super::*;
    use crate::cache::{RedisCache, RedisEventBus};
    use crate::error::StartupError;

    impl AppState {
        /// Creates the state with the Redis cache and event bus.
        pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
            let cache = Arc::new(RedisCache::new(&config.redis_url).await?);
            let bus =
                Arc::new(RedisEventBus::new(&config.redis_url, config.event_channel_capacity).await?);

            tracing::info!(redis_url = %config.redis_url, "Using Redis cache");

            Ok(Self::build(cache, bus.clone(), bus, config))
        }
    }
}
