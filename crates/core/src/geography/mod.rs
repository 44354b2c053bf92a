//! Countries, regions, cities, monetary zones and currencies.

mod city;
mod country;
mod currency;
mod monetary_zone;
mod region;

pub use city::{City, CityCriteria, CityDraft, CityPatch};
pub use country::{Country, CountryCriteria, CountryDraft, CountryPatch};
pub use currency::{Currency, CurrencyCriteria, CurrencyDraft, CurrencyPatch};
pub use monetary_zone::{MonetaryZone, MonetaryZoneCriteria, MonetaryZoneDraft, MonetaryZonePatch};
pub use region::{Region, RegionCriteria, RegionDraft, RegionPatch};
