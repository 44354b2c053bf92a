use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_text, patch_value, Aggregate, DependentLink, LifecycleError, Status};
use crate::id::{CountryId, RegionId};
use crate::query::{Criteria, FilterValue, PredicateBuilder};

use super::City;

/// An administrative region of a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub code: String,
    pub name: String,
    pub country_id: CountryId,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cities: Option<Vec<City>>,
}

impl Region {
    pub const CITIES: DependentLink<Region, City> =
        DependentLink::new("cities", "region_id", City::region_key, Region::attach_cities);

    pub fn country_key(&self) -> Option<FilterValue> {
        Some(self.country_id.into())
    }

    fn attach_cities(&mut self, cities: Vec<City>) {
        self.cities = Some(cities);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDraft {
    pub code: String,
    pub name: String,
    pub country_id: CountryId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub country_id: Option<CountryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub country_id: Option<CountryId>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for RegionCriteria {
    type Entity = Region;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<Region>) -> PredicateBuilder<Region> {
        builder
            .eq("code", self.code.as_deref(), |r| Some(r.code.as_str().into()))
            .contains("name", self.name.as_deref(), |r| Some(r.name.as_str().into()))
            .eq("country_id", self.country_id, Region::country_key)
    }
}

impl Aggregate for Region {
    type Id = RegionId;
    type Draft = RegionDraft;
    type Patch = RegionPatch;

    const ENTITY: &'static str = "Region";
    const CACHE_PREFIX: &'static str = "region";
    const NATURAL_KEY: &'static str = "code";
    const PARENT_PREFIXES: &'static [&'static str] = &["country"];

    fn id(&self) -> RegionId {
        self.id
    }

    fn natural_key(&self) -> &str {
        &self.code
    }

    fn status(&self) -> Status {
        self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn from_draft(id: RegionId, draft: RegionDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            country_id: draft.country_id,
            status: Status::default(),
            cities: None,
        }
    }

    fn replace(&mut self, draft: RegionDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.country_id = draft.country_id;
    }

    fn apply_patch(&mut self, patch: RegionPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        patch_value(&mut self.country_id, patch.country_id);
        Ok(())
    }

    fn detach(&mut self) {
        self.cities = None;
    }
}
