use serde::{Deserialize, Serialize};

use crate::aggregate::{
    patch_optional_text, patch_text, patch_value, Aggregate, DependentLink, LifecycleError, Status,
};
use crate::id::{CountryId, MonetaryZoneId};
use crate::query::{Criteria, FilterValue, PredicateBuilder};

use super::Region;

/// A country, keyed by its ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub code: String,
    pub name: String,
    pub iso3: Option<String>,
    pub monetary_zone_id: Option<MonetaryZoneId>,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<Region>>,
}

impl Country {
    /// Regions of the country. Live regions block disabling it.
    pub const REGIONS: DependentLink<Country, Region> = DependentLink::new(
        "regions",
        "country_id",
        Region::country_key,
        Country::attach_regions,
    );

    pub fn monetary_zone_key(&self) -> Option<FilterValue> {
        self.monetary_zone_id.map(Into::into)
    }

    fn attach_regions(&mut self, regions: Vec<Region>) {
        self.regions = Some(regions);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryDraft {
    pub code: String,
    pub name: String,
    pub iso3: Option<String>,
    pub monetary_zone_id: Option<MonetaryZoneId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub iso3: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub monetary_zone_id: Option<Option<MonetaryZoneId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub monetary_zone_id: Option<MonetaryZoneId>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for CountryCriteria {
    type Entity = Country;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<Country>) -> PredicateBuilder<Country> {
        builder
            .eq("code", self.code.as_deref(), |c| Some(c.code.as_str().into()))
            .contains("name", self.name.as_deref(), |c| Some(c.name.as_str().into()))
            .eq("monetary_zone_id", self.monetary_zone_id, Country::monetary_zone_key)
    }
}

impl Aggregate for Country {
    type Id = CountryId;
    type Draft = CountryDraft;
    type Patch = CountryPatch;

    const ENTITY: &'static str = "Country";
    const CACHE_PREFIX: &'static str = "country";
    const NATURAL_KEY: &'static str = "code";
    const PARENT_PREFIXES: &'static [&'static str] = &["monetary_zone"];

    fn id(&self) -> CountryId {
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

    fn from_draft(id: CountryId, draft: CountryDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            iso3: draft.iso3,
            monetary_zone_id: draft.monetary_zone_id,
            status: Status::default(),
            regions: None,
        }
    }

    fn replace(&mut self, draft: CountryDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.iso3 = draft.iso3;
        self.monetary_zone_id = draft.monetary_zone_id;
    }

    fn apply_patch(&mut self, patch: CountryPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        patch_optional_text(&mut self.iso3, patch.iso3);
        patch_value(&mut self.monetary_zone_id, patch.monetary_zone_id);
        Ok(())
    }

    fn detach(&mut self) {
        self.regions = None;
    }
}
