use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_optional_text, patch_text, patch_value, Aggregate, LifecycleError, Status};
use crate::id::{CityId, RegionId};
use crate::query::{Criteria, FilterValue, PredicateBuilder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub region_id: RegionId,
    pub postal_code: Option<String>,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
}

impl City {
    pub fn region_key(&self) -> Option<FilterValue> {
        Some(self.region_id.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityDraft {
    pub name: String,
    pub region_id: RegionId,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityPatch {
    pub name: Option<String>,
    pub region_id: Option<RegionId>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub postal_code: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub region_id: Option<RegionId>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for CityCriteria {
    type Entity = City;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<City>) -> PredicateBuilder<City> {
        builder
            .contains("name", self.name.as_deref(), |c| Some(c.name.as_str().into()))
            .eq("region_id", self.region_id, City::region_key)
            .eq("postal_code", self.postal_code.as_deref(), |c| {
                c.postal_code.as_deref().map(Into::into)
            })
    }
}

impl Aggregate for City {
    type Id = CityId;
    type Draft = CityDraft;
    type Patch = CityPatch;

    const ENTITY: &'static str = "City";
    const CACHE_PREFIX: &'static str = "city";
    const NATURAL_KEY: &'static str = "name";
    const PARENT_PREFIXES: &'static [&'static str] = &["region"];

    fn id(&self) -> CityId {
        self.id
    }

    fn natural_key(&self) -> &str {
        &self.name
    }

    fn status(&self) -> Status {
        self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn from_draft(id: CityId, draft: CityDraft) -> Self {
        Self {
            id,
            name: draft.name,
            region_id: draft.region_id,
            postal_code: draft.postal_code,
            status: Status::default(),
        }
    }

    fn replace(&mut self, draft: CityDraft) {
        self.name = draft.name;
        self.region_id = draft.region_id;
        self.postal_code = draft.postal_code;
    }

    fn apply_patch(&mut self, patch: CityPatch) -> Result<(), LifecycleError> {
        patch_text("name", &mut self.name, patch.name)?;
        patch_value(&mut self.region_id, patch.region_id);
        patch_optional_text(&mut self.postal_code, patch.postal_code);
        Ok(())
    }
}
