use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_optional_text, patch_text, patch_value, Aggregate, LifecycleError, Status};
use crate::id::{AgencyId, CityId, SectorId};
use crate::query::{Criteria, FilterValue, PredicateBuilder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub id: AgencyId,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub sector_id: SectorId,
    pub city_id: Option<CityId>,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
}

impl Agency {
    pub fn sector_key(&self) -> Option<FilterValue> {
        Some(self.sector_id.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyDraft {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub sector_id: SectorId,
    pub city_id: Option<CityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgencyPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<Option<String>>,
    pub sector_id: Option<SectorId>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub city_id: Option<Option<CityId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgencyCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub sector_id: Option<SectorId>,
    #[serde(default)]
    pub city_id: Option<CityId>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for AgencyCriteria {
    type Entity = Agency;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<Agency>) -> PredicateBuilder<Agency> {
        builder
            .eq("code", self.code.as_deref(), |a| Some(a.code.as_str().into()))
            .contains("name", self.name.as_deref(), |a| Some(a.name.as_str().into()))
            .eq("sector_id", self.sector_id, Agency::sector_key)
            .eq("city_id", self.city_id, |a| a.city_id.map(Into::into))
    }
}

impl Aggregate for Agency {
    type Id = AgencyId;
    type Draft = AgencyDraft;
    type Patch = AgencyPatch;

    const ENTITY: &'static str = "Agency";
    const CACHE_PREFIX: &'static str = "agency";
    const NATURAL_KEY: &'static str = "code";
    const PARENT_PREFIXES: &'static [&'static str] = &["sector"];

    fn id(&self) -> AgencyId {
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

    fn from_draft(id: AgencyId, draft: AgencyDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            address: draft.address,
            sector_id: draft.sector_id,
            city_id: draft.city_id,
            status: Status::default(),
        }
    }

    fn replace(&mut self, draft: AgencyDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.address = draft.address;
        self.sector_id = draft.sector_id;
        self.city_id = draft.city_id;
    }

    fn apply_patch(&mut self, patch: AgencyPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        patch_optional_text(&mut self.address, patch.address);
        patch_value(&mut self.sector_id, patch.sector_id);
        patch_value(&mut self.city_id, patch.city_id);
        Ok(())
    }
}
