use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_text, Aggregate, DependentLink, LifecycleError, Status};
use crate::id::SectorId;
use crate::query::{Criteria, PredicateBuilder};

use super::Agency;

/// A commercial sector grouping agencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,
    pub code: String,
    pub name: String,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agencies: Option<Vec<Agency>>,
}

impl Sector {
    pub const AGENCIES: DependentLink<Sector, Agency> = DependentLink::new(
        "agencies",
        "sector_id",
        Agency::sector_key,
        Sector::attach_agencies,
    );

    fn attach_agencies(&mut self, agencies: Vec<Agency>) {
        self.agencies = Some(agencies);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorDraft {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorPatch {
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for SectorCriteria {
    type Entity = Sector;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<Sector>) -> PredicateBuilder<Sector> {
        builder
            .eq("code", self.code.as_deref(), |s| Some(s.code.as_str().into()))
            .contains("name", self.name.as_deref(), |s| Some(s.name.as_str().into()))
    }
}

impl Aggregate for Sector {
    type Id = SectorId;
    type Draft = SectorDraft;
    type Patch = SectorPatch;

    const ENTITY: &'static str = "Sector";
    const CACHE_PREFIX: &'static str = "sector";
    const NATURAL_KEY: &'static str = "code";

    fn id(&self) -> SectorId {
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

    fn from_draft(id: SectorId, draft: SectorDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            status: Status::default(),
            agencies: None,
        }
    }

    fn replace(&mut self, draft: SectorDraft) {
        self.code = draft.code;
        self.name = draft.name;
    }

    fn apply_patch(&mut self, patch: SectorPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        Ok(())
    }

    fn detach(&mut self) {
        self.agencies = None;
    }
}
