use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_text, patch_value, Aggregate, DependentLink, LifecycleError, Status};
use crate::id::{CurrencyId, MonetaryZoneId};
use crate::query::{Criteria, PredicateBuilder};

use super::Country;

/// A group of countries sharing a currency (e.g. UEMOA, CEMAC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryZone {
    pub id: MonetaryZoneId,
    pub code: String,
    pub name: String,
    pub currency_id: Option<CurrencyId>,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<Country>>,
}

impl MonetaryZone {
    pub const COUNTRIES: DependentLink<MonetaryZone, Country> = DependentLink::new(
        "countries",
        "monetary_zone_id",
        Country::monetary_zone_key,
        MonetaryZone::attach_countries,
    );

    fn attach_countries(&mut self, countries: Vec<Country>) {
        self.countries = Some(countries);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryZoneDraft {
    pub code: String,
    pub name: String,
    pub currency_id: Option<CurrencyId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonetaryZonePatch {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency_id: Option<Option<CurrencyId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonetaryZoneCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub currency_id: Option<CurrencyId>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for MonetaryZoneCriteria {
    type Entity = MonetaryZone;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<MonetaryZone>) -> PredicateBuilder<MonetaryZone> {
        builder
            .eq("code", self.code.as_deref(), |z| Some(z.code.as_str().into()))
            .contains("name", self.name.as_deref(), |z| Some(z.name.as_str().into()))
            .eq("currency_id", self.currency_id, |z| z.currency_id.map(Into::into))
    }
}

impl Aggregate for MonetaryZone {
    type Id = MonetaryZoneId;
    type Draft = MonetaryZoneDraft;
    type Patch = MonetaryZonePatch;

    const ENTITY: &'static str = "MonetaryZone";
    const CACHE_PREFIX: &'static str = "monetary_zone";
    const NATURAL_KEY: &'static str = "code";

    fn id(&self) -> MonetaryZoneId {
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

    fn from_draft(id: MonetaryZoneId, draft: MonetaryZoneDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            currency_id: draft.currency_id,
            status: Status::default(),
            countries: None,
        }
    }

    fn replace(&mut self, draft: MonetaryZoneDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.currency_id = draft.currency_id;
    }

    fn apply_patch(&mut self, patch: MonetaryZonePatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        patch_value(&mut self.currency_id, patch.currency_id);
        Ok(())
    }

    fn detach(&mut self) {
        self.countries = None;
    }
}
