use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_optional_text, patch_text, patch_value, Aggregate, DependentLink, LifecycleError, Status};
use crate::id::{BankId, CountryId};
use crate::query::{Criteria, PredicateBuilder};

use super::BankAccount;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,
    pub code: String,
    pub name: String,
    pub swift_code: Option<String>,
    pub country_id: Option<CountryId>,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<BankAccount>>,
}

impl Bank {
    pub const ACCOUNTS: DependentLink<Bank, BankAccount> = DependentLink::new(
        "accounts",
        "bank_id",
        BankAccount::bank_key,
        Bank::attach_accounts,
    );

    fn attach_accounts(&mut self, accounts: Vec<BankAccount>) {
        self.accounts = Some(accounts);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankDraft {
    pub code: String,
    pub name: String,
    pub swift_code: Option<String>,
    pub country_id: Option<CountryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub swift_code: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub country_id: Option<Option<CountryId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub swift_code: Option<String>,
    #[serde(default)]
    pub country_id: Option<CountryId>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for BankCriteria {
    type Entity = Bank;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<Bank>) -> PredicateBuilder<Bank> {
        builder
            .eq("code", self.code.as_deref(), |b| Some(b.code.as_str().into()))
            .contains("name", self.name.as_deref(), |b| Some(b.name.as_str().into()))
            .eq("swift_code", self.swift_code.as_deref(), |b| {
                b.swift_code.as_deref().map(Into::into)
            })
            .eq("country_id", self.country_id, |b| b.country_id.map(Into::into))
    }
}

impl Aggregate for Bank {
    type Id = BankId;
    type Draft = BankDraft;
    type Patch = BankPatch;

    const ENTITY: &'static str = "Bank";
    const CACHE_PREFIX: &'static str = "bank";
    const NATURAL_KEY: &'static str = "code";

    fn id(&self) -> BankId {
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

    fn from_draft(id: BankId, draft: BankDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            swift_code: draft.swift_code,
            country_id: draft.country_id,
            status: Status::default(),
            accounts: None,
        }
    }

    fn replace(&mut self, draft: BankDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.swift_code = draft.swift_code;
        self.country_id = draft.country_id;
    }

    fn apply_patch(&mut self, patch: BankPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        patch_optional_text(&mut self.swift_code, patch.swift_code);
        patch_value(&mut self.country_id, patch.country_id);
        Ok(())
    }

    fn detach(&mut self) {
        self.accounts = None;
    }
}
