use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_text, patch_value, Aggregate, LifecycleError, Status};
use crate::id::{BankAccountId, BankId, CurrencyId};
use crate::query::{Criteria, FilterValue, PredicateBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Current,
    Savings,
    Settlement,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Current => "current",
            AccountKind::Savings => "savings",
            AccountKind::Settlement => "settlement",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AccountKind> for FilterValue {
    fn from(kind: AccountKind) -> Self {
        FilterValue::Text(kind.as_str().to_string())
    }
}

/// An account held at a bank, keyed by its account number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub account_number: String,
    pub holder: String,
    pub kind: AccountKind,
    pub bank_id: BankId,
    pub currency_id: Option<CurrencyId>,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
}

impl BankAccount {
    pub fn bank_key(&self) -> Option<FilterValue> {
        Some(self.bank_id.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccountDraft {
    pub account_number: String,
    pub holder: String,
    pub kind: AccountKind,
    pub bank_id: BankId,
    pub currency_id: Option<CurrencyId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankAccountPatch {
    pub account_number: Option<String>,
    pub holder: Option<String>,
    pub kind: Option<AccountKind>,
    pub bank_id: Option<BankId>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency_id: Option<Option<CurrencyId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankAccountCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub account_number: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub holder: Option<String>,
    #[serde(default)]
    pub kind: Option<AccountKind>,
    #[serde(default)]
    pub bank_id: Option<BankId>,
    #[serde(default)]
    pub currency_id: Option<CurrencyId>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for BankAccountCriteria {
    type Entity = BankAccount;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<BankAccount>) -> PredicateBuilder<BankAccount> {
        builder
            .eq("account_number", self.account_number.as_deref(), |a| {
                Some(a.account_number.as_str().into())
            })
            .contains("holder", self.holder.as_deref(), |a| Some(a.holder.as_str().into()))
            .eq("kind", self.kind, |a| Some(a.kind.into()))
            .eq("bank_id", self.bank_id, BankAccount::bank_key)
            .eq("currency_id", self.currency_id, |a| a.currency_id.map(Into::into))
    }
}

impl Aggregate for BankAccount {
    type Id = BankAccountId;
    type Draft = BankAccountDraft;
    type Patch = BankAccountPatch;

    const ENTITY: &'static str = "BankAccount";
    const CACHE_PREFIX: &'static str = "bank_account";
    const NATURAL_KEY: &'static str = "account_number";
    const PARENT_PREFIXES: &'static [&'static str] = &["bank"];

    fn id(&self) -> BankAccountId {
        self.id
    }

    fn natural_key(&self) -> &str {
        &self.account_number
    }

    fn status(&self) -> Status {
        self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn from_draft(id: BankAccountId, draft: BankAccountDraft) -> Self {
        Self {
            id,
            account_number: draft.account_number,
            holder: draft.holder,
            kind: draft.kind,
            bank_id: draft.bank_id,
            currency_id: draft.currency_id,
            status: Status::default(),
        }
    }

    fn replace(&mut self, draft: BankAccountDraft) {
        self.account_number = draft.account_number;
        self.holder = draft.holder;
        self.kind = draft.kind;
        self.bank_id = draft.bank_id;
        self.currency_id = draft.currency_id;
    }

    fn apply_patch(&mut self, patch: BankAccountPatch) -> Result<(), LifecycleError> {
        patch_text("account_number", &mut self.account_number, patch.account_number)?;
        patch_text("holder", &mut self.holder, patch.holder)?;
        patch_value(&mut self.kind, patch.kind);
        patch_value(&mut self.bank_id, patch.bank_id);
        patch_value(&mut self.currency_id, patch.currency_id);
        Ok(())
    }
}
