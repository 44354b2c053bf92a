use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_text, patch_value, Aggregate, DependentLink, LifecycleError, Status};
use crate::id::TaxId;
use crate::query::{Criteria, FilterValue, PredicateBuilder};

use super::TaxRuleDetail;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxKind {
    Vat,
    Withholding,
    Stamp,
}

impl TaxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxKind::Vat => "vat",
            TaxKind::Withholding => "withholding",
            TaxKind::Stamp => "stamp",
        }
    }
}

impl fmt::Display for TaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TaxKind> for FilterValue {
    fn from(kind: TaxKind) -> Self {
        FilterValue::Text(kind.as_str().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    pub id: TaxId,
    pub code: String,
    pub name: String,
    pub kind: TaxKind,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_details: Option<Vec<TaxRuleDetail>>,
}

impl Tax {
    pub const RULE_DETAILS: DependentLink<Tax, TaxRuleDetail> = DependentLink::new(
        "rule_details",
        "tax_id",
        TaxRuleDetail::tax_key,
        Tax::attach_rule_details,
    );

    fn attach_rule_details(&mut self, rule_details: Vec<TaxRuleDetail>) {
        self.rule_details = Some(rule_details);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxDraft {
    pub code: String,
    pub name: String,
    pub kind: TaxKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub kind: Option<TaxKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<TaxKind>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for TaxCriteria {
    type Entity = Tax;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<Tax>) -> PredicateBuilder<Tax> {
        builder
            .eq("code", self.code.as_deref(), |t| Some(t.code.as_str().into()))
            .contains("name", self.name.as_deref(), |t| Some(t.name.as_str().into()))
            .eq("kind", self.kind, |t| Some(t.kind.into()))
    }
}

impl Aggregate for Tax {
    type Id = TaxId;
    type Draft = TaxDraft;
    type Patch = TaxPatch;

    const ENTITY: &'static str = "Tax";
    const CACHE_PREFIX: &'static str = "tax";
    const NATURAL_KEY: &'static str = "code";

    fn id(&self) -> TaxId {
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

    fn from_draft(id: TaxId, draft: TaxDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            kind: draft.kind,
            status: Status::default(),
            rule_details: None,
        }
    }

    fn replace(&mut self, draft: TaxDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.kind = draft.kind;
    }

    fn apply_patch(&mut self, patch: TaxPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        patch_value(&mut self.kind, patch.kind);
        Ok(())
    }

    fn detach(&mut self) {
        self.rule_details = None;
    }
}
