use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_optional_text, patch_text, patch_value, Aggregate, LifecycleError, Status};
use crate::id::{TaxId, TaxRuleDetailId};
use crate::query::{Criteria, FilterValue, PredicateBuilder};

/// Rates are expressed in basis points; 10 000 is 100%.
pub const MAX_RATE_BPS: u32 = 10_000;

/// One rate line of a [`Tax`](super::Tax).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRuleDetail {
    pub id: TaxRuleDetailId,
    pub code: String,
    pub rate_bps: u32,
    pub description: Option<String>,
    pub tax_id: TaxId,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
}

impl TaxRuleDetail {
    pub fn tax_key(&self) -> Option<FilterValue> {
        Some(self.tax_id.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRuleDetailDraft {
    pub code: String,
    pub rate_bps: u32,
    pub description: Option<String>,
    pub tax_id: TaxId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxRuleDetailPatch {
    pub code: Option<String>,
    pub rate_bps: Option<u32>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    pub tax_id: Option<TaxId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxRuleDetailCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default)]
    pub tax_id: Option<TaxId>,
    #[serde(default)]
    pub rate_bps: Option<u32>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for TaxRuleDetailCriteria {
    type Entity = TaxRuleDetail;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(
        &self,
        builder: PredicateBuilder<TaxRuleDetail>,
    ) -> PredicateBuilder<TaxRuleDetail> {
        builder
            .eq("code", self.code.as_deref(), |d| Some(d.code.as_str().into()))
            .eq("tax_id", self.tax_id, TaxRuleDetail::tax_key)
            .eq("rate_bps", self.rate_bps.map(i64::from), |d| {
                Some(i64::from(d.rate_bps).into())
            })
    }
}

fn check_rate(rate_bps: u32) -> Result<u32, LifecycleError> {
    if rate_bps > MAX_RATE_BPS {
        return Err(LifecycleError::Validation {
            field: "rate_bps",
            reason: format!("{rate_bps} exceeds {MAX_RATE_BPS}"),
        });
    }
    Ok(rate_bps)
}

impl Aggregate for TaxRuleDetail {
    type Id = TaxRuleDetailId;
    type Draft = TaxRuleDetailDraft;
    type Patch = TaxRuleDetailPatch;

    const ENTITY: &'static str = "TaxRuleDetail";
    const CACHE_PREFIX: &'static str = "tax_rule_detail";
    const NATURAL_KEY: &'static str = "code";
    const PARENT_PREFIXES: &'static [&'static str] = &["tax"];

    fn id(&self) -> TaxRuleDetailId {
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

    fn validate_draft(draft: &TaxRuleDetailDraft) -> Result<(), LifecycleError> {
        check_rate(draft.rate_bps).map(|_| ())
    }

    fn from_draft(id: TaxRuleDetailId, draft: TaxRuleDetailDraft) -> Self {
        Self {
            id,
            code: draft.code,
            rate_bps: draft.rate_bps,
            description: draft.description,
            tax_id: draft.tax_id,
            status: Status::default(),
        }
    }

    fn replace(&mut self, draft: TaxRuleDetailDraft) {
        self.code = draft.code;
        self.rate_bps = draft.rate_bps;
        self.description = draft.description;
        self.tax_id = draft.tax_id;
    }

    fn apply_patch(&mut self, patch: TaxRuleDetailPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_value(&mut self.rate_bps, patch.rate_bps.map(check_rate).transpose()?);
        patch_optional_text(&mut self.description, patch.description);
        patch_value(&mut self.tax_id, patch.tax_id);
        Ok(())
    }
}
