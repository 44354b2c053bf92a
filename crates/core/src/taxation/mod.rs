//! Taxes and their rate lines.

mod tax;
mod tax_rule_detail;

pub use tax::{Tax, TaxCriteria, TaxDraft, TaxKind, TaxPatch};
pub use tax_rule_detail::{
    TaxRuleDetail, TaxRuleDetailCriteria, TaxRuleDetailDraft, TaxRuleDetailPatch, MAX_RATE_BPS,
};
