use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_optional_text, patch_text, patch_value, Aggregate, LifecycleError, Status};
use crate::id::CurrencyId;
use crate::query::{Criteria, PredicateBuilder};

/// An ISO 4217 currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    /// Minor units (2 for MAD, 0 for XOF).
    pub decimals: u8,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyDraft {
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    pub decimals: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub symbol: Option<Option<String>>,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyCriteria {
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

impl Criteria for CurrencyCriteria {
    type Entity = Currency;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<Currency>) -> PredicateBuilder<Currency> {
        builder
            .eq("code", self.code.as_deref(), |c| Some(c.code.as_str().into()))
            .contains("name", self.name.as_deref(), |c| Some(c.name.as_str().into()))
    }
}

impl Aggregate for Currency {
    type Id = CurrencyId;
    type Draft = CurrencyDraft;
    type Patch = CurrencyPatch;

    const ENTITY: &'static str = "Currency";
    const CACHE_PREFIX: &'static str = "currency";
    const NATURAL_KEY: &'static str = "code";

    fn id(&self) -> CurrencyId {
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

    fn from_draft(id: CurrencyId, draft: CurrencyDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            symbol: draft.symbol,
            decimals: draft.decimals,
            status: Status::default(),
        }
    }

    fn replace(&mut self, draft: CurrencyDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.symbol = draft.symbol;
        self.decimals = draft.decimals;
    }

    fn apply_patch(&mut self, patch: CurrencyPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        patch_optional_text(&mut self.symbol, patch.symbol);
        if let Some(decimals) = patch.decimals {
            if decimals > 4 {
                return Err(LifecycleError::Validation {
                    field: "decimals",
                    reason: format!("{decimals} exceeds 4 minor units"),
                });
            }
            self.decimals = decimals;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirham() -> Currency {
        Currency::from_draft(
            CurrencyId::new(),
            CurrencyDraft {
                code: "MAD".to_string(),
                name: "Moroccan dirham".to_string(),
                symbol: None,
                decimals: 2,
            },
        )
    }

    #[test]
    fn test_patch_decimals_out_of_range() {
        let mut currency = dirham();
        let result = currency.apply_patch(CurrencyPatch {
            decimals: Some(9),
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(LifecycleError::Validation {
                field: "decimals",
                ..
            })
        ));
        assert_eq!(currency.decimals, 2);
    }

    #[test]
    fn test_patch_symbol() {
        let mut currency = dirham();
        currency
            .apply_patch(CurrencyPatch {
                symbol: Some(Some("DH".to_string())),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(currency.symbol.as_deref(), Some("DH"));
    }

    #[test]
    fn test_patch_null_clears_symbol() {
        let mut currency = dirham();
        currency.symbol = Some("DH".to_string());

        currency.apply_patch(CurrencyPatch::default()).unwrap();
        assert_eq!(currency.symbol.as_deref(), Some("DH"));

        let patch: CurrencyPatch = serde_json::from_str(r#"{"symbol": null}"#).unwrap();
        currency.apply_patch(patch).unwrap();
        assert_eq!(currency.symbol, None);
    }

    #[test]
    fn test_patch_blank_symbol_clears_it() {
        let mut currency = dirham();
        currency.symbol = Some("DH".to_string());
        currency
            .apply_patch(CurrencyPatch {
                symbol: Some(Some("  ".to_string())),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(currency.symbol, None);
    }
}
