use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_text, patch_value, Aggregate, LifecycleError, Status};
use crate::id::{ProductId, ProductServiceId};
use crate::query::{Criteria, FilterValue, PredicateBuilder};

/// A service offered under a product (e.g. cash-out under a transfer product).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductService {
    pub id: ProductServiceId,
    pub code: String,
    pub name: String,
    pub product_id: ProductId,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
}

impl ProductService {
    pub fn product_key(&self) -> Option<FilterValue> {
        Some(self.product_id.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductServiceDraft {
    pub code: String,
    pub name: String,
    pub product_id: ProductId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductServicePatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub product_id: Option<ProductId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductServiceCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for ProductServiceCriteria {
    type Entity = ProductService;

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
        builder: PredicateBuilder<ProductService>,
    ) -> PredicateBuilder<ProductService> {
        builder
            .eq("code", self.code.as_deref(), |s| Some(s.code.as_str().into()))
            .contains("name", self.name.as_deref(), |s| Some(s.name.as_str().into()))
            .eq("product_id", self.product_id, ProductService::product_key)
    }
}

impl Aggregate for ProductService {
    type Id = ProductServiceId;
    type Draft = ProductServiceDraft;
    type Patch = ProductServicePatch;

    const ENTITY: &'static str = "ProductService";
    const CACHE_PREFIX: &'static str = "product_service";
    const NATURAL_KEY: &'static str = "code";
    const PARENT_PREFIXES: &'static [&'static str] = &["product"];

    fn id(&self) -> ProductServiceId {
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

    fn from_draft(id: ProductServiceId, draft: ProductServiceDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            product_id: draft.product_id,
            status: Status::default(),
        }
    }

    fn replace(&mut self, draft: ProductServiceDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.product_id = draft.product_id;
    }

    fn apply_patch(&mut self, patch: ProductServicePatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        patch_value(&mut self.product_id, patch.product_id);
        Ok(())
    }
}
