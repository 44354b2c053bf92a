use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_optional_text, patch_text, patch_value, Aggregate, DependentLink, LifecycleError, Status};
use crate::id::ProductId;
use crate::query::{Criteria, PredicateBuilder};

use super::ProductService;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<ProductService>>,
}

impl Product {
    pub const SERVICES: DependentLink<Product, ProductService> = DependentLink::new(
        "services",
        "product_id",
        ProductService::product_key,
        Product::attach_services,
    );

    fn attach_services(&mut self, services: Vec<ProductService>) {
        self.services = Some(services);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCriteria {
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

impl Criteria for ProductCriteria {
    type Entity = Product;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<Product>) -> PredicateBuilder<Product> {
        builder
            .eq("code", self.code.as_deref(), |p| Some(p.code.as_str().into()))
            .contains("name", self.name.as_deref(), |p| Some(p.name.as_str().into()))
    }
}

impl Aggregate for Product {
    type Id = ProductId;
    type Draft = ProductDraft;
    type Patch = ProductPatch;

    const ENTITY: &'static str = "Product";
    const CACHE_PREFIX: &'static str = "product";
    const NATURAL_KEY: &'static str = "code";

    fn id(&self) -> ProductId {
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

    fn from_draft(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            code: draft.code,
            name: draft.name,
            description: draft.description,
            status: Status::default(),
            services: None,
        }
    }

    fn replace(&mut self, draft: ProductDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.description = draft.description;
    }

    fn apply_patch(&mut self, patch: ProductPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("name", &mut self.name, patch.name)?;
        patch_optional_text(&mut self.description, patch.description);
        Ok(())
    }

    fn detach(&mut self) {
        self.services = None;
    }
}
