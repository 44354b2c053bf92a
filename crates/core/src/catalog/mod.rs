//! Parameter catalogues and products.

mod param_type;
mod product;
mod product_service;
mod type_definition;

pub use param_type::{ParamType, ParamTypeCriteria, ParamTypeDraft, ParamTypePatch};
pub use product::{Product, ProductCriteria, ProductDraft, ProductPatch};
pub use product_service::{
    ProductService, ProductServiceCriteria, ProductServiceDraft, ProductServicePatch,
};
pub use type_definition::{
    TypeDefinition, TypeDefinitionCriteria, TypeDefinitionDraft, TypeDefinitionPatch,
};
