use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_text, Aggregate, DependentLink, LifecycleError, Status};
use crate::id::TypeDefinitionId;
use crate::query::{Criteria, PredicateBuilder};

use super::ParamType;

/// A family of configurable parameters (e.g. `DOCUMENT_TYPE`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub id: TypeDefinitionId,
    pub code: String,
    pub label: String,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_types: Option<Vec<ParamType>>,
}

impl TypeDefinition {
    pub const PARAM_TYPES: DependentLink<TypeDefinition, ParamType> = DependentLink::new(
        "param_types",
        "type_definition_id",
        ParamType::type_definition_key,
        TypeDefinition::attach_param_types,
    );

    fn attach_param_types(&mut self, param_types: Vec<ParamType>) {
        self.param_types = Some(param_types);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinitionDraft {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinitionPatch {
    pub code: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinitionCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub label: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for TypeDefinitionCriteria {
    type Entity = TypeDefinition;

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
        builder: PredicateBuilder<TypeDefinition>,
    ) -> PredicateBuilder<TypeDefinition> {
        builder
            .eq("code", self.code.as_deref(), |t| Some(t.code.as_str().into()))
            .contains("label", self.label.as_deref(), |t| Some(t.label.as_str().into()))
    }
}

impl Aggregate for TypeDefinition {
    type Id = TypeDefinitionId;
    type Draft = TypeDefinitionDraft;
    type Patch = TypeDefinitionPatch;

    const ENTITY: &'static str = "TypeDefinition";
    const CACHE_PREFIX: &'static str = "type_definition";
    const NATURAL_KEY: &'static str = "code";

    fn id(&self) -> TypeDefinitionId {
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

    fn from_draft(id: TypeDefinitionId, draft: TypeDefinitionDraft) -> Self {
        Self {
            id,
            code: draft.code,
            label: draft.label,
            status: Status::default(),
            param_types: None,
        }
    }

    fn replace(&mut self, draft: TypeDefinitionDraft) {
        self.code = draft.code;
        self.label = draft.label;
    }

    fn apply_patch(&mut self, patch: TypeDefinitionPatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("label", &mut self.label, patch.label)?;
        Ok(())
    }

    fn detach(&mut self) {
        self.param_types = None;
    }
}
