use serde::{Deserialize, Serialize};

use crate::aggregate::{patch_optional_text, patch_text, patch_value, Aggregate, LifecycleError, Status};
use crate::id::{ParamTypeId, TypeDefinitionId};
use crate::query::{Criteria, FilterValue, PredicateBuilder};

/// One allowed value of a [`TypeDefinition`](super::TypeDefinition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamType {
    pub id: ParamTypeId,
    pub code: String,
    pub label: String,
    pub value: Option<String>,
    pub type_definition_id: TypeDefinitionId,
    #[serde(rename = "is_enabled")]
    pub(crate) status: Status,
}

impl ParamType {
    pub fn type_definition_key(&self) -> Option<FilterValue> {
        Some(self.type_definition_id.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTypeDraft {
    pub code: String,
    pub label: String,
    pub value: Option<String>,
    pub type_definition_id: TypeDefinitionId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamTypePatch {
    pub code: Option<String>,
    pub label: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::serde_ext::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Option<String>>,
    pub type_definition_id: Option<TypeDefinitionId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamTypeCriteria {
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_ext::deserialize_optional_string")]
    pub label: Option<String>,
    #[serde(default)]
    pub type_definition_id: Option<TypeDefinitionId>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl Criteria for ParamTypeCriteria {
    type Entity = ParamType;

    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    fn filters(&self, builder: PredicateBuilder<ParamType>) -> PredicateBuilder<ParamType> {
        builder
            .eq("code", self.code.as_deref(), |p| Some(p.code.as_str().into()))
            .contains("label", self.label.as_deref(), |p| Some(p.label.as_str().into()))
            .eq(
                "type_definition_id",
                self.type_definition_id,
                ParamType::type_definition_key,
            )
    }
}

impl Aggregate for ParamType {
    type Id = ParamTypeId;
    type Draft = ParamTypeDraft;
    type Patch = ParamTypePatch;

    const ENTITY: &'static str = "ParamType";
    const CACHE_PREFIX: &'static str = "param_type";
    const NATURAL_KEY: &'static str = "code";
    const PARENT_PREFIXES: &'static [&'static str] = &["type_definition"];

    fn id(&self) -> ParamTypeId {
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

    fn from_draft(id: ParamTypeId, draft: ParamTypeDraft) -> Self {
        Self {
            id,
            code: draft.code,
            label: draft.label,
            value: draft.value,
            type_definition_id: draft.type_definition_id,
            status: Status::default(),
        }
    }

    fn replace(&mut self, draft: ParamTypeDraft) {
        self.code = draft.code;
        self.label = draft.label;
        self.value = draft.value;
        self.type_definition_id = draft.type_definition_id;
    }

    fn apply_patch(&mut self, patch: ParamTypePatch) -> Result<(), LifecycleError> {
        patch_text("code", &mut self.code, patch.code)?;
        patch_text("label", &mut self.label, patch.label)?;
        patch_optional_text(&mut self.value, patch.value);
        patch_value(&mut self.type_definition_id, patch.type_definition_id);
        Ok(())
    }
}
