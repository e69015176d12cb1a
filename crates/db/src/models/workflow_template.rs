//! Workflow template model.

use flowreg_core::template::{EndAction, TemplateShape, END_ACTION_NONE};
use flowreg_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use validator::Validate;

use super::double_option;

/// A row from the `workflow_templates` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkflowTemplate {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub state_schema: Value,
    pub workflow_dependencies: Option<Value>,
    pub end_action_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_action_target: Option<Value>,
    pub guidelines: Option<String>,
    pub workflow_metadata: Option<Value>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkflowTemplate {
    /// The structural fields, for validation.
    pub fn shape(&self) -> TemplateShape<'_> {
        TemplateShape {
            state_schema: &self.state_schema,
            workflow_dependencies: self.workflow_dependencies.as_ref(),
            end_action_type: &self.end_action_type,
            end_action_target: self.end_action_target.as_ref(),
        }
    }

    /// The end action fired on completion, if the template has one.
    pub fn end_action(&self) -> Option<EndAction> {
        EndAction::from_template(&self.end_action_type, self.end_action_target.as_ref())
    }
}

fn default_end_action_type() -> String {
    END_ACTION_NONE.to_string()
}

/// DTO for registering a new template.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWorkflowTemplate {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub state_schema: Value,
    #[serde(default)]
    pub workflow_dependencies: Option<Value>,
    #[serde(default = "default_end_action_type")]
    pub end_action_type: String,
    #[serde(default)]
    pub end_action_target: Option<Value>,
    pub guidelines: Option<String>,
    pub workflow_metadata: Option<Value>,
    pub is_active: Option<bool>,
}

impl CreateWorkflowTemplate {
    pub fn shape(&self) -> TemplateShape<'_> {
        TemplateShape {
            state_schema: &self.state_schema,
            workflow_dependencies: self.workflow_dependencies.as_ref(),
            end_action_type: &self.end_action_type,
            end_action_target: self.end_action_target.as_ref(),
        }
    }
}

/// DTO for a partial template update.
///
/// `workflow_dependencies` and `end_action_target` distinguish an absent key
/// (keep) from an explicit `null` (clear).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateWorkflowTemplate {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub state_schema: Option<Value>,
    #[serde(default, deserialize_with = "double_option")]
    pub workflow_dependencies: Option<Option<Value>>,
    pub end_action_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_action_target: Option<Option<Value>>,
    pub guidelines: Option<String>,
    pub workflow_metadata: Option<Value>,
    pub is_active: Option<bool>,
}

impl UpdateWorkflowTemplate {
    /// Whether any field that affects structural validity is present.
    pub fn touches_shape(&self) -> bool {
        self.state_schema.is_some()
            || self.workflow_dependencies.is_some()
            || self.end_action_type.is_some()
            || self.end_action_target.is_some()
    }

    /// Apply this update to `current`, producing the merged record that
    /// would be stored.
    pub fn merged_into(&self, current: &WorkflowTemplate) -> WorkflowTemplate {
        let mut merged = current.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = Some(description.clone());
        }
        if let Some(category) = &self.category {
            merged.category = Some(category.clone());
        }
        if let Some(schema) = &self.state_schema {
            merged.state_schema = schema.clone();
        }
        if let Some(deps) = &self.workflow_dependencies {
            merged.workflow_dependencies = deps.clone();
        }
        if let Some(action_type) = &self.end_action_type {
            merged.end_action_type = action_type.clone();
        }
        if let Some(target) = &self.end_action_target {
            merged.end_action_target = target.clone();
        }
        if let Some(guidelines) = &self.guidelines {
            merged.guidelines = Some(guidelines.clone());
        }
        if let Some(metadata) = &self.workflow_metadata {
            merged.workflow_metadata = Some(metadata.clone());
        }
        if let Some(is_active) = self.is_active {
            merged.is_active = is_active;
        }
        merged
    }
}

/// Filters for listing templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub category: Option<String>,
    pub is_active: Option<bool>,
    /// Pre-built `ILIKE` pattern matched against name and description.
    pub search_pattern: Option<String>,
}
