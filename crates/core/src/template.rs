//! Workflow template structural validation.
//!
//! Templates arrive as loosely-typed JSON (`state_schema`,
//! `workflow_dependencies`, `end_action_target`). These rules check the shape
//! of that JSON before it is persisted. `state_schema` itself is opaque: only
//! "is an object" is enforced.
//!
//! Every error message starts with the offending field path so callers can
//! correct the request, e.g. `workflow_dependencies[1].api.method: ...`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dependency::{DEPENDENCY_KIND_API, DEPENDENCY_KIND_WORKFLOW};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a template name.
pub const MAX_TEMPLATE_NAME_LEN: usize = 255;

pub const END_ACTION_API_CALL: &str = "api_call";
pub const END_ACTION_WORKFLOW: &str = "workflow";
pub const END_ACTION_NONE: &str = "none";

/// All valid `end_action_type` values.
pub const VALID_END_ACTION_TYPES: &[&str] =
    &[END_ACTION_API_CALL, END_ACTION_WORKFLOW, END_ACTION_NONE];

pub const ON_FAILURE_WORKFLOW: &str = "workflow";
pub const ON_FAILURE_API_CALL: &str = "api_call";

/// All valid `on_failure.action_type` values.
pub const VALID_ON_FAILURE_ACTIONS: &[&str] = &[ON_FAILURE_WORKFLOW, ON_FAILURE_API_CALL];

/// HTTP methods accepted in API configurations.
pub const VALID_HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

const METHOD_GET: &str = "GET";

// ---------------------------------------------------------------------------
// End action
// ---------------------------------------------------------------------------

/// The terminal side effect fired when a workflow completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndActionType {
    ApiCall,
    Workflow,
    None,
}

impl EndActionType {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            END_ACTION_API_CALL => Ok(Self::ApiCall),
            END_ACTION_WORKFLOW => Ok(Self::Workflow),
            END_ACTION_NONE => Ok(Self::None),
            _ => Err(CoreError::Validation(format!(
                "end_action_type: invalid value '{s}'. Must be one of: {}",
                VALID_END_ACTION_TYPES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiCall => END_ACTION_API_CALL,
            Self::Workflow => END_ACTION_WORKFLOW,
            Self::None => END_ACTION_NONE,
        }
    }
}

/// A configured end action with its target, handed to the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndAction {
    pub action_type: EndActionType,
    pub target: Value,
}

impl EndAction {
    /// Build the end action for a stored template, or `None` when the
    /// template has no end action (`none`, unknown type, or missing target).
    pub fn from_template(end_action_type: &str, target: Option<&Value>) -> Option<Self> {
        let action_type = EndActionType::from_str_value(end_action_type).ok()?;
        if action_type == EndActionType::None {
            return None;
        }
        let target = target.filter(|t| !t.is_null())?;
        Some(Self {
            action_type,
            target: target.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Template shape
// ---------------------------------------------------------------------------

/// The template fields that take part in structural validation.
#[derive(Debug, Clone, Copy)]
pub struct TemplateShape<'a> {
    pub state_schema: &'a Value,
    pub workflow_dependencies: Option<&'a Value>,
    pub end_action_type: &'a str,
    pub end_action_target: Option<&'a Value>,
}

/// Run every structural rule against a complete (created or merged) template.
pub fn validate_template_shape(shape: &TemplateShape<'_>) -> Result<(), CoreError> {
    validate_state_schema(shape.state_schema)?;
    validate_dependencies(shape.workflow_dependencies)?;
    validate_end_action(shape.end_action_type, shape.end_action_target)
}

/// Validate a template name: non-blank and within length limit.
pub fn validate_template_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(invalid("name", "must not be empty"));
    }
    if name.chars().count() > MAX_TEMPLATE_NAME_LEN {
        return Err(invalid(
            "name",
            &format!("too long (max {MAX_TEMPLATE_NAME_LEN} characters)"),
        ));
    }
    Ok(())
}

/// `state_schema` must be a JSON object. Its contents are not interpreted.
pub fn validate_state_schema(state_schema: &Value) -> Result<(), CoreError> {
    if state_schema.is_object() {
        Ok(())
    } else {
        Err(invalid("state_schema", "must be a JSON object"))
    }
}

/// Validate the `workflow_dependencies` list. `None`, `null` and `[]` are
/// all "no dependencies".
pub fn validate_dependencies(dependencies: Option<&Value>) -> Result<(), CoreError> {
    let Some(value) = dependencies.filter(|v| !v.is_null()) else {
        return Ok(());
    };
    let Some(entries) = value.as_array() else {
        return Err(invalid("workflow_dependencies", "must be a list"));
    };
    for (index, entry) in entries.iter().enumerate() {
        validate_dependency(index, entry)?;
    }
    Ok(())
}

fn validate_dependency(index: usize, entry: &Value) -> Result<(), CoreError> {
    let path = format!("workflow_dependencies[{index}]");
    let Some(dep) = entry.as_object() else {
        return Err(invalid(&path, "must be a dependency object"));
    };

    match dep.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => {}
        Some(_) => return Err(invalid(&format!("{path}.name"), "must be a non-empty string")),
        None => return Err(invalid(&format!("{path}.name"), "is required")),
    }

    let kind = match dep.get("kind") {
        None | Some(Value::Null) => DEPENDENCY_KIND_WORKFLOW,
        Some(Value::String(k)) if k == DEPENDENCY_KIND_WORKFLOW || k == DEPENDENCY_KIND_API => {
            k.as_str()
        }
        Some(_) => {
            return Err(invalid(
                &format!("{path}.kind"),
                &format!("must be one of: {DEPENDENCY_KIND_WORKFLOW}, {DEPENDENCY_KIND_API}"),
            ))
        }
    };

    // api
    let api_path = format!("{path}.api");
    let api = required_object(dep.get("api"), &api_path)?;
    required_string(api.get("endpoint"), &format!("{api_path}.endpoint"))?;
    let method = required_method(api.get("method"), &format!("{api_path}.method"))?;
    if kind == DEPENDENCY_KIND_WORKFLOW && method != METHOD_GET {
        return Err(invalid(
            &format!("{api_path}.method"),
            "must be 'GET' for workflow dependencies",
        ));
    }
    for field in ["headers", "query_params", "body"] {
        optional_string_list(api.get(field), &format!("{api_path}.{field}"))?;
    }
    let has_body = api
        .get("body")
        .and_then(Value::as_array)
        .is_some_and(|keys| !keys.is_empty());
    if method == METHOD_GET && has_body {
        return Err(invalid(
            &format!("{api_path}.body"),
            "must be null or empty for GET requests",
        ));
    }

    // on_failure
    let fail_path = format!("{path}.on_failure");
    let on_failure = required_object(dep.get("on_failure"), &fail_path)?;
    let action_type = required_string(
        on_failure.get("action_type"),
        &format!("{fail_path}.action_type"),
    )?;
    if !VALID_ON_FAILURE_ACTIONS.contains(&action_type) {
        return Err(invalid(
            &format!("{fail_path}.action_type"),
            &format!("must be one of: {}", VALID_ON_FAILURE_ACTIONS.join(", ")),
        ));
    }
    let target_path = format!("{fail_path}.action_target");
    let target = required_object(on_failure.get("action_target"), &target_path)?;
    if action_type == ON_FAILURE_WORKFLOW {
        required_string(target.get("workflow_id"), &format!("{target_path}.workflow_id"))?;
    } else {
        required_string(target.get("endpoint"), &format!("{target_path}.endpoint"))?;
        required_method(target.get("method"), &format!("{target_path}.method"))?;
    }

    Ok(())
}

/// Enforce the `end_action_type` / `end_action_target` cross-field rule.
///
/// - `none`: target must be absent or `null`.
/// - `api_call`: target must be an object with `endpoint` and `method`.
/// - `workflow`: target must be an object with `workflow_name`.
pub fn validate_end_action(end_action_type: &str, target: Option<&Value>) -> Result<(), CoreError> {
    let action_type = EndActionType::from_str_value(end_action_type)?;
    let target = target.filter(|t| !t.is_null());

    match action_type {
        EndActionType::None => {
            if target.is_some() {
                return Err(invalid(
                    "end_action_target",
                    "must be null when end_action_type is 'none'",
                ));
            }
        }
        EndActionType::ApiCall => {
            let Some(target) = target else {
                return Err(invalid(
                    "end_action_target",
                    "is required when end_action_type is 'api_call'",
                ));
            };
            let obj = required_object(Some(target), "end_action_target")?;
            required_string(obj.get("endpoint"), "end_action_target.endpoint")?;
            required_method(obj.get("method"), "end_action_target.method")?;
        }
        EndActionType::Workflow => {
            let Some(target) = target else {
                return Err(invalid(
                    "end_action_target",
                    "is required when end_action_type is 'workflow'",
                ));
            };
            let obj = required_object(Some(target), "end_action_target")?;
            required_string(obj.get("workflow_name"), "end_action_target.workflow_name")?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid(field: &str, reason: &str) -> CoreError {
    CoreError::Validation(format!("{field}: {reason}"))
}

fn required_object<'a>(
    value: Option<&'a Value>,
    path: &str,
) -> Result<&'a serde_json::Map<String, Value>, CoreError> {
    match value {
        Some(Value::Object(obj)) => Ok(obj),
        Some(Value::Null) | None => Err(invalid(path, "is required")),
        Some(_) => Err(invalid(path, "must be an object")),
    }
}

fn required_string<'a>(value: Option<&'a Value>, path: &str) -> Result<&'a str, CoreError> {
    match value {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(Value::Null) | None => Err(invalid(path, "is required")),
        Some(_) => Err(invalid(path, "must be a string")),
    }
}

fn required_method<'a>(value: Option<&'a Value>, path: &str) -> Result<&'a str, CoreError> {
    let method = required_string(value, path)?;
    if VALID_HTTP_METHODS.contains(&method) {
        Ok(method)
    } else {
        Err(invalid(
            path,
            &format!("must be one of: {}", VALID_HTTP_METHODS.join(", ")),
        ))
    }
}

/// Absent, `null`, or a list of strings.
fn optional_string_list(value: Option<&Value>, path: &str) -> Result<(), CoreError> {
    match value {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => Ok(()),
        Some(_) => Err(invalid(path, "must be a list of strings")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
