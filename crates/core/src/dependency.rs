//! Workflow dependency model and verdicts.
//!
//! Stored `workflow_dependencies` entries come in two shapes: a bare template
//! name or id (older templates) and a structured `{name, kind?, api,
//! on_failure}` object. [`normalize_dependencies`] decodes both into
//! [`Dependency`] so resolution never branches on raw JSON shape.
//!
//! Verdict construction is pure: the caller looks up completed and in-progress
//! workflows (or asks the executor) and hands the results in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::DbId;

pub const DEPENDENCY_KIND_WORKFLOW: &str = "workflow";
pub const DEPENDENCY_KIND_API: &str = "api";

/// Error marker recorded when the workflow's template no longer exists.
pub const TEMPLATE_MISSING_ERROR: &str = "Template not found";

/// `can_proceed` reason when workflow dependencies block progress.
pub const REASON_WORKFLOW_DEPENDENCIES: &str = "workflow_dependencies";

// ---------------------------------------------------------------------------
// Boundary shapes
// ---------------------------------------------------------------------------

/// API configuration attached to a dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub endpoint: String,
    pub method: String,
    #[serde(default)]
    pub headers: Option<Vec<String>>,
    #[serde(default)]
    pub query_params: Option<Vec<String>>,
    #[serde(default)]
    pub body: Option<Vec<String>>,
}

/// A stored dependency entry as found in `workflow_dependencies`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDependency {
    /// Bare template name or id.
    Legacy(String),
    Structured(StructuredDependency),
    /// Unrecognised JSON; its textual form is used as the identifier.
    Other(Value),
}

/// The structured dependency object. Sub-objects stay loose here; they were
/// validated when the template was written.
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredDependency {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub api: Option<Value>,
    #[serde(default)]
    pub on_failure: Option<Value>,
}

// ---------------------------------------------------------------------------
// Canonical representation
// ---------------------------------------------------------------------------

/// What a dependency waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Another workflow (by template name or id) must have completed for the
    /// same user.
    Workflow,
    /// An external API check, delegated to the executor.
    Api,
}

/// A normalized dependency, the only shape the resolver sees.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    /// Template name or id to match.
    pub identifier: String,
    pub kind: DependencyKind,
    pub api: Option<ApiConfig>,
}

impl From<RawDependency> for Dependency {
    fn from(raw: RawDependency) -> Self {
        match raw {
            RawDependency::Legacy(identifier) => Self {
                identifier,
                kind: DependencyKind::Workflow,
                api: None,
            },
            RawDependency::Structured(dep) => {
                let kind = match dep.kind.as_deref() {
                    Some(DEPENDENCY_KIND_API) => DependencyKind::Api,
                    _ => DependencyKind::Workflow,
                };
                let api = dep.api.and_then(|v| serde_json::from_value(v).ok());
                Self {
                    identifier: dep.name,
                    kind,
                    api,
                }
            }
            RawDependency::Other(value) => Self {
                identifier: value.to_string(),
                kind: DependencyKind::Workflow,
                api: None,
            },
        }
    }
}

/// Decode a stored `workflow_dependencies` value into canonical entries.
///
/// `None` and `null` yield no dependencies. A non-list value is treated as a
/// single entry.
pub fn normalize_dependencies(value: Option<&Value>) -> Vec<Dependency> {
    let entries: Vec<Value> = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    };

    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<RawDependency>(entry.clone())
                .unwrap_or(RawDependency::Other(entry))
                .into()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// The outcome of checking one dependency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyCheck {
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    pub name: String,
    pub satisfied: bool,
    /// The completed workflow that satisfied it, or the in-progress one
    /// blocking it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Verdict for a workflow-kind dependency.
///
/// `completed` is the most recently completed matching workflow for the same
/// user; `in_progress` any matching `active`/`waiting` one.
pub fn workflow_verdict(
    identifier: &str,
    completed: Option<DbId>,
    in_progress: Option<DbId>,
) -> DependencyCheck {
    if let Some(id) = completed {
        return DependencyCheck {
            kind: DependencyKind::Workflow,
            name: identifier.to_string(),
            satisfied: true,
            workflow_id: Some(id),
            message: None,
        };
    }

    match in_progress {
        Some(id) => DependencyCheck {
            kind: DependencyKind::Workflow,
            name: identifier.to_string(),
            satisfied: false,
            workflow_id: Some(id),
            message: Some(format!(
                "Dependent workflow {identifier} is still in progress"
            )),
        },
        None => DependencyCheck {
            kind: DependencyKind::Workflow,
            name: identifier.to_string(),
            satisfied: false,
            workflow_id: None,
            message: Some(format!(
                "Dependent workflow {identifier} not found or not completed"
            )),
        },
    }
}

/// Verdict for an API-kind dependency, given the executor's answer.
pub fn api_verdict(identifier: &str, satisfied: bool) -> DependencyCheck {
    DependencyCheck {
        kind: DependencyKind::Api,
        name: identifier.to_string(),
        satisfied,
        workflow_id: None,
        message: (!satisfied).then(|| format!("External dependency {identifier} not satisfied")),
    }
}

/// Verdict for an API-kind dependency whose `api` block cannot be decoded.
/// The executor is never asked, so the dependency stays unsatisfied.
pub fn api_unconfigured(identifier: &str) -> DependencyCheck {
    DependencyCheck {
        kind: DependencyKind::Api,
        name: identifier.to_string(),
        satisfied: false,
        workflow_id: None,
        message: Some(format!(
            "External dependency {identifier} has no usable API configuration"
        )),
    }
}

/// Aggregate result of checking every dependency of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyReport {
    pub satisfied: bool,
    /// Every unsatisfied entry, in declaration order.
    pub pending: Vec<DependencyCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyReport {
    /// Nothing declared: satisfied with an empty pending list.
    pub fn no_dependencies() -> Self {
        Self {
            satisfied: true,
            pending: Vec::new(),
            error: None,
        }
    }

    /// The workflow's template is gone; report unsatisfied with a marker.
    pub fn template_missing() -> Self {
        Self {
            satisfied: false,
            pending: Vec::new(),
            error: Some(TEMPLATE_MISSING_ERROR.to_string()),
        }
    }

    /// Logical AND over all checks; unsatisfied ones are kept as pending.
    pub fn from_checks(checks: impl IntoIterator<Item = DependencyCheck>) -> Self {
        let pending: Vec<DependencyCheck> =
            checks.into_iter().filter(|c| !c.satisfied).collect();
        Self {
            satisfied: pending.is_empty(),
            pending,
            error: None,
        }
    }

    /// The `pending_dependencies` snapshot stored when a workflow is forced
    /// into `waiting`.
    pub fn pending_snapshot(&self) -> Value {
        serde_json::json!({ "workflow_dependencies": self })
    }
}

/// Whether a workflow may move to `active`.
///
/// Currently a thin wrapper over the workflow dependency report; further
/// dependency categories combine here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProceedDecision {
    pub can_proceed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub workflow_dependencies: DependencyReport,
}

impl ProceedDecision {
    pub fn from_report(report: DependencyReport) -> Self {
        Self {
            can_proceed: report.satisfied,
            reason: (!report.satisfied).then_some(REASON_WORKFLOW_DEPENDENCIES),
            workflow_dependencies: report,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
