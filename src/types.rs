//! Plan preview and lifecycle result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::Operation;
use crate::schema::{Diagnostic, ResourceSchema};

/// Placeholder shown instead of sensitive values.
const REDACTED: &str = "(sensitive value)";

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The state key of the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }

    /// The value shown in place of a sensitive one.
    pub fn redacted() -> Value {
        Value::String(REDACTED.to_string())
    }

    /// One change per attribute touched by `operations`, in operation order.
    ///
    /// Before and after values are taken from the prior state and the proposed
    /// configuration, so set changes show the whole set rather than each member.
    pub fn from_operations(
        operations: &[Operation],
        schema: &ResourceSchema,
        prior: &Value,
        proposed: &Value,
    ) -> Vec<Self> {
        let mut changes: Vec<Self> = Vec::new();
        for operation in operations {
            let Some(attr) = schema.attribute(&operation.attribute) else {
                continue;
            };
            let key = attr.state_key();
            if changes.iter().any(|c| c.path == key) {
                continue;
            }
            let (before, after) = if attr.sensitive {
                (Self::redacted(), Self::redacted())
            } else {
                (
                    prior.get(&key).cloned().unwrap_or(Value::Null),
                    proposed.get(&key).cloned().unwrap_or(Value::Null),
                )
            };
            changes.push(Self::modified(key, before, after));
        }
        changes
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }
}

/// New provider state plus non-fatal findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// The state to store.
    pub state: Value,
    /// Warnings raised along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl StateUpdate {
    /// State with no diagnostics.
    pub fn new(state: Value) -> Self {
        Self {
            state,
            diagnostics: Vec::new(),
        }
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Names of everything the provider exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
}
