//! Minimal-diff engine.
//!
//! [`diff`] compares a desired and an observed [`AttributeSet`] of the same
//! resource schema and returns the smallest ordered list of [`Operation`]s that
//! moves the remote object from observed to desired. Attributes are visited in
//! schema declaration order and never influence one another, so the result is
//! deterministic and can be sent as one batch.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

use crate::normalize::scalars_equivalent;
use crate::schema::{json_key, AttributeKind, AttributeSchema, ResourceSchema};
use crate::value::{AttributeSet, AttributeValue, Scalar};

/// The kind of a patch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Replace a single-valued attribute (or clear it).
    Replace,
    /// Add one member to a set attribute.
    Add,
    /// Remove one member from a set attribute.
    Remove,
}

impl OperationKind {
    /// Lowercase name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// One patch-style instruction against a remote configuration object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Wire name of the targeted attribute.
    pub attribute: String,
    /// What to do.
    pub kind: OperationKind,
    /// The scalar for a replace (`None` clears), or the set member for add/remove.
    pub value: Option<Scalar>,
}

impl Operation {
    /// Replace a single-valued attribute.
    pub fn replace(attribute: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: OperationKind::Replace,
            value: Some(value.into()),
        }
    }

    /// Clear a single-valued attribute.
    pub fn clear(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: OperationKind::Replace,
            value: None,
        }
    }

    /// Add a member to a set attribute.
    pub fn add(attribute: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: OperationKind::Add,
            value: Some(Scalar::String(member.into())),
        }
    }

    /// Remove a member from a set attribute.
    pub fn remove(attribute: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: OperationKind::Remove,
            value: Some(Scalar::String(member.into())),
        }
    }

    /// Whether this operation clears a single-valued attribute.
    pub fn is_clear(&self) -> bool {
        self.kind == OperationKind::Replace && self.value.is_none()
    }

    /// The configuration API patch form of this operation.
    ///
    /// A clear is sent as a `remove` without a value.
    pub fn to_patch_json(&self) -> Value {
        let path = json_key(&self.attribute);
        match (&self.kind, &self.value) {
            (OperationKind::Replace, None) => json!({"op": "remove", "path": path}),
            (kind, Some(value)) => {
                json!({"op": kind.as_str(), "path": path, "value": value.to_json()})
            },
            (kind, None) => json!({"op": kind.as_str(), "path": path}),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clear() {
            write!(f, "clear {}", self.attribute)
        } else {
            write!(f, "{} {}", self.kind.as_str(), self.attribute)
        }
    }
}

/// Compute the operations that converge `observed` onto `desired`.
///
/// # Panics
///
/// Panics when a value's kind contradicts the schema or the other snapshot
/// (a set where a scalar is declared, or the reverse). That is a bug in the
/// schema table, not bad input.
pub fn diff(
    desired: &AttributeSet,
    observed: &AttributeSet,
    schema: &ResourceSchema,
) -> Vec<Operation> {
    let mut operations = Vec::new();
    for attr in schema.attributes {
        diff_attribute(
            attr,
            desired.get(attr.name),
            observed.get(attr.name),
            &mut operations,
        );
    }
    operations
}

fn diff_attribute(
    attr: &AttributeSchema,
    desired: &AttributeValue,
    observed: &AttributeValue,
    operations: &mut Vec<Operation>,
) {
    match desired {
        AttributeValue::Absent => {},
        AttributeValue::Null if attr.kind.is_set() => {
            for member in observed_members(attr, desired, observed) {
                operations.push(Operation::remove(attr.name, member.clone()));
            }
        },
        AttributeValue::Null => {
            if observed.as_set().is_some() {
                contract_violation(attr, desired, observed);
            }
            if !observed.is_unset() {
                operations.push(Operation::clear(attr.name));
            }
        },
        AttributeValue::Scalar(wanted) => {
            if attr.kind.is_set() || !scalar_matches_kind(wanted, attr.kind) {
                contract_violation(attr, desired, observed);
            }
            match observed {
                AttributeValue::Scalar(current) if scalars_equivalent(attr, wanted, current) => {},
                AttributeValue::Set(_) => contract_violation(attr, desired, observed),
                _ => operations.push(Operation::replace(attr.name, wanted.clone())),
            }
        },
        AttributeValue::Set(wanted) => {
            if !attr.kind.is_set() {
                contract_violation(attr, desired, observed);
            }
            let current = observed_members(attr, desired, observed);
            for member in current.iter().filter(|m| !wanted.contains(**m)) {
                operations.push(Operation::remove(attr.name, (*member).clone()));
            }
            for member in wanted.iter().filter(|m| !current.contains(m)) {
                operations.push(Operation::add(attr.name, member.clone()));
            }
        },
    }
}

/// Members of an observed set value; an unset observation is the empty set.
fn observed_members<'a>(
    attr: &AttributeSchema,
    desired: &AttributeValue,
    observed: &'a AttributeValue,
) -> Vec<&'a String> {
    match observed {
        AttributeValue::Set(members) => members.iter().collect(),
        AttributeValue::Absent | AttributeValue::Null => Vec::new(),
        AttributeValue::Scalar(_) => contract_violation(attr, desired, observed),
    }
}

fn scalar_matches_kind(value: &Scalar, kind: AttributeKind) -> bool {
    matches!(
        (value, kind),
        (Scalar::String(_), AttributeKind::String | AttributeKind::Enum(_))
            | (Scalar::Bool(_), AttributeKind::Bool)
            | (Scalar::Int(_), AttributeKind::Int)
    )
}

fn contract_violation(
    attr: &AttributeSchema,
    desired: &AttributeValue,
    observed: &AttributeValue,
) -> ! {
    panic!(
        "schema contract violation on attribute '{}': declared {}, desired {}, observed {}",
        attr.name,
        attr.kind.name(),
        desired.variant_name(),
        observed.variant_name()
    )
}
