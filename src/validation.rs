//! Static validation of resource configuration.
//!
//! Checks a plan object against a publisher's attribute table before anything
//! is sent to the server, and reports every problem found as a [`Diagnostic`].
//!
//! # Example
//!
//! ```
//! use dirconfig_provider::publishers::FILE_BASED_ACCESS;
//! use dirconfig_provider::resource::CreatePolicy;
//! use dirconfig_provider::validation::validate_resource;
//! use serde_json::json;
//!
//! let config = json!({
//!     "id": "Access Logger",
//!     "enabled": true,
//!     "log_file": "logs/access",
//!     "rotation_policy": ["Size Limit Rotation Policy"],
//!     "retention_policy": ["File Count Retention Policy"],
//!     "compression_mechanism": "bzip2"
//! });
//! let diagnostics = validate_resource(&FILE_BASED_ACCESS, &config, CreatePolicy::CreateIfAbsent);
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("compression_mechanism".to_string()));
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::resource::{CreatePolicy, ID_KEY, LAST_UPDATED_KEY};
use crate::schema::{AttributeKind, AttributeSchema, Diagnostic, ResourceSchema};

/// Validate a resource configuration.
///
/// # Validation Rules
///
/// - `id` must be a non-empty string
/// - required attributes must be set, unless an existing publisher is adopted
/// - values must match the attribute kind
/// - enum values must be members of the enumeration
/// - attributes the publisher type does not have are rejected
pub fn validate_resource(
    schema: &ResourceSchema,
    value: &Value,
    policy: CreatePolicy,
) -> Vec<Diagnostic> {
    let Value::Object(obj) = value else {
        return vec![root_error(value)];
    };
    let mut diagnostics = Vec::new();
    validate_id(obj, &mut diagnostics);
    validate_attributes(
        schema.attributes,
        obj,
        policy == CreatePolicy::CreateIfAbsent,
        &mut diagnostics,
    );
    validate_known_keys(schema.attributes, obj, &mut diagnostics);
    diagnostics
}

/// Validate a data source configuration; only `id` is read.
pub fn validate_data_source(value: &Value) -> Vec<Diagnostic> {
    let Value::Object(obj) = value else {
        return vec![root_error(value)];
    };
    let mut diagnostics = Vec::new();
    validate_id(obj, &mut diagnostics);
    diagnostics
}

/// Validate a configuration block against a flat attribute list.
///
/// Used for the provider configuration, where every attribute is optional.
pub fn validate(attributes: &[AttributeSchema], value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if let Some(obj) = as_object(value, &mut diagnostics) {
        validate_attributes(attributes, obj, true, &mut diagnostics);
        validate_known_keys(attributes, obj, &mut diagnostics);
    }
    diagnostics
}

/// Validate, returning Ok if valid or Err with the diagnostics.
pub fn validate_result(
    attributes: &[AttributeSchema],
    value: &Value,
) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(attributes, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

fn as_object<'v>(
    value: &'v Value,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<&'v Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        // Null is an empty configuration
        Value::Null => None,
        _ => {
            diagnostics.push(root_error(value));
            None
        },
    }
}

fn root_error(value: &Value) -> Diagnostic {
    Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(value)))
}

fn validate_id(obj: &Map<String, Value>, diagnostics: &mut Vec<Diagnostic>) {
    match obj.get(ID_KEY) {
        Some(Value::String(id)) if !id.is_empty() => {},
        Some(Value::String(_)) | None | Some(Value::Null) => diagnostics.push(
            Diagnostic::error(format!("Missing required attribute '{}'", ID_KEY))
                .with_detail("The name of the log publisher must be provided")
                .with_attribute(ID_KEY),
        ),
        Some(other) => diagnostics.push(type_error(ID_KEY, "string", other)),
    }
}

fn validate_attributes(
    attributes: &[AttributeSchema],
    obj: &Map<String, Value>,
    enforce_required: bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for attr in attributes {
        let key = attr.state_key();
        match obj.get(&key) {
            None | Some(Value::Null) => {
                if attr.required && enforce_required {
                    diagnostics.push(missing_required(&key));
                }
            },
            Some(Value::String(s)) if s.is_empty() && attr.required && enforce_required => {
                diagnostics.push(missing_required(&key));
            },
            Some(v) => validate_attribute_type(attr, v, &key, diagnostics),
        }
    }
}

fn validate_known_keys(
    attributes: &[AttributeSchema],
    obj: &Map<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let known: BTreeSet<String> = attributes.iter().map(AttributeSchema::state_key).collect();
    for key in obj.keys() {
        if key != ID_KEY && key != LAST_UPDATED_KEY && !known.contains(key) {
            diagnostics.push(
                Diagnostic::error(format!("Unsupported attribute '{}'", key))
                    .with_detail("This publisher type has no such attribute")
                    .with_attribute(key.as_str()),
            );
        }
    }
}

fn validate_attribute_type(
    attr: &AttributeSchema,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr.kind {
        AttributeKind::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeKind::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeKind::Int => {
            if value.as_i64().is_none() {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeKind::Enum(members) => match value.as_str() {
            Some(s) if s.is_empty() || members.iter().any(|m| *m == s) => {},
            Some(s) => diagnostics.push(
                Diagnostic::error(format!("Invalid value '{}' for attribute '{}'", s, path))
                    .with_detail(format!("Expected one of: {}", members.join(", ")))
                    .with_attribute(path),
            ),
            None => diagnostics.push(type_error(path, "string", value)),
        },
        AttributeKind::StringSet => {
            let Some(items) = value.as_array() else {
                diagnostics.push(type_error(path, "set of string", value));
                return;
            };
            let mut seen = BTreeSet::new();
            for (i, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(member) if !seen.insert(member) => diagnostics.push(
                        Diagnostic::warning(format!("Duplicate member '{}' in '{}'", member, path))
                            .with_attribute(path),
                    ),
                    Some(_) => {},
                    None => {
                        diagnostics.push(type_error(&format!("{}.{}", path, i), "string", item))
                    },
                }
            }
        },
    }
}

// Helper functions

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn missing_required(path: &str) -> Diagnostic {
    Diagnostic::error(format!("Missing required attribute '{}'", path))
        .with_detail("This attribute is required and must be provided")
        .with_attribute(path)
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for '{}'", path))
        .with_detail(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        ))
        .with_attribute(path)
}
