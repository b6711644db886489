//! Response projection.
//!
//! Turns a remote object into the observed attribute set that is stored as
//! provider state.

use serde_json::Value;
use tracing::warn;

use crate::client::RemoteObject;
use crate::normalize::normalize_outgoing;
use crate::schema::{AttributeKind, Diagnostic, ResourceSchema};
use crate::value::{AttributeSet, AttributeValue, Scalar};

/// Observed attributes plus any non-fatal findings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    /// The attributes to store as state.
    pub attributes: AttributeSet,
    /// Warnings raised while projecting, e.g. enum members unknown to this provider.
    pub diagnostics: Vec<Diagnostic>,
}

/// Project a remote object onto `schema`.
///
/// `previous_desired` is the raw plan or state object the user last declared;
/// it decides whether an empty string from the server was asked for.
/// Enum values the provider does not know are kept as returned and reported
/// as warnings, so a newer server does not make the resource unusable.
pub fn project(
    remote: &RemoteObject,
    previous_desired: Option<&Value>,
    schema: &ResourceSchema,
) -> Projection {
    let mut projection = Projection::default();

    for attr in schema.attributes {
        let previous = previous_desired.and_then(|p| p.get(attr.state_key()));
        let value = normalize_outgoing(remote.get(&attr.json_key()), attr, previous);

        if let (AttributeKind::Enum(members), AttributeValue::Scalar(Scalar::String(s))) =
            (attr.kind, &value)
        {
            if !s.is_empty() && !members.iter().any(|m| *m == s.as_str()) {
                warn!(
                    publisher = %remote.id,
                    attribute = attr.name,
                    value = %s,
                    "Server returned a value outside the known enumeration"
                );
                projection.diagnostics.push(
                    Diagnostic::warning(format!(
                        "Unrecognized value '{}' for attribute '{}'",
                        s, attr.name
                    ))
                    .with_detail("The value is kept as returned by the server")
                    .with_attribute(attr.state_key()),
                );
            }
        }

        projection.attributes.set(attr.name, value);
    }

    projection
}
