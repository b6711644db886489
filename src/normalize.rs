//! Attribute normalization.
//!
//! Plans, provider state and configuration API responses each have their own
//! notion of "no value". This module maps all of them onto [`AttributeValue`]
//! so the diff engine only ever compares like with like:
//!
//! - an empty string in a plan is the same as leaving the attribute unset;
//! - a `null` in a plan clears the attribute unless the server supplies a
//!   default for it, in which case the server's value is left alone;
//! - an empty string from the server is "no value" unless the user asked for
//!   exactly that;
//! - unit-suffixed sizes and durations compare by magnitude, not spelling.

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{AttributeKind, AttributeSchema, ResourceSchema};
use crate::value::{AttributeSet, AttributeValue, Scalar};

/// Normalize one raw plan value.
///
/// `raw` is `None` when the plan carries no value for the attribute
/// (unset or not yet known).
///
/// # Errors
///
/// - [`ProviderError::InvalidEnumValue`] when an enum value is outside the enumeration
/// - [`ProviderError::Validation`] when the JSON type does not match the attribute kind
pub fn normalize_incoming(
    raw: Option<&Value>,
    attr: &AttributeSchema,
) -> Result<AttributeValue, ProviderError> {
    let value = match raw {
        None => return Ok(AttributeValue::Absent),
        Some(Value::Null) if attr.has_server_default || attr.required => {
            return Ok(AttributeValue::Absent)
        },
        Some(Value::Null) => return Ok(AttributeValue::Null),
        Some(v) => v,
    };

    match attr.kind {
        AttributeKind::String => {
            let s = expect_str(value, attr)?;
            if s.is_empty() {
                Ok(AttributeValue::Absent)
            } else {
                Ok(AttributeValue::from(s))
            }
        },
        AttributeKind::Enum(members) => {
            let s = expect_str(value, attr)?;
            if s.is_empty() {
                Ok(AttributeValue::Absent)
            } else if members.iter().any(|m| *m == s) {
                Ok(AttributeValue::from(s))
            } else {
                Err(ProviderError::InvalidEnumValue {
                    attribute: attr.name.to_string(),
                    value: s.to_string(),
                })
            }
        },
        AttributeKind::Bool => value
            .as_bool()
            .map(AttributeValue::from)
            .ok_or_else(|| type_mismatch(attr, value)),
        AttributeKind::Int => value
            .as_i64()
            .map(AttributeValue::from)
            .ok_or_else(|| type_mismatch(attr, value)),
        AttributeKind::StringSet => {
            let items = value.as_array().ok_or_else(|| type_mismatch(attr, value))?;
            let members = items
                .iter()
                .map(|item| expect_str(item, attr).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AttributeValue::set(members))
        },
    }
}

/// Normalize a whole plan object into a desired attribute set.
///
/// Stops at the first invalid attribute so nothing is sent to the server for
/// a partially valid plan.
pub fn normalize_desired(
    plan: &Value,
    schema: &ResourceSchema,
) -> Result<AttributeSet, ProviderError> {
    let mut desired = AttributeSet::new();
    for attr in schema.attributes {
        let value = normalize_incoming(plan.get(attr.state_key()), attr)?;
        desired.set(attr.name, value);
    }
    Ok(desired)
}

/// Normalize one value returned by the configuration API.
///
/// `previous_desired` is the raw value the user last declared for the
/// attribute, if any.
pub fn normalize_outgoing(
    remote: Option<&Value>,
    attr: &AttributeSchema,
    previous_desired: Option<&Value>,
) -> AttributeValue {
    if attr.kind.is_set() {
        return match remote {
            Some(Value::Array(items)) => {
                AttributeValue::set(items.iter().filter_map(|i| i.as_str()))
            },
            Some(Value::String(s)) if !s.is_empty() => AttributeValue::set([s.as_str()]),
            _ => AttributeValue::Set(Default::default()),
        };
    }

    match (remote, attr.kind) {
        (None | Some(Value::Null), _) => AttributeValue::Absent,
        (Some(Value::String(s)), _) if s.is_empty() => {
            if previous_desired.and_then(Value::as_str) == Some("") {
                AttributeValue::from("")
            } else {
                AttributeValue::Absent
            }
        },
        (Some(Value::Bool(b)), AttributeKind::Bool) => AttributeValue::from(*b),
        (Some(Value::String(s)), AttributeKind::Bool) => match s.as_str() {
            "true" => AttributeValue::from(true),
            "false" => AttributeValue::from(false),
            _ => AttributeValue::Absent,
        },
        (Some(v), AttributeKind::Int) => v
            .as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
            .map(AttributeValue::from)
            .unwrap_or(AttributeValue::Absent),
        (Some(Value::String(s)), _) => AttributeValue::from(s.as_str()),
        (Some(Value::Number(n)), AttributeKind::String) => AttributeValue::from(n.to_string()),
        _ => AttributeValue::Absent,
    }
}

/// Read previously stored provider state into an observed attribute set.
///
/// Unlike [`normalize_desired`] this never fails: state may hold an enum value
/// the server introduced after this provider was built. Values whose JSON type
/// does not fit the attribute kind are read as absent.
pub fn normalize_state(state: &Value, schema: &ResourceSchema) -> AttributeSet {
    let mut observed = AttributeSet::new();
    for attr in schema.attributes {
        observed.set(attr.name, state_value(state.get(attr.state_key()), attr));
    }
    observed
}

fn state_value(stored: Option<&Value>, attr: &AttributeSchema) -> AttributeValue {
    match (stored, attr.kind) {
        (None, _) => AttributeValue::Absent,
        (Some(Value::Null), _) => AttributeValue::Null,
        (Some(Value::Array(items)), AttributeKind::StringSet) => {
            AttributeValue::set(items.iter().filter_map(|i| i.as_str()))
        },
        (Some(_), AttributeKind::StringSet) => AttributeValue::Absent,
        (Some(Value::String(s)), _) if s.is_empty() => AttributeValue::Absent,
        (Some(Value::String(s)), AttributeKind::String | AttributeKind::Enum(_)) => {
            AttributeValue::from(s.as_str())
        },
        (Some(Value::Bool(b)), AttributeKind::Bool) => AttributeValue::from(*b),
        (Some(Value::String(s)), AttributeKind::Bool) => match s.as_str() {
            "true" => AttributeValue::from(true),
            "false" => AttributeValue::from(false),
            _ => AttributeValue::Absent,
        },
        (Some(v), AttributeKind::Int) => v
            .as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
            .map(AttributeValue::from)
            .unwrap_or(AttributeValue::Absent),
        _ => AttributeValue::Absent,
    }
}

/// Compare two scalars of the same attribute, honoring unit equivalence.
pub fn scalars_equivalent(attr: &AttributeSchema, a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::String(x), Scalar::String(y)) if attr.units => formats_equivalent(x, y),
        _ => a == b,
    }
}

/// Whether two unit-suffixed values denote the same quantity.
///
/// The server may re-spell units (`"1 GB"` becomes `"1 gb"`, `"5 minutes"`
/// becomes `"5 m"`) or rescale them (`"1024 kib"` becomes `"1 mib"`). Values
/// that do not parse as a quantity fall back to case-insensitive comparison.
/// Magnitudes are compared exactly; a comparison that would overflow counts
/// as a difference.
pub fn formats_equivalent(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (parse_quantity(a), parse_quantity(b)) {
        (Some(qa), Some(qb)) => {
            qa.dimension == qb.dimension && qa.same_magnitude(&qb).unwrap_or(false)
        },
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Size,
    Duration,
}

/// A magnitude of `base_units / 10^scale`, in bytes or nanoseconds.
#[derive(Debug, Clone, Copy)]
struct Quantity {
    dimension: Dimension,
    base_units: u128,
    scale: u32,
}

impl Quantity {
    /// Cross-multiplied comparison, `None` on overflow.
    fn same_magnitude(&self, other: &Quantity) -> Option<bool> {
        let left = self.base_units.checked_mul(10u128.checked_pow(other.scale)?)?;
        let right = other.base_units.checked_mul(10u128.checked_pow(self.scale)?)?;
        Some(left == right)
    }
}

/// Parse `"<number> <unit>"` where the number is a plain decimal.
fn parse_quantity(text: &str) -> Option<Quantity> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') {
        return None;
    }
    let mantissa: u128 = format!("{whole}{fraction}").parse().ok()?;
    let (dimension, factor) = unit_factor(&unit.trim().to_ascii_lowercase())?;
    Some(Quantity {
        dimension,
        base_units: mantissa.checked_mul(factor)?,
        scale: u32::try_from(fraction.len()).ok()?,
    })
}

fn unit_factor(unit: &str) -> Option<(Dimension, u128)> {
    use Dimension::{Duration, Size};

    const SECOND: u128 = 1_000_000_000;
    let factor = match unit {
        "b" | "byte" | "bytes" => (Size, 1),
        "kb" | "kilobyte" | "kilobytes" => (Size, 1_000),
        "kib" | "kibibyte" | "kibibytes" => (Size, 1 << 10),
        "mb" | "megabyte" | "megabytes" => (Size, 1_000_000),
        "mib" | "mebibyte" | "mebibytes" => (Size, 1 << 20),
        "gb" | "gigabyte" | "gigabytes" => (Size, 1_000_000_000),
        "gib" | "gibibyte" | "gibibytes" => (Size, 1 << 30),
        "tb" | "terabyte" | "terabytes" => (Size, 1_000_000_000_000),
        "tib" | "tebibyte" | "tebibytes" => (Size, 1 << 40),
        "ns" | "nanosecond" | "nanoseconds" => (Duration, 1),
        "us" | "microsecond" | "microseconds" => (Duration, 1_000),
        "ms" | "millisecond" | "milliseconds" => (Duration, 1_000_000),
        "s" | "sec" | "second" | "seconds" => (Duration, SECOND),
        "m" | "min" | "minute" | "minutes" => (Duration, 60 * SECOND),
        "h" | "hr" | "hour" | "hours" => (Duration, 3_600 * SECOND),
        "d" | "day" | "days" => (Duration, 86_400 * SECOND),
        "w" | "week" | "weeks" => (Duration, 604_800 * SECOND),
        _ => return None,
    };
    Some(factor)
}

fn expect_str<'a>(value: &'a Value, attr: &AttributeSchema) -> Result<&'a str, ProviderError> {
    value.as_str().ok_or_else(|| type_mismatch(attr, value))
}

fn type_mismatch(attr: &AttributeSchema, got: &Value) -> ProviderError {
    ProviderError::Validation(format!(
        "attribute '{}' expects {}, got {}",
        attr.name,
        attr.kind.name(),
        crate::validation::value_type_name(got)
    ))
}
