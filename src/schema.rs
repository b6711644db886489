//! Schema types for describing log publisher resources.
//!
//! Every resource type is described by a static, ordered table of
//! [`AttributeSchema`] entries. The tables are built at compile time and shared
//! by every instance of the resource type; the normalizer, diff engine and
//! projector are all driven from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// A single string value.
    String,
    /// A boolean value.
    Bool,
    /// A 64-bit integer.
    Int,
    /// A string restricted to the listed members.
    Enum(&'static [&'static str]),
    /// An unordered set of unique strings.
    StringSet,
}

impl AttributeKind {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Enum(_) => "enum",
            Self::StringSet => "set of string",
        }
    }

    /// Whether the attribute is multi-valued.
    pub fn is_set(&self) -> bool {
        matches!(self, Self::StringSet)
    }
}

/// Static description of one configuration attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeSchema {
    /// Wire identifier, e.g. `log-file-permissions`.
    pub name: &'static str,
    /// The kind of value held.
    pub kind: AttributeKind,
    /// The attribute must be present in configuration.
    pub required: bool,
    /// The server supplies a value when none is configured.
    pub has_server_default: bool,
    /// The string holds a number with a unit suffix (`"200 kb"`, `"5 minutes"`).
    pub units: bool,
    /// The value must not appear in logs or plan output.
    pub sensitive: bool,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

impl AttributeSchema {
    const fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            has_server_default: false,
            units: false,
            sensitive: false,
            description: None,
        }
    }

    /// An optional string attribute.
    pub const fn string(name: &'static str) -> Self {
        Self::new(name, AttributeKind::String)
    }

    /// An optional bool attribute.
    pub const fn bool(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Bool)
    }

    /// An optional int attribute.
    pub const fn int(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Int)
    }

    /// An optional enum attribute.
    pub const fn enumeration(name: &'static str, members: &'static [&'static str]) -> Self {
        Self::new(name, AttributeKind::Enum(members))
    }

    /// An optional string set attribute.
    pub const fn string_set(name: &'static str) -> Self {
        Self::new(name, AttributeKind::StringSet)
    }

    /// Mark the attribute as required.
    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Mark the attribute as defaulted by the server when unset.
    pub const fn server_default(self) -> Self {
        Self {
            has_server_default: true,
            ..self
        }
    }

    /// Mark the attribute as a unit-suffixed size or duration.
    pub const fn with_units(self) -> Self {
        Self {
            units: true,
            ..self
        }
    }

    /// Mark the attribute as sensitive.
    pub const fn sensitive(self) -> Self {
        Self {
            sensitive: true,
            ..self
        }
    }

    /// Set the description.
    pub const fn with_description(self, description: &'static str) -> Self {
        Self {
            description: Some(description),
            ..self
        }
    }

    /// Key of the attribute in provider state and plans (`log_file_permissions`).
    pub fn state_key(&self) -> String {
        state_key(self.name)
    }

    /// Key of the attribute in configuration API payloads (`logFilePermissions`).
    pub fn json_key(&self) -> String {
        json_key(self.name)
    }

    /// The enumeration members, if this is an enum attribute.
    pub fn enum_members(&self) -> Option<&'static [&'static str]> {
        match self.kind {
            AttributeKind::Enum(members) => Some(members),
            _ => None,
        }
    }
}

/// Convert a hyphenated wire name into its snake_case state key.
pub fn state_key(name: &str) -> String {
    name.replace('-', "_")
}

/// Convert a hyphenated wire name into its camelCase API payload key.
pub fn json_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            key.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            key.push(c);
        }
    }
    key
}

/// Schema for one log publisher type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceSchema {
    /// The publisher type as named by the configuration API, e.g. `file-based-access`.
    pub publisher_type: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Attributes in declaration order.
    pub attributes: &'static [AttributeSchema],
}

/// URN prefix the configuration API uses to tag log publisher types.
pub const SCHEMA_URN_PREFIX: &str = "urn:dirconfig:schemas:configuration:2.0:log-publisher:";

impl ResourceSchema {
    /// Look up an attribute by its wire name.
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Look up an attribute by its state key.
    pub fn attribute_by_state_key(&self, key: &str) -> Option<&'static AttributeSchema> {
        self.attributes.iter().find(|a| a.state_key() == key)
    }

    /// The schema URN identifying this publisher type on the wire.
    pub fn schema_urn(&self) -> String {
        format!("{}{}", SCHEMA_URN_PREFIX, self.publisher_type)
    }

    /// The publisher type name with underscores, used in resource type names.
    pub fn type_slug(&self) -> String {
        self.publisher_type.replace('-', "_")
    }
}

/// Schemas for everything the provider exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ProviderSchema {
    /// Schema for provider configuration.
    pub provider: Vec<AttributeSchema>,
    /// Schemas for each resource type.
    pub resources: BTreeMap<String, ResourceSchema>,
    /// Schemas for each data source type.
    pub data_sources: BTreeMap<String, ResourceSchema>,
}

impl ProviderSchema {
    /// Create a new empty provider schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider configuration schema.
    pub fn with_provider_config(mut self, attributes: &[AttributeSchema]) -> Self {
        self.provider = attributes.to_vec();
        self
    }

    /// Add a resource schema.
    pub fn with_resource(mut self, name: impl Into<String>, schema: ResourceSchema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    /// Add a data source schema.
    pub fn with_data_source(mut self, name: impl Into<String>, schema: ResourceSchema) -> Self {
        self.data_sources.insert(name.into(), schema);
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// An error that prevents the operation from completing.
    Error,
    /// A warning that doesn't prevent the operation but should be addressed.
    Warning,
}

/// A diagnostic message from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The attribute path where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}
