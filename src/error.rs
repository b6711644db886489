//! Error types for the log publisher provider.

use thiserror::Error;

use crate::schema::{state_key, Diagnostic};

/// Errors that can occur while reconciling a configuration object.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The targeted remote object does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A desired enum attribute holds a value outside its enumeration.
    #[error("Invalid value '{value}' for attribute '{attribute}'")]
    InvalidEnumValue {
        /// The attribute name.
        attribute: String,
        /// The rejected value.
        value: String,
    },

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote API could not be reached or returned an unexpected failure.
    #[error("Transport error during {operation} of {target}: {message}")]
    Transport {
        /// The object the call targeted.
        target: String,
        /// The attempted operation (read, create, update, delete).
        operation: String,
        /// The underlying failure.
        message: String,
    },

    /// Permission denied (authentication/authorization failure).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid request from client.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::InvalidEnumValue { value, .. } => value,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Transport { message, .. } => message,
            Self::PermissionDenied(msg) => msg,
            Self::InvalidRequest(msg) => msg,
        }
    }

    /// Build a transport error carrying the target object and attempted operation.
    pub fn transport(
        target: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            target: target.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether the error reports a missing remote object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Convert into an error diagnostic for the host framework.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string());
        match self {
            Self::InvalidEnumValue { attribute, .. } => {
                diagnostic.with_attribute(state_key(attribute))
            },
            Self::Transport { .. } => diagnostic
                .with_detail("The remote configuration API call failed; the operation may be retried"),
            _ => diagnostic,
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        err.to_diagnostic()
    }
}
