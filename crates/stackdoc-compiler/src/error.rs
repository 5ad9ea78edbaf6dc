use thiserror::Error;

use crate::location::LocationType;

/// A failed call through the [`StoreClient`](crate::sync::StoreClient) facade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{service}.{operation} failed: {message}")]
pub struct RemoteError {
    /// Remote service name (e.g. `APIGateway`, `CloudFormation`).
    pub service: String,
    /// Operation name (e.g. `getDocumentationParts`).
    pub operation: String,
    /// Message reported by the remote side.
    pub message: String,
}

impl RemoteError {
    pub fn new(
        service: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether the store rejected a version lookup because the version does not exist.
    ///
    /// This is the branch selector of the version check, not a failure.
    pub fn is_invalid_version(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("invalid") && message.contains("version")
    }
}

/// Errors produced while compiling or publishing documentation.
#[derive(Debug, Error)]
pub enum DocumentationError {
    /// E2001: A list node of a part schema was given something other than a sequence.
    #[error("E2001: definition for type \"{location_type}\" is not a list")]
    InvalidDefinition { location_type: LocationType },

    /// E2002: The template has no resource for a documented endpoint.
    #[error("E2002: no resource '{resource_key}' in template for documented endpoint")]
    MissingResource { resource_key: String },

    /// E2003: A location type name outside the known taxonomy.
    #[error("E2003: unknown documentation location type '{0}'")]
    UnknownLocationType(String),

    /// E2004: Documentation does not have the expected shape.
    #[error("E2004: malformed documentation at {context}: {source}")]
    MalformedDocumentation {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// E2005: The target resource exists but cannot hold method settings.
    #[error("E2005: resource '{resource_key}' is malformed: {reason}")]
    MalformedResource {
        resource_key: String,
        reason: String,
    },

    /// Remote store or stack call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
