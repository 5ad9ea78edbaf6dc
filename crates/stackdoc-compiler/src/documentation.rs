//! Typed view of per-endpoint documentation.
//!
//! The walker reads documentation as raw JSON; the splicer and the Swagger
//! importer work on these structs.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::DocumentationError;
use crate::part_schema::FUNCTION_DOCUMENTATION_PARTS;

/// Documentation attached to one HTTP event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDocumentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub request_headers: Vec<ParameterDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<ParameterDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_params: Vec<ParameterDoc>,
    /// Content type to model name, in authored order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub request_models: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub method_responses: Vec<MethodResponseDoc>,
}

impl EndpointDocumentation {
    /// Read the raw documentation object of an endpoint; `context` names it in errors.
    ///
    /// List fields that are not sequences fail the same way the part walk does.
    pub fn from_value(value: &Value, context: &str) -> Result<Self, DocumentationError> {
        for (_, schema) in FUNCTION_DOCUMENTATION_PARTS {
            schema.check_shape(value)?;
        }
        serde_json::from_value(value.clone()).map_err(|source| {
            DocumentationError::MalformedDocumentation {
                context: context.to_string(),
                source,
            }
        })
    }
}

/// A documented request/response parameter or header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterDoc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// A documented method response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResponseDoc {
    /// Always held as a string; authored as either a number or a string.
    #[serde(deserialize_with = "status_code_string")]
    pub status_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub response_models: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_headers: Vec<ParameterDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
}

fn status_code_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StatusCode {
        Number(u64),
        Text(String),
    }

    Ok(match StatusCode::deserialize(deserializer)? {
        StatusCode::Number(n) => n.to_string(),
        StatusCode::Text(s) => s,
    })
}
