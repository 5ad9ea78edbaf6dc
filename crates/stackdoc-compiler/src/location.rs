//! Documentation locations and the part records attached to them.
//!
//! A location is a typed coordinate in the API's resource tree. Each
//! [`LocationType`] declares a fixed list of [`LocationField`]s, looked up in
//! a table rather than through per-type behaviour.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DocumentationError;

/// Closed set of places a documentation part can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Api,
    Resource,
    Method,
    PathParameter,
    QueryParameter,
    RequestHeader,
    RequestBody,
    Response,
    ResponseHeader,
    ResponseBody,
    Authorizer,
    Model,
}

/// A coordinate field a location may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationField {
    Path,
    Method,
    Name,
    StatusCode,
}

impl LocationField {
    /// Key of this field in documentation definitions and on the wire.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Method => "method",
            Self::Name => "name",
            Self::StatusCode => "statusCode",
        }
    }
}

const BASE_PROPERTIES: &[&str] = &["description", "summary"];
const API_PROPERTIES: &[&str] = &["description", "summary", "tags", "info"];
const METHOD_PROPERTIES: &[&str] = &["description", "summary", "tags"];
const PARAMETER_PROPERTIES: &[&str] = &["description", "summary", "required"];

impl LocationType {
    pub const ALL: [LocationType; 12] = [
        Self::Api,
        Self::Resource,
        Self::Method,
        Self::PathParameter,
        Self::QueryParameter,
        Self::RequestHeader,
        Self::RequestBody,
        Self::Response,
        Self::ResponseHeader,
        Self::ResponseBody,
        Self::Authorizer,
        Self::Model,
    ];

    /// Wire name (e.g. `QUERY_PARAMETER`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::Resource => "RESOURCE",
            Self::Method => "METHOD",
            Self::PathParameter => "PATH_PARAMETER",
            Self::QueryParameter => "QUERY_PARAMETER",
            Self::RequestHeader => "REQUEST_HEADER",
            Self::RequestBody => "REQUEST_BODY",
            Self::Response => "RESPONSE",
            Self::ResponseHeader => "RESPONSE_HEADER",
            Self::ResponseBody => "RESPONSE_BODY",
            Self::Authorizer => "AUTHORIZER",
            Self::Model => "MODEL",
        }
    }

    /// Fields that identify a location of this type, in identifier order.
    pub const fn location_fields(self) -> &'static [LocationField] {
        use LocationField::*;
        match self {
            Self::Api => &[],
            Self::Authorizer | Self::Model => &[Name],
            Self::Resource => &[Path],
            Self::Method | Self::RequestBody => &[Path, Method],
            Self::PathParameter | Self::QueryParameter | Self::RequestHeader => {
                &[Path, Method, Name]
            }
            Self::Response | Self::ResponseBody => &[Path, Method, StatusCode],
            Self::ResponseHeader => &[Path, Method, Name, StatusCode],
        }
    }

    /// Parameter-like locations additionally document `required`.
    pub const fn is_parameter(self) -> bool {
        matches!(
            self,
            Self::PathParameter | Self::QueryParameter | Self::RequestHeader | Self::ResponseHeader
        )
    }

    /// Definition keys copied into a part's properties for this type.
    pub const fn documentation_properties(self) -> &'static [&'static str] {
        match self {
            Self::Api => API_PROPERTIES,
            Self::Method => METHOD_PROPERTIES,
            t if t.is_parameter() => PARAMETER_PROPERTIES,
            _ => BASE_PROPERTIES,
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = DocumentationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DocumentationError::UnknownLocationType(s.to_string()))
    }
}

/// Where a documentation part attaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "type")]
    pub location_type: LocationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
}

impl Location {
    pub fn new(location_type: LocationType) -> Self {
        Self {
            location_type,
            path: None,
            method: None,
            name: None,
            status_code: None,
        }
    }

    /// Empty starting coordinate of a walk; only its fields are ever read.
    pub fn root() -> Self {
        Self::new(LocationType::Api)
    }

    pub fn with(mut self, field: LocationField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    pub fn get(&self, field: LocationField) -> Option<&str> {
        match field {
            LocationField::Path => self.path.as_deref(),
            LocationField::Method => self.method.as_deref(),
            LocationField::Name => self.name.as_deref(),
            LocationField::StatusCode => self.status_code.as_deref(),
        }
    }

    pub fn set(&mut self, field: LocationField, value: Option<String>) {
        let slot = match field {
            LocationField::Path => &mut self.path,
            LocationField::Method => &mut self.method,
            LocationField::Name => &mut self.name,
            LocationField::StatusCode => &mut self.status_code,
        };
        *slot = value;
    }

    /// Stable identifier built from the fields declared for this location's type.
    ///
    /// Missing fields render as `?` so misconfigured parts stay distinguishable.
    pub fn identifier(&self) -> String {
        let mut id = self.location_type.as_str().to_string();
        for field in self.location_type.location_fields() {
            id.push(' ');
            id.push_str(field.key());
            id.push('=');
            id.push_str(self.get(*field).unwrap_or("?"));
        }
        id
    }
}

/// One independently addressable fragment of API documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationPart {
    pub location: Location,
    pub properties: Map<String, Value>,
    pub rest_api_id: Option<String>,
}

impl DocumentationPart {
    /// Parameters of a `createDocumentationPart` call; properties travel as a JSON string.
    pub fn to_create_params(&self) -> Result<Value, serde_json::Error> {
        let mut params = Map::new();
        params.insert("location".into(), serde_json::to_value(&self.location)?);
        params.insert(
            "properties".into(),
            Value::String(serde_json::to_string(&self.properties)?),
        );
        params.insert(
            "restApiId".into(),
            self.rest_api_id.clone().map(Value::String).unwrap_or(Value::Null),
        );
        Ok(Value::Object(params))
    }
}
