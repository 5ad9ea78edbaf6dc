//! Service definition, function registry and naming.
//!
//! A service definition is the user-authored configuration: functions with
//! their HTTP events, and the global documentation under
//! `custom.documentation`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::DocumentationError;
use crate::model::{model_descriptors, ModelDescriptor};

/// Lookup of the functions declared by a service.
pub trait FunctionRegistry {
    fn get_all_functions(&self) -> Vec<String>;
    fn get_function(&self, name: &str) -> Option<&FunctionRecord>;
    fn get_function_mut(&mut self, name: &str) -> Option<&mut FunctionRecord>;
}

/// Deterministic names of template resources and stacks.
pub trait NamingService {
    fn normalize_path(&self, path: &str) -> String;
    fn get_method_logical_id(&self, resource_key: &str, method: &str) -> String;
    fn get_stack_name(&self, stage: &str) -> String;
}

/// A deployable function and its triggers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    #[serde(default)]
    pub events: Vec<FunctionEvent>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// One trigger of a function; only HTTP events are documented.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionEvent {
    #[serde(
        default,
        deserialize_with = "http_event",
        skip_serializing_if = "Option::is_none"
    )]
    pub http: Option<HttpEvent>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpEvent {
    pub path: String,
    pub method: String,
    /// Raw documentation; walked as-is and read as
    /// [`EndpointDocumentation`](crate::documentation::EndpointDocumentation) by the splicer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HttpEvent {
    /// `GET users/{id}`, used in logs and errors.
    pub fn describe(&self) -> String {
        format!("{} {}", self.method.to_uppercase(), self.path)
    }
}

/// Reads either the full `http:` mapping or the `http: GET users/{id}` shorthand.
fn http_event<'de, D>(deserializer: D) -> Result<Option<HttpEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Shorthand(String),
        Full(HttpEvent),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Full(event)) => Ok(Some(event)),
        Some(Repr::Shorthand(line)) => {
            let (method, path) = line
                .trim()
                .split_once(char::is_whitespace)
                .ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "http event shorthand must be \"METHOD path\", got \"{}\"",
                        line
                    ))
                })?;
            Ok(Some(HttpEvent {
                path: path.trim().to_string(),
                method: method.to_string(),
                ..Default::default()
            }))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomConfig {
    /// The global documentation tree: `version`, `api`, `authorizers`,
    /// `resources`, `models`, `swagger`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A service configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionRecord>,
    #[serde(default)]
    pub custom: CustomConfig,
}

impl ServiceDefinition {
    /// Parse a YAML (or JSON) service definition.
    pub fn from_yaml(input: &str) -> Result<Self, DocumentationError> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, DocumentationError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn documentation(&self) -> Option<&Value> {
        self.custom.documentation.as_ref()
    }

    /// Configured model descriptors (`custom.documentation.models`).
    pub fn models(&self) -> Result<Vec<ModelDescriptor>, DocumentationError> {
        model_descriptors(self.documentation().and_then(|d| d.get("models")))
    }
}

impl FunctionRegistry for ServiceDefinition {
    fn get_all_functions(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    fn get_function(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions.get(name)
    }

    fn get_function_mut(&mut self, name: &str) -> Option<&mut FunctionRecord> {
        self.functions.get_mut(name)
    }
}

/// Resource naming as done by the Serverless Framework's AWS provider.
#[derive(Debug, Clone)]
pub struct ServerlessNaming {
    service: String,
}

impl ServerlessNaming {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn normalize_path_part(part: &str) -> String {
        let mut normalized = part.replace('-', "Dash");
        if let (Some(start), Some(end)) = (normalized.find('{'), normalized.rfind('}')) {
            if start < end {
                let variable = normalized[start + 1..end].to_string();
                normalized.replace_range(start..=end, &format!("{}Var", variable));
            }
        }
        let normalized: String = normalized
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        upper_first(&normalized)
    }
}

impl NamingService for ServerlessNaming {
    fn normalize_path(&self, path: &str) -> String {
        path.split('/').map(Self::normalize_path_part).collect()
    }

    fn get_method_logical_id(&self, resource_key: &str, method: &str) -> String {
        format!(
            "ApiGatewayMethod{}{}",
            resource_key,
            upper_first(&method.to_lowercase())
        )
    }

    fn get_stack_name(&self, stage: &str) -> String {
        format!("{}-{}", self.service, stage)
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
