//! Compiles model descriptors into API Gateway model resources.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DocumentationError;
use crate::location::LocationType;
use crate::template::DependencySet;

/// Resource type of a compiled model.
pub const MODEL_RESOURCE_TYPE: &str = "AWS::ApiGateway::Model";

/// Base of the cross-reference URL a model schema uses to point at another model.
const MODEL_URL_BASE: &str = "https://apigateway.amazonaws.com/restapis";

/// A named request/response body schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub name: String,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Template logical id of the resource compiled for model `name`.
pub fn model_logical_id(name: &str) -> String {
    format!("{}Model", name)
}

/// Read the `models` list of a global documentation tree.
///
/// An absent or null list yields no models.
pub fn model_descriptors(models: Option<&Value>) -> Result<Vec<ModelDescriptor>, DocumentationError> {
    let items = match models {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(DocumentationError::InvalidDefinition {
                location_type: LocationType::Model,
            })
        }
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item.clone()).map_err(|source| {
                DocumentationError::MalformedDocumentation {
                    context: format!("models[{}]", i),
                    source,
                }
            })
        })
        .collect()
}

/// A compiled `AWS::ApiGateway::Model` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(rename = "Properties")]
    pub properties: ModelProperties,
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelProperties {
    pub rest_api_id: Value,
    pub content_type: String,
    pub name: String,
    pub schema: Value,
}

/// Turns [`ModelDescriptor`]s into model resources of one REST API.
#[derive(Debug, Clone)]
pub struct ModelCompiler {
    rest_api_id: Value,
}

impl ModelCompiler {
    /// `rest_api_id` is usually `{"Ref": "ApiGatewayRestApi"}`.
    pub fn new(rest_api_id: Value) -> Self {
        Self { rest_api_id }
    }

    pub fn compile(&self, descriptor: &ModelDescriptor) -> ModelResource {
        let mut schema = descriptor
            .schema
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let mut deps = DependencySet::new();
        resolve_model_refs(&self.rest_api_id, &mut schema, &mut deps);

        ModelResource {
            resource_type: MODEL_RESOURCE_TYPE.to_string(),
            properties: ModelProperties {
                rest_api_id: self.rest_api_id.clone(),
                content_type: descriptor.content_type.clone(),
                name: descriptor.name.clone(),
                schema,
            },
            depends_on: deps.into_depends_on(),
        }
    }
}

fn model_placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{model:\s*([\w-]+)\}\}").expect("valid model pattern"))
}

/// Rewrite every `$ref: "{{model: Name}}"` in `schema` into a cross-reference
/// to the compiled model, recording `NameModel` as a dependency.
pub fn resolve_model_refs(rest_api_id: &Value, schema: &mut Value, deps: &mut DependencySet) {
    match schema {
        Value::Object(obj) => {
            for (key, value) in obj.iter_mut() {
                if key == "$ref" {
                    let name = value
                        .as_str()
                        .and_then(|s| model_placeholder().captures(s))
                        .and_then(|c| c.get(1))
                        .map(|m| m.as_str().to_string());
                    if let Some(name) = name {
                        *value = model_url(rest_api_id, &name);
                        deps.insert(model_logical_id(&name));
                    }
                } else {
                    resolve_model_refs(rest_api_id, value, deps);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                resolve_model_refs(rest_api_id, item, deps);
            }
        }
        _ => {}
    }
}

/// `Fn::Join` expression resolving to the model's URL at deploy time.
fn model_url(rest_api_id: &Value, name: &str) -> Value {
    let parts = vec![
        Value::String(MODEL_URL_BASE.into()),
        rest_api_id.clone(),
        Value::String("models".into()),
        Value::String(name.into()),
    ];
    let mut join = Map::new();
    join.insert(
        "Fn::Join".into(),
        Value::Array(vec![Value::String("/".into()), Value::Array(parts)]),
    );
    Value::Object(join)
}
