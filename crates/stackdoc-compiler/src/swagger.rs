//! Swagger 2.0 import.
//!
//! Translates `definitions` into model descriptors and each path operation
//! into [`EndpointDocumentation`], rewriting `#/definitions/<name>`
//! references into `{{model: <name>}}` placeholders that the model compiler
//! later resolves.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::{Map, Value};

use crate::documentation::{EndpointDocumentation, MethodResponseDoc, ParameterDoc};
use crate::model::ModelDescriptor;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Operation keys of a Swagger path item.
const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];

/// Identifies an endpoint independent of leading slashes and method case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointKey {
    pub path: String,
    pub method: String,
}

impl EndpointKey {
    pub fn new(path: &str, method: &str) -> Self {
        Self {
            path: path.trim_start_matches('/').to_string(),
            method: method.to_uppercase(),
        }
    }
}

/// Result of importing a Swagger document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwaggerImport {
    pub models: Vec<ModelDescriptor>,
    pub endpoint_docs: BTreeMap<EndpointKey, EndpointDocumentation>,
}

fn definition_ref() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#/definitions/([\w-]+)").expect("valid definition pattern"))
}

fn definition_name(reference: &str) -> Option<String> {
    definition_ref()
        .captures(reference)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Rewrite every `$ref: "#/definitions/<name>"` below `value` into `{{model: <name>}}`.
pub fn replace_swagger_refs(value: &mut Value) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj.iter_mut() {
                if key == "$ref" {
                    if let Some(name) = child.as_str().and_then(definition_name) {
                        *child = Value::String(format!("{{{{model: {}}}}}", name));
                    }
                } else {
                    replace_swagger_refs(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(replace_swagger_refs),
        _ => {}
    }
}

/// Resolve the model a body parameter or response refers to.
///
/// A bare `$ref` to a definition yields that definition's name; the model is
/// assumed to come from `definitions`. An inline schema becomes a new model
/// named `name`, appended to `models`. Returns `None` when there is no
/// schema or the reference points outside `definitions`.
pub fn extract_model(
    container: &Value,
    name: &str,
    models: &mut Vec<ModelDescriptor>,
) -> Option<String> {
    let schema = container.get("schema")?;
    if let Some(reference) = schema.get("$ref") {
        return reference.as_str().and_then(definition_name);
    }

    let mut schema = schema.clone();
    replace_swagger_refs(&mut schema);
    models.push(ModelDescriptor {
        name: name.to_string(),
        content_type: JSON_CONTENT_TYPE.to_string(),
        schema: Some(schema),
        description: string_field(container, "description"),
    });
    Some(name.to_string())
}

/// Import models and per-endpoint documentation from a Swagger document.
pub fn import_swagger(swagger: &Value) -> SwaggerImport {
    let mut import = SwaggerImport::default();

    if let Some(definitions) = swagger.get("definitions").and_then(Value::as_object) {
        for (name, schema) in definitions {
            let mut schema = schema.clone();
            replace_swagger_refs(&mut schema);
            import.models.push(ModelDescriptor {
                name: name.clone(),
                content_type: JSON_CONTENT_TYPE.to_string(),
                description: string_field(&schema, "description"),
                schema: Some(schema),
            });
        }
    }

    let Some(paths) = swagger.get("paths").and_then(Value::as_object) else {
        return import;
    };

    for (path, path_item) in paths {
        let path_params = path_item.get("parameters");
        for method in HTTP_METHODS {
            let Some(operation) = path_item.get(*method) else {
                continue;
            };
            let doc = import_operation(path, method, operation, path_params, &mut import.models);
            tracing::debug!(path = %path, method = %method, "imported swagger operation");
            import.endpoint_docs.insert(EndpointKey::new(path, method), doc);
        }
    }

    import
}

fn import_operation(
    path: &str,
    method: &str,
    operation: &Value,
    path_params: Option<&Value>,
    models: &mut Vec<ModelDescriptor>,
) -> EndpointDocumentation {
    let base_name = operation_base_name(path, method, operation);
    let mut doc = EndpointDocumentation {
        summary: string_field(operation, "summary"),
        description: string_field(operation, "description"),
        tags: operation
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        ..Default::default()
    };

    // Path-level parameters apply to every operation of the path.
    let parameters = path_params
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .chain(
            operation
                .get("parameters")
                .and_then(Value::as_array)
                .into_iter()
                .flatten(),
        );

    for param in parameters {
        match param.get("in").and_then(Value::as_str) {
            Some("header") => doc.request_headers.push(parameter_doc(param)),
            Some("path") => doc.path_params.push(parameter_doc(param)),
            Some("query") => doc.query_params.push(parameter_doc(param)),
            Some("body") => {
                let name =
                    string_field(param, "name").unwrap_or_else(|| format!("{}Request", base_name));
                if let Some(model) = extract_model(param, &name, models) {
                    doc.request_models
                        .insert(JSON_CONTENT_TYPE.to_string(), model);
                }
                if let Some(description) = string_field(param, "description") {
                    let mut body = Map::new();
                    body.insert("description".into(), Value::String(description));
                    doc.request_body = Some(Value::Object(body));
                }
            }
            _ => {}
        }
    }

    if let Some(responses) = operation.get("responses").and_then(Value::as_object) {
        for (status_code, response) in responses {
            // `default` has no status code to attach a method response to
            if status_code.parse::<u16>().is_err() {
                continue;
            }
            let mut method_response = MethodResponseDoc {
                status_code: status_code.clone(),
                description: string_field(response, "description"),
                ..Default::default()
            };
            let name = format!("{}{}Response", base_name, status_code);
            if let Some(model) = extract_model(response, &name, models) {
                method_response
                    .response_models
                    .insert(JSON_CONTENT_TYPE.to_string(), model);
            }
            if let Some(headers) = response.get("headers").and_then(Value::as_object) {
                for (header, spec) in headers {
                    method_response.response_headers.push(ParameterDoc {
                        name: header.clone(),
                        description: string_field(spec, "description"),
                        required: None,
                    });
                }
            }
            doc.method_responses.push(method_response);
        }
    }

    doc
}

fn parameter_doc(param: &Value) -> ParameterDoc {
    ParameterDoc {
        name: string_field(param, "name").unwrap_or_default(),
        description: string_field(param, "description"),
        required: param.get("required").and_then(Value::as_bool),
    }
}

/// Model name stem for synthesized models: the `operationId`, or a
/// PascalCase rendering of method and path.
fn operation_base_name(path: &str, method: &str, operation: &Value) -> String {
    if let Some(id) = operation.get("operationId").and_then(Value::as_str) {
        return id.to_string();
    }
    std::iter::once(method)
        .chain(path.split(|c: char| !c.is_ascii_alphanumeric()))
        .filter(|s| !s.is_empty())
        .map(upper_first)
        .collect()
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
