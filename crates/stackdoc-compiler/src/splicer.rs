//! Splices endpoint documentation into the template's method resources.
//!
//! The method resource is owned by the template compiler and may carry
//! hand-written settings, so the splicer only adds: existing method
//! responses are merged by status code, existing request parameters are
//! never overwritten.

use serde_json::{Map, Value};

use crate::documentation::{EndpointDocumentation, MethodResponseDoc, ParameterDoc};
use crate::error::DocumentationError;
use crate::model::model_logical_id;
use crate::service::{HttpEvent, NamingService};
use crate::template::{set_depends_on, DependencySet};

/// Applies [`EndpointDocumentation`] to method resources.
pub struct TemplateSplicer<'a, N: ?Sized> {
    naming: &'a N,
    doc_safe_mode: bool,
}

impl<'a, N: NamingService + ?Sized> TemplateSplicer<'a, N> {
    /// With `doc_safe_mode` set, request parameters are left alone entirely.
    pub fn new(naming: &'a N, doc_safe_mode: bool) -> Self {
        Self {
            naming,
            doc_safe_mode,
        }
    }

    /// Logical id of the method resource for `event`.
    pub fn resource_key(&self, event: &HttpEvent) -> String {
        let resource = self.naming.normalize_path(&event.path);
        self.naming.get_method_logical_id(&resource, &event.method)
    }

    pub fn splice_endpoint(
        &self,
        resources: &mut Map<String, Value>,
        event: &HttpEvent,
        doc: &EndpointDocumentation,
    ) -> Result<(), DocumentationError> {
        let resource_key = self.resource_key(event);
        let resource = resources
            .get_mut(&resource_key)
            .ok_or_else(|| DocumentationError::MissingResource {
                resource_key: resource_key.clone(),
            })?
            .as_object_mut()
            .ok_or_else(|| malformed(&resource_key, "resource is not an object"))?;

        let mut deps = DependencySet::new();
        {
            let properties = resource
                .entry("Properties")
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
                .ok_or_else(|| malformed(&resource_key, "Properties is not an object"))?;

            add_method_responses(properties, &doc.method_responses, &mut deps)
                .map_err(|reason| malformed(&resource_key, reason))?;
            add_request_models(properties, doc, &mut deps);
            if !self.doc_safe_mode {
                add_request_parameters(properties, doc)
                    .map_err(|reason| malformed(&resource_key, reason))?;
            }
        }

        tracing::debug!(
            resource = %resource_key,
            endpoint = %event.describe(),
            dependencies = deps.len(),
            "spliced endpoint documentation"
        );
        set_depends_on(resource, deps);
        Ok(())
    }
}

fn malformed(resource_key: &str, reason: &str) -> DocumentationError {
    DocumentationError::MalformedResource {
        resource_key: resource_key.to_string(),
        reason: reason.to_string(),
    }
}

fn add_model_dependencies<'m>(
    models: impl IntoIterator<Item = &'m String>,
    deps: &mut DependencySet,
) {
    for model in models {
        deps.insert(model_logical_id(model));
    }
}

fn models_object<'m>(models: impl IntoIterator<Item = (&'m String, &'m String)>) -> Value {
    Value::Object(
        models
            .into_iter()
            .map(|(content_type, model)| (content_type.clone(), Value::String(model.clone())))
            .collect(),
    )
}

/// Status codes compare as strings; templates hold both `200` and `"200"`.
fn status_code_of(entry: &Value) -> Option<String> {
    match entry.get("StatusCode")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn add_method_responses(
    properties: &mut Map<String, Value>,
    responses: &[MethodResponseDoc],
    deps: &mut DependencySet,
) -> Result<(), &'static str> {
    if responses.is_empty() {
        return Ok(());
    }
    let existing = properties
        .entry("MethodResponses")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or("MethodResponses is not a list")?;

    for response in responses {
        let position = existing
            .iter()
            .position(|entry| status_code_of(entry).as_deref() == Some(response.status_code.as_str()));

        match position {
            Some(index) => {
                let entry = existing[index]
                    .as_object_mut()
                    .ok_or("method response is not an object")?;
                if !response.response_models.is_empty() {
                    let models = entry
                        .entry("ResponseModels")
                        .or_insert_with(|| Value::Object(Map::new()))
                        .as_object_mut()
                        .ok_or("ResponseModels is not an object")?;
                    for (content_type, model) in &response.response_models {
                        models.insert(content_type.clone(), Value::String(model.clone()));
                    }
                }
            }
            None => existing.push(new_method_response(response)),
        }
        add_model_dependencies(response.response_models.values(), deps);
    }
    Ok(())
}

fn new_method_response(response: &MethodResponseDoc) -> Value {
    let mut entry = Map::new();
    entry.insert(
        "StatusCode".into(),
        Value::String(response.status_code.clone()),
    );
    if !response.response_headers.is_empty() {
        let headers: Map<String, Value> = response
            .response_headers
            .iter()
            .map(|header| {
                (
                    format!("method.response.header.{}", header.name),
                    Value::Bool(true),
                )
            })
            .collect();
        entry.insert("ResponseParameters".into(), Value::Object(headers));
    }
    if !response.response_models.is_empty() {
        entry.insert(
            "ResponseModels".into(),
            models_object(&response.response_models),
        );
    }
    Value::Object(entry)
}

fn add_request_models(
    properties: &mut Map<String, Value>,
    doc: &EndpointDocumentation,
    deps: &mut DependencySet,
) {
    if doc.request_models.is_empty() {
        return;
    }
    add_model_dependencies(doc.request_models.values(), deps);
    properties.insert("RequestModels".into(), models_object(&doc.request_models));
}

fn add_request_parameters(
    properties: &mut Map<String, Value>,
    doc: &EndpointDocumentation,
) -> Result<(), &'static str> {
    let groups: [(&str, &[ParameterDoc]); 3] = [
        ("header", doc.request_headers.as_slice()),
        ("querystring", doc.query_params.as_slice()),
        ("path", doc.path_params.as_slice()),
    ];
    if groups.iter().all(|(_, params)| params.is_empty()) {
        return Ok(());
    }

    let request_parameters = properties
        .entry("RequestParameters")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or("RequestParameters is not an object")?;

    for (location, params) in groups {
        for param in params {
            let key = format!("method.request.{}.{}", location, param.name);
            request_parameters
                .entry(key)
                .or_insert(Value::Bool(param.required.unwrap_or(false)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Naming used by the template fixtures: `users/{id}` + `get` -> `usersid_get`.
    struct FlatNaming;

    impl NamingService for FlatNaming {
        fn normalize_path(&self, path: &str) -> String {
            path.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
        }

        fn get_method_logical_id(&self, resource_key: &str, method: &str) -> String {
            format!("{}_{}", resource_key, method)
        }

        fn get_stack_name(&self, stage: &str) -> String {
            format!("test-{}", stage)
        }
    }

    fn event(path: &str, method: &str) -> HttpEvent {
        HttpEvent {
            path: path.into(),
            method: method.into(),
            ..Default::default()
        }
    }

    fn doc(value: Value) -> EndpointDocumentation {
        EndpointDocumentation::from_value(&value, "test").unwrap()
    }

    #[test]
    fn merges_models_into_existing_responses() {
        let mut resources = json!({
            "usersid_get": {
                "Type": "AWS::ApiGateway::Method",
                "Properties": {
                    "MethodResponses": [
                        {"StatusCode": 200, "ResponseParameters": {"method.response.header.X": true}},
                        {"StatusCode": "404"}
                    ]
                }
            }
        });
        let documentation = doc(json!({
            "methodResponses": [
                {"statusCode": "200", "responseModels": {"application/json": "User"}},
                {"statusCode": 404, "responseModels": {"application/json": "Error"}}
            ]
        }));
        TemplateSplicer::new(&FlatNaming, false)
            .splice_endpoint(
                resources.as_object_mut().unwrap(),
                &event("users/{id}", "get"),
                &documentation,
            )
            .unwrap();

        assert_eq!(
            resources["usersid_get"],
            json!({
                "Type": "AWS::ApiGateway::Method",
                "Properties": {
                    "MethodResponses": [
                        {
                            "StatusCode": 200,
                            "ResponseParameters": {"method.response.header.X": true},
                            "ResponseModels": {"application/json": "User"}
                        },
                        {"StatusCode": "404", "ResponseModels": {"application/json": "Error"}}
                    ]
                },
                "DependsOn": ["UserModel", "ErrorModel"]
            })
        );
    }

    #[test]
    fn appends_new_responses_with_header_parameters() {
        let mut resources = json!({
            "users_post": {"Properties": {"MethodResponses": [{"StatusCode": "500"}]}}
        });
        let documentation = doc(json!({
            "methodResponses": [{
                "statusCode": 201,
                "responseHeaders": [{"name": "Location"}]
            }]
        }));
        TemplateSplicer::new(&FlatNaming, false)
            .splice_endpoint(
                resources.as_object_mut().unwrap(),
                &event("users", "post"),
                &documentation,
            )
            .unwrap();

        let resource = &resources["users_post"];
        assert_eq!(
            resource["Properties"]["MethodResponses"],
            json!([
                {"StatusCode": "500"},
                {
                    "StatusCode": "201",
                    "ResponseParameters": {"method.response.header.Location": true}
                }
            ])
        );
        assert!(resource.get("DependsOn").is_none());
    }

    #[test]
    fn request_models_replace_existing_and_record_dependencies() {
        let mut resources = json!({
            "users_post": {
                "Properties": {"RequestModels": {"text/plain": "Old"}},
                "DependsOn": ["SomethingElse"]
            }
        });
        let documentation = doc(json!({
            "requestModels": {"application/json": "CreateUser", "application/xml": "CreateUser"}
        }));
        TemplateSplicer::new(&FlatNaming, false)
            .splice_endpoint(
                resources.as_object_mut().unwrap(),
                &event("users", "post"),
                &documentation,
            )
            .unwrap();

        assert_eq!(
            resources["users_post"],
            json!({
                "Properties": {
                    "RequestModels": {
                        "application/json": "CreateUser",
                        "application/xml": "CreateUser"
                    }
                },
                "DependsOn": ["CreateUserModel"]
            })
        );
    }

    #[test]
    fn model_dependencies_follow_authored_content_type_order() {
        let mut resources = json!({"users_post": {"Properties": {}}});
        let documentation = doc(json!({
            "requestModels": {"text/plain": "Zed", "application/json": "Alpha"},
            "methodResponses": [
                {"statusCode": 200, "responseModels": {"text/xml": "Yak", "application/json": "Beta"}}
            ]
        }));
        TemplateSplicer::new(&FlatNaming, false)
            .splice_endpoint(
                resources.as_object_mut().unwrap(),
                &event("users", "post"),
                &documentation,
            )
            .unwrap();

        let resource = &resources["users_post"];
        assert_eq!(
            resource["DependsOn"],
            json!(["YakModel", "BetaModel", "ZedModel", "AlphaModel"])
        );
        let request_models: Vec<&String> = resource["Properties"]["RequestModels"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(request_models, ["text/plain", "application/json"]);
    }

    #[test]
    fn request_parameters_never_overwrite_existing_keys() {
        let mut resources = json!({
            "usersid_get": {
                "Properties": {
                    "RequestParameters": {"method.request.path.id": "caller-defined"}
                }
            }
        });
        let documentation = doc(json!({
            "pathParams": [{"name": "id", "required": true}],
            "queryParams": [{"name": "page"}],
            "requestHeaders": [{"name": "X-Auth", "required": true}]
        }));
        TemplateSplicer::new(&FlatNaming, false)
            .splice_endpoint(
                resources.as_object_mut().unwrap(),
                &event("users/{id}", "get"),
                &documentation,
            )
            .unwrap();

        assert_eq!(
            resources["usersid_get"]["Properties"]["RequestParameters"],
            json!({
                "method.request.path.id": "caller-defined",
                "method.request.querystring.page": false,
                "method.request.header.X-Auth": true
            })
        );
    }

    #[test]
    fn doc_safe_mode_leaves_parameters_alone() {
        let mut resources = json!({"usersid_get": {"Properties": {}}});
        let documentation = doc(json!({
            "pathParams": [{"name": "id", "required": true}],
            "queryParams": [{"name": "page"}],
            "requestHeaders": [{"name": "X-Auth"}]
        }));
        TemplateSplicer::new(&FlatNaming, true)
            .splice_endpoint(
                resources.as_object_mut().unwrap(),
                &event("users/{id}", "get"),
                &documentation,
            )
            .unwrap();

        assert_eq!(resources["usersid_get"], json!({"Properties": {}}));
    }

    #[test]
    fn missing_resource_fails_fast() {
        let mut resources = Map::new();
        let err = TemplateSplicer::new(&FlatNaming, false)
            .splice_endpoint(
                &mut resources,
                &event("users", "get"),
                &EndpointDocumentation::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            DocumentationError::MissingResource { ref resource_key } if resource_key == "users_get"
        ));
    }

    #[test]
    fn malformed_method_responses_are_reported() {
        let mut resources = json!({"users_get": {"Properties": {"MethodResponses": "nope"}}});
        let documentation = doc(json!({"methodResponses": [{"statusCode": 200}]}));
        let err = TemplateSplicer::new(&FlatNaming, false)
            .splice_endpoint(
                resources.as_object_mut().unwrap(),
                &event("users", "get"),
                &documentation,
            )
            .unwrap_err();
        assert!(err.to_string().starts_with("E2005"));
    }
}
