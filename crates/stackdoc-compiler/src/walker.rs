//! Derives documentation parts by walking a [`PartSchema`] tree against a definition.

use serde_json::{Map, Value};

use crate::error::DocumentationError;
use crate::location::{DocumentationPart, Location};
use crate::part_schema::{PartSchema, SchemaTree};

/// Accumulates the parts emitted while walking one or more definitions.
#[derive(Debug, Default)]
pub struct PartWalker {
    rest_api_id: Option<String>,
    parts: Vec<DocumentationPart>,
}

impl PartWalker {
    pub fn new(rest_api_id: Option<String>) -> Self {
        Self {
            rest_api_id,
            parts: Vec::new(),
        }
    }

    /// Walk every node of `tree` whose key is present in `def`.
    pub fn walk_tree(
        &mut self,
        tree: SchemaTree,
        def: &Value,
        known: &Location,
    ) -> Result<(), DocumentationError> {
        for (key, node) in tree {
            match def.get(key) {
                None | Some(Value::Null) => {}
                Some(child) => self.walk(node, child, known)?,
            }
        }
        Ok(())
    }

    /// Walk a single schema node.
    ///
    /// List nodes require `def` to be a sequence and apply to each element,
    /// all sharing `known`.
    pub fn walk(
        &mut self,
        schema: &PartSchema,
        def: &Value,
        known: &Location,
    ) -> Result<(), DocumentationError> {
        if !schema.is_list {
            return self.walk_single(schema, def, known);
        }
        let items = def
            .as_array()
            .ok_or(DocumentationError::InvalidDefinition {
                location_type: schema.location_type,
            })?;
        for item in items {
            self.walk_single(schema, item, known)?;
        }
        Ok(())
    }

    fn walk_single(
        &mut self,
        schema: &PartSchema,
        def: &Value,
        known: &Location,
    ) -> Result<(), DocumentationError> {
        let mut location = Location::new(schema.location_type);
        for prop in schema.location_props {
            let value = known
                .get(*prop)
                .map(str::to_string)
                .or_else(|| def.get(prop.key()).and_then(coordinate));
            location.set(*prop, value);
        }

        let properties = documentation_properties(schema, def);
        if !properties.is_empty() {
            tracing::trace!(location = %location.identifier(), "documentation part");
            self.parts.push(DocumentationPart {
                location: location.clone(),
                properties,
                rest_api_id: self.rest_api_id.clone(),
            });
        }

        self.walk_tree(schema.children, def, &location)
    }

    pub fn parts(&self) -> &[DocumentationPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<DocumentationPart> {
        self.parts
    }
}

/// Copy the documentation-relevant keys of `def`, in the type's declared order.
fn documentation_properties(schema: &PartSchema, def: &Value) -> Map<String, Value> {
    let mut properties = Map::new();
    for key in schema.location_type.documentation_properties() {
        match def.get(*key) {
            None | Some(Value::Null) => {}
            Some(value) => {
                properties.insert((*key).to_string(), value.clone());
            }
        }
    }
    properties
}

/// Location coordinates may be authored as numbers (status codes).
fn coordinate(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{LocationField, LocationType};
    use crate::part_schema::{FUNCTION_DOCUMENTATION_PARTS, GLOBAL_DOCUMENTATION_PARTS};
    use serde_json::json;

    fn walker() -> PartWalker {
        PartWalker::new(Some("testApiId".into()))
    }

    #[test]
    fn api_part_includes_tags() {
        let schema = PartSchema {
            location_type: LocationType::Api,
            is_list: false,
            location_props: &[],
            children: &[],
        };
        let def = json!({"description": "d", "summary": "s", "tags": ["t"]});
        let mut w = walker();
        w.walk(&schema, &def, &Location::root()).unwrap();

        let parts = w.into_parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(
            serde_json::to_value(&parts[0]).unwrap(),
            json!({
                "location": {"type": "API"},
                "properties": {"description": "d", "summary": "s", "tags": ["t"]},
                "restApiId": "testApiId"
            })
        );
    }

    #[test]
    fn method_part_takes_coordinates_from_known_location() {
        let schema = PartSchema {
            location_type: LocationType::Method,
            is_list: false,
            location_props: &[LocationField::Path, LocationField::Method],
            children: &[],
        };
        let known = Location::root()
            .with(LocationField::Path, "/some/path")
            .with(LocationField::Method, "GET");
        let def = json!({"description": "d", "tags": ["t"], "info": {"ignored": true}});
        let mut w = walker();
        w.walk(&schema, &def, &known).unwrap();

        let part = &w.parts()[0];
        assert_eq!(part.location.path.as_deref(), Some("/some/path"));
        assert_eq!(part.location.method.as_deref(), Some("GET"));
        assert_eq!(
            Value::Object(part.properties.clone()),
            json!({"description": "d", "tags": ["t"]})
        );
    }

    #[test]
    fn parameter_part_ignores_tags_and_keeps_required() {
        let schema = PartSchema {
            location_type: LocationType::QueryParameter,
            is_list: true,
            location_props: &[LocationField::Path, LocationField::Method, LocationField::Name],
            children: &[],
        };
        let known = Location::root()
            .with(LocationField::Path, "/some/path")
            .with(LocationField::Method, "GET");
        let def = json!([{"name": "page", "description": "d", "tags": ["t"], "required": true}]);
        let mut w = walker();
        w.walk(&schema, &def, &known).unwrap();

        let part = &w.parts()[0];
        assert_eq!(part.location.name.as_deref(), Some("page"));
        assert_eq!(
            Value::Object(part.properties.clone()),
            json!({"description": "d", "required": true})
        );
    }

    #[test]
    fn list_node_rejects_non_sequence() {
        let schema = PartSchema {
            location_type: LocationType::QueryParameter,
            is_list: true,
            location_props: &[LocationField::Path, LocationField::Method, LocationField::Name],
            children: &[],
        };
        let err = walker()
            .walk(&schema, &json!({"name": "page"}), &Location::root())
            .unwrap_err();
        assert!(matches!(
            err,
            DocumentationError::InvalidDefinition {
                location_type: LocationType::QueryParameter
            }
        ));
        assert!(err.to_string().contains("QUERY_PARAMETER"));
    }

    #[test]
    fn nodes_without_properties_emit_nothing() {
        let def = json!({
            "api": {"title": "not a documentation property"},
            "models": [{"name": "Empty"}, {"name": "User", "description": "a user"}]
        });
        let mut w = walker();
        w.walk_tree(GLOBAL_DOCUMENTATION_PARTS, &def, &Location::root())
            .unwrap();

        let parts = w.into_parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].location.location_type, LocationType::Model);
        assert_eq!(parts[0].location.name.as_deref(), Some("User"));
    }

    #[test]
    fn global_models_must_be_a_list() {
        let def = json!({"models": {"name": "User", "description": "a user"}});
        let err = walker()
            .walk_tree(GLOBAL_DOCUMENTATION_PARTS, &def, &Location::root())
            .unwrap_err();
        assert!(matches!(
            err,
            DocumentationError::InvalidDefinition {
                location_type: LocationType::Model
            }
        ));
    }

    #[test]
    fn endpoint_tree_emits_parts_in_schema_order() {
        let event = json!({
            "path": "users/{id}",
            "method": "get",
            "documentation": {
                "methodResponses": [{
                    "statusCode": 200,
                    "description": "ok",
                    "responseHeaders": [{"name": "x-trace", "description": "trace id"}],
                    "responseBody": {"description": "the user"}
                }],
                "pathParams": [{"name": "id", "description": "user id", "required": true}],
                "summary": "get a user"
            }
        });
        let known = Location::root()
            .with(LocationField::Path, "users/{id}")
            .with(LocationField::Method, "GET");
        let mut w = walker();
        w.walk_tree(FUNCTION_DOCUMENTATION_PARTS, &event, &known)
            .unwrap();

        let ids: Vec<String> = w.parts().iter().map(|p| p.location.identifier()).collect();
        assert_eq!(
            ids,
            [
                "METHOD path=users/{id} method=GET",
                "PATH_PARAMETER path=users/{id} method=GET name=id",
                "RESPONSE path=users/{id} method=GET statusCode=200",
                "RESPONSE_HEADER path=users/{id} method=GET name=x-trace statusCode=200",
                "RESPONSE_BODY path=users/{id} method=GET statusCode=200",
            ]
        );
    }
}
