//! Static trees describing where documentation lives in a definition.

use serde_json::Value;

use crate::error::DocumentationError;
use crate::location::{LocationField, LocationType};

use LocationField::{Method, Name, Path, StatusCode};

/// One node of a part schema.
///
/// Children are keyed by the definition field they read, and are visited in
/// declaration order.
#[derive(Debug)]
pub struct PartSchema {
    pub location_type: LocationType,
    pub is_list: bool,
    pub location_props: &'static [LocationField],
    pub children: SchemaTree,
}

/// Ordered `(definition key, node)` pairs.
pub type SchemaTree = &'static [(&'static str, PartSchema)];

impl PartSchema {
    /// Check that `def` and every present descendant list node are sequences.
    pub fn check_shape(&self, def: &Value) -> Result<(), DocumentationError> {
        if !self.is_list {
            return check_tree_shape(self.children, def);
        }
        def.as_array()
            .ok_or(DocumentationError::InvalidDefinition {
                location_type: self.location_type,
            })?
            .iter()
            .try_for_each(|item| check_tree_shape(self.children, item))
    }
}

/// [`PartSchema::check_shape`] for every node of `tree` present in `def`.
pub fn check_tree_shape(tree: SchemaTree, def: &Value) -> Result<(), DocumentationError> {
    for (key, node) in tree {
        match def.get(key) {
            None | Some(Value::Null) => {}
            Some(child) => node.check_shape(child)?,
        }
    }
    Ok(())
}

/// Global documentation: `custom.documentation` of a service.
pub static GLOBAL_DOCUMENTATION_PARTS: SchemaTree = &[
    (
        "api",
        PartSchema {
            location_type: LocationType::Api,
            is_list: false,
            location_props: &[],
            children: &[],
        },
    ),
    (
        "authorizers",
        PartSchema {
            location_type: LocationType::Authorizer,
            is_list: true,
            location_props: &[Name],
            children: &[],
        },
    ),
    (
        "resources",
        PartSchema {
            location_type: LocationType::Resource,
            is_list: true,
            location_props: &[Path],
            children: &[],
        },
    ),
    (
        "models",
        PartSchema {
            location_type: LocationType::Model,
            is_list: true,
            location_props: &[Name],
            children: &[],
        },
    ),
];

/// Per-endpoint documentation, walked against an HTTP event.
pub static FUNCTION_DOCUMENTATION_PARTS: SchemaTree = &[(
    "documentation",
    PartSchema {
        location_type: LocationType::Method,
        is_list: false,
        location_props: &[Path, Method],
        children: &[
            (
                "requestBody",
                PartSchema {
                    location_type: LocationType::RequestBody,
                    is_list: false,
                    location_props: &[Path, Method],
                    children: &[],
                },
            ),
            (
                "requestHeaders",
                PartSchema {
                    location_type: LocationType::RequestHeader,
                    is_list: true,
                    location_props: &[Path, Method, Name],
                    children: &[],
                },
            ),
            (
                "queryParams",
                PartSchema {
                    location_type: LocationType::QueryParameter,
                    is_list: true,
                    location_props: &[Path, Method, Name],
                    children: &[],
                },
            ),
            (
                "pathParams",
                PartSchema {
                    location_type: LocationType::PathParameter,
                    is_list: true,
                    location_props: &[Path, Method, Name],
                    children: &[],
                },
            ),
            (
                "methodResponses",
                PartSchema {
                    location_type: LocationType::Response,
                    is_list: true,
                    location_props: &[Path, Method, StatusCode],
                    children: &[
                        (
                            "responseHeaders",
                            PartSchema {
                                location_type: LocationType::ResponseHeader,
                                is_list: true,
                                location_props: &[Path, Method, Name, StatusCode],
                                children: &[],
                            },
                        ),
                        (
                            "responseBody",
                            PartSchema {
                                location_type: LocationType::ResponseBody,
                                is_list: false,
                                location_props: &[Path, Method, StatusCode],
                                children: &[],
                            },
                        ),
                    ],
                },
            ),
        ],
    },
)];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(tree: SchemaTree) {
        for (key, node) in tree {
            // every declared coordinate must identify the node's type
            for prop in node.location_props {
                assert!(
                    node.location_type.location_fields().contains(prop),
                    "{key}: {prop:?} is not a field of {}",
                    node.location_type
                );
            }
            check(node.children);
        }
    }

    #[test]
    fn schema_props_match_location_fields() {
        check(GLOBAL_DOCUMENTATION_PARTS);
        check(FUNCTION_DOCUMENTATION_PARTS);
    }

    #[test]
    fn nested_list_nodes_must_be_sequences() {
        let documentation = json!({
            "documentation": {
                "queryParams": [{"name": "page"}],
                "methodResponses": [
                    {"statusCode": 200, "responseHeaders": [{"name": "ETag"}]},
                    {"statusCode": 404, "responseHeaders": {"name": "ETag"}}
                ]
            }
        });
        assert!(matches!(
            check_tree_shape(FUNCTION_DOCUMENTATION_PARTS, &documentation).unwrap_err(),
            DocumentationError::InvalidDefinition {
                location_type: LocationType::ResponseHeader
            }
        ));

        let fine = json!({"documentation": {"queryParams": null, "requestBody": {"description": "x"}}});
        check_tree_shape(FUNCTION_DOCUMENTATION_PARTS, &fine).unwrap();
    }

    #[test]
    fn function_tree_is_rooted_at_method() {
        let (key, method) = &FUNCTION_DOCUMENTATION_PARTS[0];
        assert_eq!(*key, "documentation");
        assert_eq!(method.location_type, LocationType::Method);
        let keys: Vec<&str> = method.children.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            [
                "requestBody",
                "requestHeaders",
                "queryParams",
                "pathParams",
                "methodResponses"
            ]
        );
    }
}
