//! The compiled infrastructure template this crate mutates.
//!
//! Only `Resources` and `Outputs` are interpreted; every other section is
//! carried through untouched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Logical id of the REST API resource created by the template compiler.
pub const REST_API_LOGICAL_ID: &str = "ApiGatewayRestApi";

/// Stack output exposing the REST API id to the post-provision phase.
pub const API_ID_OUTPUT_KEY: &str = "AwsDocApiId";

/// A CloudFormation-style template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "Resources", default)]
    pub resources: Map<String, Value>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "Map::is_empty")]
    pub outputs: Map<String, Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Template {
    /// `{"Ref": "ApiGatewayRestApi"}`.
    pub fn rest_api_ref() -> Value {
        let mut reference = Map::new();
        reference.insert("Ref".into(), Value::String(REST_API_LOGICAL_ID.into()));
        Value::Object(reference)
    }

    /// Add the output the post-provision phase reads the API id from.
    pub fn add_api_id_output(&mut self) {
        let mut output = Map::new();
        output.insert("Description".into(), Value::String("API ID".into()));
        output.insert("Value".into(), Self::rest_api_ref());
        self.outputs
            .insert(API_ID_OUTPUT_KEY.into(), Value::Object(output));
    }
}

/// Insertion-ordered, duplicate-free accumulator for `DependsOn`.
#[derive(Debug, Clone, Default)]
pub struct DependencySet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, logical_id: impl Into<String>) {
        let logical_id = logical_id.into();
        if self.seen.insert(logical_id.clone()) {
            self.order.push(logical_id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// First-seen order, or `None` when empty: an absent `DependsOn` and an
    /// empty one are not equivalent to template consumers.
    pub fn into_depends_on(self) -> Option<Vec<String>> {
        if self.order.is_empty() {
            None
        } else {
            Some(self.order)
        }
    }
}

/// Write `deps` onto a resource object, removing the field when empty.
pub fn set_depends_on(resource: &mut Map<String, Value>, deps: DependencySet) {
    match deps.into_depends_on() {
        Some(ids) => {
            resource.insert(
                "DependsOn".into(),
                Value::Array(ids.into_iter().map(Value::String).collect()),
            );
        }
        None => {
            resource.remove("DependsOn");
        }
    }
}
