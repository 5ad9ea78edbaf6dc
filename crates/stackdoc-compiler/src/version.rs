//! Content-hash versioning of the documentation set.
//!
//! The hash is a change-detection token: identical documentation yields the
//! same version, so an already-published version can be skipped.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Everything that contributes to the auto-version.
#[derive(Debug, Clone, Copy)]
pub struct VersionInput<'a> {
    /// The global documentation tree (`custom.documentation`).
    pub global_docs: &'a Value,
    /// Raw endpoint documentation keyed by function, method and path.
    ///
    /// Only events that carry a documentation object are included.
    pub function_docs: &'a BTreeMap<String, Value>,
}

impl VersionInput<'_> {
    /// The user-configured version, if any. Numbers (`version: 2`) render as written.
    pub fn explicit_version(&self) -> Option<String> {
        match self.global_docs.get("version")? {
            Value::String(version) => Some(version.clone()),
            Value::Number(version) => Some(version.to_string()),
            _ => None,
        }
    }
}

/// Resolves the version token, remembering the computed hash.
#[derive(Debug, Default)]
pub struct VersionGenerator {
    auto_version: Option<String>,
}

impl VersionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit version if configured, else the memoized or freshly computed hash.
    pub fn get_version(&mut self, input: VersionInput<'_>) -> Result<String, serde_json::Error> {
        if let Some(version) = input.explicit_version() {
            return Ok(version);
        }
        if let Some(version) = &self.auto_version {
            return Ok(version.clone());
        }
        let version = compute_version(input)?;
        tracing::debug!(version = %version, "computed documentation version");
        self.auto_version = Some(version.clone());
        Ok(version)
    }

    /// The memoized auto-version, if one was computed.
    pub fn auto_version(&self) -> Option<&str> {
        self.auto_version.as_deref()
    }
}

/// SHA-256 over the canonical JSON of `{globalDocs, functionDocs}`.
pub fn compute_version(input: VersionInput<'_>) -> Result<String, serde_json::Error> {
    let function_docs: Map<String, Value> = input
        .function_docs
        .iter()
        .map(|(key, doc)| (key.clone(), doc.clone()))
        .collect();

    let mut composite = Map::new();
    composite.insert("functionDocs".into(), Value::Object(function_docs));
    composite.insert("globalDocs".into(), input.global_docs.clone());

    let bytes = serde_json::to_vec(&canonicalize(Value::Object(composite)))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Key under which an endpoint's documentation enters the version hash.
pub fn function_docs_key(function_name: &str, method: &str, path: &str) -> String {
    format!("{} {} {}", function_name, method.to_uppercase(), path)
}

/// Rebuild objects with sorted keys so key order never affects the hash.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(obj) => {
            let sorted: BTreeMap<String, Value> = obj
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
