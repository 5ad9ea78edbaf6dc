//! Exports the published documentation of a stack to a file.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::error::DocumentationError;
use crate::sync::{fetch_rest_api_id, StoreClient, DOCUMENTATION_SERVICE};

const DEFAULT_EXPORT_TYPE: &str = "swagger";
const DEFAULT_EXTENSIONS: &str = "integrations";
const SUPPORTED_EXTENSIONS: &[&str] = &["integrations", "apigateway", "authorizers", "postman"];

/// Options of `download_documentation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub output_file_name: PathBuf,
    /// Export format, `swagger` when unset.
    pub export_type: Option<String>,
    /// Vendor extensions to include, `integrations` when unset or unsupported.
    pub extensions: Option<String>,
}

impl DownloadOptions {
    pub fn new(output_file_name: impl Into<PathBuf>) -> Self {
        Self {
            output_file_name: output_file_name.into(),
            export_type: None,
            extensions: None,
        }
    }

    pub fn with_export_type(mut self, export_type: impl Into<String>) -> Self {
        self.export_type = Some(export_type.into());
        self
    }

    pub fn with_extensions(mut self, extensions: impl Into<String>) -> Self {
        self.extensions = Some(extensions.into());
        self
    }
}

/// The requested extensions if supported, else the default.
pub fn extension_type(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|r| SUPPORTED_EXTENSIONS.iter().find(|ext| **ext == r))
        .copied()
        .unwrap_or(DEFAULT_EXTENSIONS)
}

/// `application/yaml` for `.yml`/`.yaml` targets, `application/json` otherwise.
pub fn export_content_type(output_file_name: &Path) -> &'static str {
    match output_file_name.extension().and_then(|ext| ext.to_str()) {
        Some("yml" | "yaml") => "application/yaml",
        _ => "application/json",
    }
}

/// Fetch the export of the stack's REST API and write its raw body to
/// `options.output_file_name`.
pub async fn download_documentation<C: StoreClient + ?Sized>(
    client: &C,
    stack_name: &str,
    stage: &str,
    options: &DownloadOptions,
) -> Result<(), DocumentationError> {
    let rest_api_id = fetch_rest_api_id(client, stack_name).await?;
    let response = client
        .request(
            DOCUMENTATION_SERVICE,
            "getExport",
            json!({
                "stageName": stage,
                "restApiId": rest_api_id,
                "exportType": options.export_type.as_deref().unwrap_or(DEFAULT_EXPORT_TYPE),
                "parameters": {
                    "extensions": extension_type(options.extensions.as_deref()),
                },
                "accepts": export_content_type(&options.output_file_name),
            }),
        )
        .await?;

    let body = match response.get("body") {
        Some(Value::String(body)) => body.clone().into_bytes(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => serde_json::to_vec_pretty(other)?,
    };
    tokio::fs::write(&options.output_file_name, &body).await?;

    stackdoc_telemetry::log_export_written!(
        path = %options.output_file_name.display(),
        bytes = body.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::testing::{stack_with_api_id, MockStore};

    fn export_store() -> MockStore {
        MockStore::new(|service, operation, _| match (service, operation) {
            ("CloudFormation", "describeStacks") => Ok(stack_with_api_id("api123")),
            ("APIGateway", "getExport") => Ok(json!({"body": "swagger: '2.0'\n"})),
            _ => Err(RemoteError::new(service, operation, "unexpected")),
        })
    }

    #[test]
    fn unsupported_extensions_fall_back() {
        assert_eq!(extension_type(Some("postman")), "postman");
        assert_eq!(extension_type(Some("unknown")), "integrations");
        assert_eq!(extension_type(None), "integrations");
    }

    #[test]
    fn content_type_follows_file_extension() {
        assert_eq!(export_content_type(Path::new("api.yml")), "application/yaml");
        assert_eq!(export_content_type(Path::new("api.yaml")), "application/yaml");
        assert_eq!(export_content_type(Path::new("api.json")), "application/json");
        assert_eq!(export_content_type(Path::new("api")), "application/json");
    }

    #[tokio::test]
    async fn writes_export_body_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("api.yml");
        let store = export_store();

        let options = DownloadOptions::new(&target).with_extensions("apigateway");
        download_documentation(&store, "pets-dev", "dev", &options)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "swagger: '2.0'\n");
        let export = &store.calls_to("getExport")[0];
        assert_eq!(export.service, "APIGateway");
        assert_eq!(
            export.params,
            json!({
                "stageName": "dev",
                "restApiId": "api123",
                "exportType": "swagger",
                "parameters": {"extensions": "apigateway"},
                "accepts": "application/yaml",
            })
        );
    }

    #[tokio::test]
    async fn export_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("api.json");
        let store = MockStore::new(|service, operation, _| match operation {
            "describeStacks" => Ok(stack_with_api_id("api123")),
            _ => Err(RemoteError::new(service, operation, "Not Found")),
        });

        let err = download_documentation(&store, "pets-dev", "dev", &DownloadOptions::new(&target))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentationError::Remote(_)));
        assert!(!target.exists());
    }
}
