//! Publishes documentation parts after the stack is provisioned.
//!
//! The engine walks a fixed sequence of states:
//!
//! ```text
//! IDLE -> SKIP
//! IDLE -> FETCHING_STACK -> INSPECTED                       (no-deploy)
//!                        -> CHECKING_VERSION -> DONE        (version exists)
//!                        -> CHECKING_VERSION -> DELETING_OLD -> UPLOADING_NEW
//!                                            -> STAMPING_VERSION -> DONE
//! ```
//!
//! Any unexpected failure moves the engine to `FAILED` and is returned to
//! the caller. Nothing is retried.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use futures_util::future::{join_all, try_join_all};
use serde_json::{json, Value};

use crate::error::{DocumentationError, RemoteError};
use crate::location::DocumentationPart;
use crate::template::API_ID_OUTPUT_KEY;
use crate::version::{VersionGenerator, VersionInput};

/// Service name of documentation store operations.
pub const DOCUMENTATION_SERVICE: &str = "APIGateway";

/// Service name of stack introspection.
pub const STACK_SERVICE: &str = "CloudFormation";

/// Page size used to list every remote part in one call.
const PART_LIST_LIMIT: u64 = 9999;

/// Request/response facade over the remote documentation store.
pub trait StoreClient {
    fn request(
        &self,
        service: &str,
        operation: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, RemoteError>>;
}

/// Read the REST API id from the outputs of `stack_name`.
///
/// Returns `None` when the stack has no `AwsDocApiId` output.
pub async fn fetch_rest_api_id<C: StoreClient + ?Sized>(
    client: &C,
    stack_name: &str,
) -> Result<Option<String>, RemoteError> {
    let result = client
        .request(
            STACK_SERVICE,
            "describeStacks",
            json!({ "StackName": stack_name }),
        )
        .await?;
    let rest_api_id = result
        .get("Stacks")
        .and_then(|stacks| stacks.get(0))
        .and_then(|stack| stack.get("Outputs"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|output| output.get("OutputKey").and_then(Value::as_str) == Some(API_ID_OUTPUT_KEY))
        .and_then(|output| output.get("OutputValue"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(rest_api_id)
}

/// Current step of a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    FetchingStack,
    Skip,
    Inspected,
    CheckingVersion,
    DeletingOld,
    UploadingNew,
    StampingVersion,
    Done,
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::FetchingStack => "FETCHING_STACK",
            Self::Skip => "SKIP",
            Self::Inspected => "INSPECTED",
            Self::CheckingVersion => "CHECKING_VERSION",
            Self::DeletingOld => "DELETING_OLD",
            Self::UploadingNew => "UPLOADING_NEW",
            Self::StampingVersion => "STAMPING_VERSION",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// How a sync ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// No documentation is configured; nothing was called.
    Skipped,
    /// No-deploy run: parts were computed but nothing was published.
    Inspected { parts: Vec<DocumentationPart> },
    /// The version already exists remotely.
    Unchanged { version: String },
    /// Old parts were replaced and the version stamped.
    Published {
        version: String,
        deleted: usize,
        created: usize,
    },
}

/// Inputs of one sync.
#[derive(Debug, Clone, Copy)]
pub struct SyncRequest<'a> {
    pub stack_name: &'a str,
    pub stage: &'a str,
    pub no_deploy: bool,
    /// The global documentation tree, if configured.
    pub global_docs: Option<&'a Value>,
    /// Endpoint documentation keyed for versioning.
    pub function_docs: &'a BTreeMap<String, Value>,
}

impl SyncRequest<'_> {
    fn has_documentation(&self) -> bool {
        self.global_docs.is_some() || !self.function_docs.is_empty()
    }
}

/// Drives the post-provision documentation upload.
///
/// The computed auto-version is remembered for the lifetime of the engine.
pub struct SyncEngine<'c, C: ?Sized> {
    client: &'c C,
    versions: VersionGenerator,
    state: SyncState,
}

impl<'c, C: StoreClient + ?Sized> SyncEngine<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Self {
            client,
            versions: VersionGenerator::new(),
            state: SyncState::Idle,
        }
    }

    /// Continue with a generator that may already hold an auto-version.
    pub fn with_versions(client: &'c C, versions: VersionGenerator) -> Self {
        Self {
            client,
            versions,
            state: SyncState::Idle,
        }
    }

    pub fn into_versions(self) -> VersionGenerator {
        self.versions
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn versions(&self) -> &VersionGenerator {
        &self.versions
    }

    fn enter(&mut self, state: SyncState) {
        tracing::debug!(from = %self.state, to = %state, "documentation sync");
        self.state = state;
    }

    fn fail(&mut self, err: impl Into<DocumentationError>) -> DocumentationError {
        self.enter(SyncState::Failed);
        err.into()
    }

    /// Run one sync. `build_parts` computes the local part list once the
    /// REST API id is known; it runs before any mutating call.
    pub async fn run<F>(
        &mut self,
        request: SyncRequest<'_>,
        build_parts: F,
    ) -> Result<SyncOutcome, DocumentationError>
    where
        F: FnOnce(Option<&str>) -> Result<Vec<DocumentationPart>, DocumentationError>,
    {
        let client = self.client;
        self.enter(SyncState::Idle);
        if !request.has_documentation() {
            self.enter(SyncState::Skip);
            stackdoc_telemetry::log_sync_skipped!("no documentation configured");
            return Ok(SyncOutcome::Skipped);
        }

        self.enter(SyncState::FetchingStack);
        let rest_api_id = match fetch_rest_api_id(client, request.stack_name).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(e)),
        };
        if rest_api_id.is_none() {
            tracing::warn!(
                stack = %request.stack_name,
                output = API_ID_OUTPUT_KEY,
                "stack has no API id output; parts will carry no restApiId"
            );
        }

        let parts = match build_parts(rest_api_id.as_deref()) {
            Ok(parts) => parts,
            Err(e) => return Err(self.fail(e)),
        };

        if request.no_deploy {
            self.enter(SyncState::Inspected);
            for part in &parts {
                tracing::info!(location = %part.location.identifier(), "documentation part");
            }
            return Ok(SyncOutcome::Inspected { parts });
        }

        let version = match self.versions.get_version(VersionInput {
            global_docs: request.global_docs.unwrap_or(&Value::Null),
            function_docs: request.function_docs,
        }) {
            Ok(version) => version,
            Err(e) => return Err(self.fail(e)),
        };

        self.enter(SyncState::CheckingVersion);
        match client
            .request(
                DOCUMENTATION_SERVICE,
                "getDocumentationVersion",
                json!({ "restApiId": rest_api_id, "documentationVersion": version }),
            )
            .await
        {
            Ok(_) => {
                self.enter(SyncState::Done);
                stackdoc_telemetry::log_version_unchanged!(
                    version = %version,
                    "documentation version already exists, skipping upload"
                );
                return Ok(SyncOutcome::Unchanged { version });
            }
            Err(e) if e.is_invalid_version() => {}
            Err(e) => return Err(self.fail(e)),
        }

        self.enter(SyncState::DeletingOld);
        let deleted = match self.delete_remote_parts(rest_api_id.as_deref()).await {
            Ok(deleted) => deleted,
            Err(e) => return Err(self.fail(e)),
        };

        self.enter(SyncState::UploadingNew);
        let created = match self.create_parts(&parts).await {
            Ok(created) => created,
            Err(e) => return Err(self.fail(e)),
        };

        self.enter(SyncState::StampingVersion);
        if let Err(e) = client
            .request(
                DOCUMENTATION_SERVICE,
                "createDocumentationVersion",
                json!({
                    "restApiId": rest_api_id,
                    "documentationVersion": version,
                    "stageName": request.stage,
                }),
            )
            .await
        {
            return Err(self.fail(e));
        }
        stackdoc_telemetry::log_version_created!(version = %version, stage = %request.stage);

        self.enter(SyncState::Done);
        Ok(SyncOutcome::Published {
            version,
            deleted,
            created,
        })
    }

    /// Delete every remote part. All deletes are attempted; the first
    /// failure is reported afterwards.
    async fn delete_remote_parts(&self, rest_api_id: Option<&str>) -> Result<usize, RemoteError> {
        let listing = self
            .client
            .request(
                DOCUMENTATION_SERVICE,
                "getDocumentationParts",
                json!({ "restApiId": rest_api_id, "limit": PART_LIST_LIMIT }),
            )
            .await?;
        let ids: Vec<&str> = listing
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("id").and_then(Value::as_str))
            .collect();

        let results = join_all(ids.iter().map(|id| {
            self.client.request(
                DOCUMENTATION_SERVICE,
                "deleteDocumentationPart",
                json!({ "documentationPartId": id, "restApiId": rest_api_id }),
            )
        }))
        .await;
        results.into_iter().collect::<Result<Vec<_>, _>>()?;

        stackdoc_telemetry::log_parts_deleted!(count = ids.len());
        Ok(ids.len())
    }

    async fn create_parts(&self, parts: &[DocumentationPart]) -> Result<usize, DocumentationError> {
        let params = parts
            .iter()
            .map(DocumentationPart::to_create_params)
            .collect::<Result<Vec<_>, _>>()?;

        try_join_all(params.into_iter().map(|params| {
            self.client
                .request(DOCUMENTATION_SERVICE, "createDocumentationPart", params)
        }))
        .await?;

        stackdoc_telemetry::log_parts_created!(count = parts.len());
        Ok(parts.len())
    }
}
