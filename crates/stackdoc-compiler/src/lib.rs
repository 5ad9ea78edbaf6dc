//! Compiles API documentation into infrastructure templates and documentation parts.
//!
//! Before provisioning, models and per-endpoint documentation are spliced
//! into the compiled template. After provisioning, the documentation set is
//! walked into parts and published to the documentation store under a
//! content-hash version, skipping the upload when that version exists.

pub mod documentation;
pub mod download;
pub mod error;
pub mod location;
pub mod model;
pub mod part_schema;
pub mod plugin;
pub mod service;
pub mod splicer;
pub mod swagger;
pub mod sync;
pub mod template;
pub mod version;
pub mod walker;

#[cfg(test)]
mod testing;

pub use documentation::{EndpointDocumentation, MethodResponseDoc, ParameterDoc};
pub use download::{download_documentation, DownloadOptions};
pub use error::{DocumentationError, RemoteError};
pub use location::{DocumentationPart, Location, LocationField, LocationType};
pub use model::{ModelCompiler, ModelDescriptor, ModelResource};
pub use plugin::{DocumentationPlugin, PluginOptions, DEFAULT_STAGE};
pub use service::{
    FunctionRegistry, HttpEvent, NamingService, ServerlessNaming, ServiceDefinition,
};
pub use splicer::TemplateSplicer;
pub use swagger::{import_swagger, EndpointKey, SwaggerImport};
pub use sync::{StoreClient, SyncEngine, SyncOutcome, SyncRequest, SyncState};
pub use template::{Template, API_ID_OUTPUT_KEY, REST_API_LOGICAL_ID};
pub use version::{compute_version, VersionGenerator, VersionInput};
pub use walker::PartWalker;
