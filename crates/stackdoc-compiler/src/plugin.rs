//! The deployment hooks: splice before provisioning, publish after.
//!
//! [`DocumentationPlugin`] composes the walker, model compiler, splicer and
//! sync engine over a [`FunctionRegistry`] and a [`NamingService`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::documentation::EndpointDocumentation;
use crate::download::{self, DownloadOptions};
use crate::error::DocumentationError;
use crate::location::{DocumentationPart, Location, LocationField, LocationType};
use crate::model::{model_descriptors, model_logical_id, ModelCompiler, ModelDescriptor};
use crate::part_schema::{FUNCTION_DOCUMENTATION_PARTS, GLOBAL_DOCUMENTATION_PARTS};
use crate::service::{FunctionRegistry, HttpEvent, NamingService, ServerlessNaming, ServiceDefinition};
use crate::splicer::TemplateSplicer;
use crate::swagger::{import_swagger, EndpointKey};
use crate::sync::{StoreClient, SyncEngine, SyncOutcome, SyncRequest};
use crate::template::Template;
use crate::version::{function_docs_key, VersionGenerator, VersionInput};
use crate::walker::PartWalker;

/// Stage used when neither the options nor the service name one.
pub const DEFAULT_STAGE: &str = "dev";

/// Command-line options of the hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginOptions {
    pub stage: Option<String>,
    /// `--noDeploy`: compute parts but publish nothing.
    pub no_deploy: bool,
    /// `--doc-safe-mode`: never touch request parameters of method resources.
    pub doc_safe_mode: bool,
}

pub struct DocumentationPlugin<R, N> {
    registry: R,
    naming: N,
    global_docs: Option<Value>,
    options: PluginOptions,
    swagger_imported: bool,
    versions: VersionGenerator,
}

impl DocumentationPlugin<ServiceDefinition, ServerlessNaming> {
    /// Plugin over a parsed service definition with the default naming.
    ///
    /// The service's `provider.stage` applies when `options` names none.
    pub fn from_service(service: ServiceDefinition, mut options: PluginOptions) -> Self {
        if options.stage.is_none() {
            options.stage = service.provider.stage.clone();
        }
        let naming = ServerlessNaming::new(service.service.clone());
        let global_docs = service.custom.documentation.clone();
        Self::new(service, naming, global_docs, options)
    }
}

impl<R: FunctionRegistry, N: NamingService> DocumentationPlugin<R, N> {
    pub fn new(registry: R, naming: N, global_docs: Option<Value>, options: PluginOptions) -> Self {
        Self {
            registry,
            naming,
            global_docs,
            options,
            swagger_imported: false,
            versions: VersionGenerator::new(),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn global_docs(&self) -> Option<&Value> {
        self.global_docs.as_ref()
    }

    pub fn stage(&self) -> &str {
        self.options.stage.as_deref().unwrap_or(DEFAULT_STAGE)
    }

    pub fn stack_name(&self) -> String {
        self.naming.get_stack_name(self.stage())
    }

    /// Splice models and endpoint documentation into `template`.
    pub fn before_provision(&mut self, template: &mut Template) -> Result<(), DocumentationError> {
        self.import_swagger()?;

        let models = self.models()?;
        let compiler = ModelCompiler::new(Template::rest_api_ref());
        for descriptor in &models {
            let resource = compiler.compile(descriptor);
            template.resources.insert(
                model_logical_id(&descriptor.name),
                serde_json::to_value(resource)?,
            );
        }

        let splicer = TemplateSplicer::new(&self.naming, self.options.doc_safe_mode);
        let mut endpoints = 0;
        for (event, raw) in self.documented_events() {
            let doc = EndpointDocumentation::from_value(raw, &event.describe())?;
            splicer.splice_endpoint(&mut template.resources, event, &doc)?;
            endpoints += 1;
        }

        template.add_api_id_output();
        stackdoc_telemetry::log_template_spliced!(models = models.len(), endpoints = endpoints);
        Ok(())
    }

    /// Publish documentation parts for the provisioned stack.
    pub async fn after_provision<C: StoreClient + ?Sized>(
        &mut self,
        client: &C,
    ) -> Result<SyncOutcome, DocumentationError> {
        self.import_swagger()?;

        let stage = self.stage().to_string();
        let stack_name = self.stack_name();
        let function_docs = self.function_docs();

        let mut engine = SyncEngine::with_versions(client, std::mem::take(&mut self.versions));
        let request = SyncRequest {
            stack_name: &stack_name,
            stage: &stage,
            no_deploy: self.options.no_deploy,
            global_docs: self.global_docs.as_ref(),
            function_docs: &function_docs,
        };
        let result = engine.run(request, |rest_api_id| self.walk_parts(rest_api_id)).await;
        self.versions = engine.into_versions();
        result
    }

    /// Every documentation part, global parts first, without calling the store.
    pub fn compute_documentation_parts(
        &mut self,
        rest_api_id: Option<&str>,
    ) -> Result<Vec<DocumentationPart>, DocumentationError> {
        self.import_swagger()?;
        self.walk_parts(rest_api_id)
    }

    /// The explicit version, or the content hash of the documentation set.
    pub fn version(&mut self) -> Result<String, DocumentationError> {
        self.import_swagger()?;
        let function_docs = self.function_docs();
        let null = Value::Null;
        let version = self.versions.get_version(VersionInput {
            global_docs: self.global_docs.as_ref().unwrap_or(&null),
            function_docs: &function_docs,
        })?;
        Ok(version)
    }

    /// Export the stack's published documentation to a file.
    pub async fn download_documentation<C: StoreClient + ?Sized>(
        &self,
        client: &C,
        options: &DownloadOptions,
    ) -> Result<(), DocumentationError> {
        download::download_documentation(client, &self.stack_name(), self.stage(), options).await
    }

    /// Configured models followed by Swagger-derived ones.
    pub fn models(&self) -> Result<Vec<ModelDescriptor>, DocumentationError> {
        model_descriptors(self.global_docs.as_ref().and_then(|d| d.get("models")))
    }

    fn walk_parts(
        &self,
        rest_api_id: Option<&str>,
    ) -> Result<Vec<DocumentationPart>, DocumentationError> {
        let mut walker = PartWalker::new(rest_api_id.map(str::to_string));
        if let Some(global) = &self.global_docs {
            walker.walk_tree(GLOBAL_DOCUMENTATION_PARTS, global, &Location::root())?;
        }
        for (event, _) in self.documented_events() {
            let known = Location::new(LocationType::Method)
                .with(LocationField::Path, event.path.clone())
                .with(LocationField::Method, event.method.to_uppercase());
            walker.walk_tree(FUNCTION_DOCUMENTATION_PARTS, &serde_json::to_value(event)?, &known)?;
        }
        Ok(walker.into_parts())
    }

    /// HTTP events carrying a documentation object, in function order.
    fn documented_events(&self) -> Vec<(&HttpEvent, &Value)> {
        self.documented_functions()
            .into_iter()
            .map(|(_, event, doc)| (event, doc))
            .collect()
    }

    fn documented_functions(&self) -> Vec<(String, &HttpEvent, &Value)> {
        let mut documented = Vec::new();
        for name in self.registry.get_all_functions() {
            let Some(function) = self.registry.get_function(&name) else {
                continue;
            };
            for event in &function.events {
                if let Some(http) = &event.http {
                    if let Some(doc) = &http.documentation {
                        documented.push((name.clone(), http, doc));
                    }
                }
            }
        }
        documented
    }

    fn function_docs(&self) -> BTreeMap<String, Value> {
        self.documented_functions()
            .into_iter()
            .map(|(name, event, doc)| {
                (
                    function_docs_key(&name, &event.method, &event.path),
                    doc.clone(),
                )
            })
            .collect()
    }

    /// Merge `custom.documentation.swagger` into the models and the
    /// undocumented endpoints. Runs once per plugin.
    fn import_swagger(&mut self) -> Result<(), DocumentationError> {
        if self.swagger_imported {
            return Ok(());
        }
        self.swagger_imported = true;

        let Some(swagger) = self.global_docs.as_ref().and_then(|d| d.get("swagger")).cloned() else {
            return Ok(());
        };
        let import = import_swagger(&swagger);

        if let Some(docs) = self.global_docs.as_mut().and_then(Value::as_object_mut) {
            let models = docs
                .entry("models")
                .or_insert_with(|| Value::Array(Vec::new()));
            if models.is_null() {
                *models = Value::Array(Vec::new());
            }
            let models = models
                .as_array_mut()
                .ok_or(DocumentationError::InvalidDefinition {
                    location_type: LocationType::Model,
                })?;
            for model in &import.models {
                models.push(serde_json::to_value(model)?);
            }
        }

        let mut documented = 0;
        for name in self.registry.get_all_functions() {
            let Some(function) = self.registry.get_function_mut(&name) else {
                continue;
            };
            for http in function.events.iter_mut().filter_map(|e| e.http.as_mut()) {
                if http.documentation.is_some() {
                    continue;
                }
                if let Some(doc) = import.endpoint_docs.get(&EndpointKey::new(&http.path, &http.method)) {
                    http.documentation = Some(serde_json::to_value(doc)?);
                    documented += 1;
                }
            }
        }

        tracing::info!(
            models = import.models.len(),
            endpoints = documented,
            "imported swagger documentation"
        );
        Ok(())
    }
}
