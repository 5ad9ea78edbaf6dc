//! stackdoc command-line interface.
//!
//! Splices documentation into compiled templates and inspects the
//! documentation parts and version a service would publish.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use stackdoc_compiler::{
    import_swagger, DocumentationPlugin, LocationType, PluginOptions, ServerlessNaming,
    ServiceDefinition, Template,
};
use stackdoc_telemetry::{LogFormat, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(name = "stackdoc", about = "API documentation compiler for API Gateway stacks", version)]
struct Cli {
    /// Log level (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Splice models and endpoint documentation into a compiled template.
    Splice {
        /// Service definition (YAML or JSON).
        #[arg(short, long)]
        service: PathBuf,

        /// Compiled template (JSON).
        #[arg(short, long)]
        template: PathBuf,

        /// Output path; the template is printed when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave request parameters of method resources untouched.
        #[arg(long)]
        doc_safe_mode: bool,
    },

    /// Print the documentation parts a service would publish.
    Parts {
        /// Service definition (YAML or JSON).
        #[arg(short, long)]
        service: PathBuf,

        /// REST API id stamped on every part.
        #[arg(long)]
        rest_api_id: Option<String>,

        /// Only print parts of this location type (e.g. METHOD).
        #[arg(long = "type")]
        location_type: Option<String>,
    },

    /// Print the documentation version of a service.
    Version {
        /// Service definition (YAML or JSON).
        #[arg(short, long)]
        service: PathBuf,
    },

    /// Print the models and endpoint documentation derived from a Swagger document.
    ImportSwagger {
        /// Swagger 2.0 document (YAML or JSON).
        #[arg(short, long)]
        swagger: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_format) = LogFormat::parse(&cli.log_format) else {
        eprintln!("error: unknown log format '{}'", cli.log_format);
        return ExitCode::from(1);
    };
    let telemetry = TelemetryConfig::new()
        .with_log_level(cli.log_level.as_str())
        .with_log_format(log_format);
    if let Err(e) = stackdoc_telemetry::init(&telemetry) {
        eprintln!("error: {}", e);
        return ExitCode::from(1);
    }

    let result = match cli.command {
        Commands::Splice {
            service,
            template,
            output,
            doc_safe_mode,
        } => run_splice(&service, &template, output.as_deref(), doc_safe_mode),
        Commands::Parts {
            service,
            rest_api_id,
            location_type,
        } => run_parts(&service, rest_api_id.as_deref(), location_type.as_deref()),
        Commands::Version { service } => run_version(&service),
        Commands::ImportSwagger { swagger } => run_import_swagger(&swagger),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

type ServicePlugin = DocumentationPlugin<ServiceDefinition, ServerlessNaming>;

fn load_plugin(service: &Path, options: PluginOptions) -> anyhow::Result<ServicePlugin> {
    let definition = ServiceDefinition::from_file(service)
        .with_context(|| format!("failed to load service {}", service.display()))?;
    Ok(DocumentationPlugin::from_service(definition, options))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the splice command.
fn run_splice(
    service: &Path,
    template_path: &Path,
    output: Option<&Path>,
    doc_safe_mode: bool,
) -> anyhow::Result<()> {
    let mut plugin = load_plugin(
        service,
        PluginOptions {
            doc_safe_mode,
            ..Default::default()
        },
    )?;

    let content = std::fs::read_to_string(template_path)
        .with_context(|| format!("failed to read template {}", template_path.display()))?;
    let mut template: Template = serde_json::from_str(&content)
        .with_context(|| format!("invalid template {}", template_path.display()))?;

    plugin.before_provision(&mut template)?;

    match output {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&template)?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("spliced documentation into {}", path.display());
            Ok(())
        }
        None => print_json(&template),
    }
}

/// Run the parts command.
fn run_parts(
    service: &Path,
    rest_api_id: Option<&str>,
    location_type: Option<&str>,
) -> anyhow::Result<()> {
    let filter: Option<LocationType> = location_type.map(str::parse).transpose()?;
    let mut plugin = load_plugin(service, PluginOptions::default())?;
    let parts: Vec<_> = plugin
        .compute_documentation_parts(rest_api_id)?
        .into_iter()
        .filter(|part| filter.map_or(true, |t| part.location.location_type == t))
        .collect();
    print_json(&parts)
}

/// Run the version command.
fn run_version(service: &Path) -> anyhow::Result<()> {
    let mut plugin = load_plugin(service, PluginOptions::default())?;
    println!("{}", plugin.version()?);
    Ok(())
}

/// Run the import-swagger command.
fn run_import_swagger(swagger_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(swagger_path)
        .with_context(|| format!("failed to read swagger {}", swagger_path.display()))?;
    let swagger: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("invalid swagger {}", swagger_path.display()))?;

    let import = import_swagger(&swagger);
    let endpoints: Vec<Value> = import
        .endpoint_docs
        .iter()
        .map(|(key, doc)| {
            json!({
                "path": key.path,
                "method": key.method,
                "documentation": doc,
            })
        })
        .collect();
    print_json(&json!({
        "models": import.models,
        "endpoints": endpoints,
    }))
}
