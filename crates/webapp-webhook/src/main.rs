//! webapp-webhook - offline tooling for the Deployment validating webhook

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use kube::CustomResourceExt;
use tracing::info;

use webapp_common::crd::Deployment;
use webapp_common::manifest::read_deployment;
use webapp_common::telemetry::{init_logging, LogConfig, LogFormat};
use webapp_webhook::registration::{
    WebhookRegistration, DEFAULT_CONFIGURATION_NAME, DEFAULT_NAMESPACE, DEFAULT_SERVICE_NAME,
    DEFAULT_SERVICE_PORT,
};
use webapp_webhook::{
    AdmissionDecision, CustomValidator, DeploymentValidator, RejectedValue, ValidationConfig,
};

/// Tooling for the webapp Deployment validating admission webhook
#[derive(Parser, Debug)]
#[command(name = "webapp-webhook", version, about, long_about = None)]
struct Cli {
    /// Log output format (json or pretty)
    #[arg(
        long,
        env = "WEBAPP_LOG_FORMAT",
        default_value_t = LogFormat::default(),
        global = true
    )]
    log_format: LogFormat,

    /// Log filter directives (RUST_LOG takes precedence)
    #[arg(long, env = "WEBAPP_LOG_FILTER", global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the Deployment CRD manifest
    Crd,

    /// Print the ValidatingWebhookConfiguration that registers the validator
    WebhookConfig(WebhookConfigArgs),

    /// Run the admission decision for a manifest without a cluster
    ///
    /// Exits non-zero when the request would be denied.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct WebhookConfigArgs {
    /// Name of the ValidatingWebhookConfiguration
    #[arg(long, default_value = DEFAULT_CONFIGURATION_NAME)]
    name: String,

    /// Service fronting the webhook server
    #[arg(long, env = "WEBAPP_WEBHOOK_SERVICE", default_value = DEFAULT_SERVICE_NAME)]
    service_name: String,

    /// Namespace of the webhook Service
    #[arg(long, env = "WEBAPP_WEBHOOK_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Port of the webhook Service
    #[arg(long, default_value_t = DEFAULT_SERVICE_PORT)]
    port: i32,

    /// PEM file with the CA that signed the serving certificate
    #[arg(long, env = "WEBAPP_WEBHOOK_CA_BUNDLE")]
    ca_bundle_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Deployment manifest to check (the proposed state)
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Previous state, required for --operation update
    #[arg(long)]
    old: Option<PathBuf>,

    /// Lifecycle hook to run
    #[arg(long, value_enum, default_value_t = OperationArg::Create)]
    operation: OperationArg,

    /// Report spec.range.interval instead of the replica count on replica violations
    #[arg(long)]
    interval_as_rejected_value: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OperationArg {
    Create,
    Update,
    Delete,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig {
        format: cli.log_format,
        filter: cli.log_filter.clone(),
    })?;

    match cli.command {
        Commands::Crd => print_crd(),
        Commands::WebhookConfig(args) => print_webhook_config(args),
        Commands::Validate(args) => run_validate(args),
    }
}

fn print_crd() -> anyhow::Result<()> {
    let crd = serde_yaml::to_string(&Deployment::crd())
        .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
    println!("{crd}");
    Ok(())
}

fn print_webhook_config(args: WebhookConfigArgs) -> anyhow::Result<()> {
    let ca_bundle = args
        .ca_bundle_file
        .as_ref()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("reading CA bundle {}", path.display()))
        })
        .transpose()?;

    let registration = WebhookRegistration {
        configuration_name: args.name,
        service_name: args.service_name,
        namespace: args.namespace,
        port: args.port,
        ca_bundle,
    };

    let manifest = serde_yaml::to_string(&registration.validating_webhook_configuration())
        .map_err(|e| anyhow::anyhow!("Failed to serialize webhook configuration: {}", e))?;
    println!("{manifest}");
    Ok(())
}

fn run_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let rejected_value = if args.interval_as_rejected_value {
        RejectedValue::Interval
    } else {
        RejectedValue::Replicas
    };
    let validator = DeploymentValidator::new(
        ValidationConfig::default().with_replica_rejected_value(rejected_value),
        tracing::info_span!(webapp_webhook::validation::LOG_SPAN_NAME),
    );

    let deployment = read_deployment(&args.file)?;
    let decision = match args.operation {
        OperationArg::Create => validator.validate_create(&deployment),
        OperationArg::Update => {
            let old_path = args
                .old
                .as_ref()
                .context("--old is required for --operation update")?;
            let old = read_deployment(old_path)?;
            validator.validate_update(&deployment, &old)
        }
        OperationArg::Delete => validator.validate_delete(&deployment),
    };

    match decision {
        AdmissionDecision::Allowed { warnings } => {
            for warning in &warnings {
                println!("warning: {warning}");
            }
            info!(file = %args.file.display(), "admission allowed");
            println!("allowed");
            Ok(())
        }
        AdmissionDecision::Denied(err) => {
            let status = serde_yaml::to_string(&err.to_status())
                .map_err(|e| anyhow::anyhow!("Failed to serialize status: {}", e))?;
            println!("{status}");
            anyhow::bail!("admission denied: {}", err)
        }
    }
}
