use crate::utils;
use colored::Colorize;
use stackflow_cloud::{
    CancelToken, DeployProgress, DeploymentOrchestrator, DeploymentOutcome, DeploymentRequest,
    OperationKind,
};
use stackflow_cloud_aws::CloudFormationClient;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct DeployOptions {
    pub stack_name: Option<String>,
    pub params: Vec<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub poll_interval: Option<u64>,
    pub max_wait: Option<u64>,
    pub yes: bool,
}

pub async fn handle(stack: &str, options: DeployOptions) -> anyhow::Result<()> {
    let settings = stackflow_config::load_settings()?;
    let graph = utils::find_stack(stack)?.into_graph(options.stack_name.as_deref())?;
    let stack_name = graph.name().to_string();

    // Settings file defaults first, command-line values override them
    let mut values: BTreeMap<String, String> = settings
        .parameters_for(stack)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    for raw in &options.params {
        let (key, value) = utils::parse_param(raw)?;
        values.insert(key, value);
    }

    let request = DeploymentRequest::new(graph).with_parameters(
        values
            .iter()
            .map(|(k, v)| stackflow_cloud::ParameterValue::new(k, v)),
    );

    // Local checks run before anything talks to AWS
    stackflow_core::render(&request.graph)?;
    let missing = request.missing_parameters();
    if !missing.is_empty() {
        return Err(anyhow::anyhow!(
            "Missing values for required parameters: {}\nPass them with -p KEY=VALUE",
            missing.join(", ")
        ));
    }

    println!("{}", "Deployment plan".blue().bold());
    println!("  Stack: {}", stack_name.cyan());
    println!("  Resources: {}", request.graph.resource_count());
    for (key, value) in &values {
        println!(
            "  Parameter {} = {}",
            key.cyan(),
            utils::shown_value(&request.graph, key, value)
        );
    }

    if !options.yes {
        println!();
        println!("{}", "This creates or updates the stack in your AWS account.".yellow());
        println!("Pass --yes to deploy");
        return Ok(());
    }

    let region = options.region.or(settings.region.clone());
    let profile = options.profile.or(settings.profile.clone());
    let config = utils::deploy_config(&settings, options.poll_interval, options.max_wait);

    let client = CloudFormationClient::from_env(region.as_deref(), profile.as_deref()).await;
    let orchestrator = DeploymentOrchestrator::new(Arc::new(client), config).with_progress(
        |progress| match progress {
            DeployProgress::Submitted(OperationKind::NoOp) => {
                println!("{}", "No changes to deploy".green());
            }
            DeployProgress::Submitted(kind) => {
                println!();
                println!("{} {}", "Started".blue().bold(), kind);
            }
            DeployProgress::Event(event) => utils::print_event(event),
            DeployProgress::Phase(_) => {}
        },
    );

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let report = orchestrator.deploy_with_cancel(request, &cancel).await?;

    println!();
    match &report.outcome {
        DeploymentOutcome::Succeeded { outputs } => {
            println!(
                "{} {} in {:.1}s",
                "✓".green().bold(),
                format!("Stack '{}' is up to date", report.stack_name).green(),
                report.duration_ms as f64 / 1000.0
            );
            if !outputs.is_empty() {
                println!("Outputs:");
                for (key, value) in outputs {
                    println!("  {} = {}", key.cyan(), value);
                }
            }
            Ok(())
        }
        DeploymentOutcome::Failed { reason, last_event } => {
            println!("{} {}", "✗ Deployment failed:".red().bold(), reason);
            if let Some(event) = last_event {
                utils::print_event(event);
            }
            Err(anyhow::anyhow!("deployment of '{}' failed", report.stack_name))
        }
        DeploymentOutcome::TimedOut => {
            println!(
                "{}",
                "⚠ Stopped waiting; the stack is still converging".yellow()
            );
            Err(anyhow::anyhow!("timed out waiting for '{}'", report.stack_name))
        }
        DeploymentOutcome::Cancelled => {
            println!(
                "{}",
                "⚠ Cancelled; the operation continues in CloudFormation".yellow()
            );
            Err(anyhow::anyhow!("cancelled"))
        }
    }
}
