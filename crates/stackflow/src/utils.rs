use crate::catalog::{self, StackSpec};
use colored::Colorize;
use stackflow_cloud::{DeployConfig, RetryConfig, StackEvent};
use stackflow_config::Settings;
use stackflow_core::ResourceGraph;
use std::time::Duration;

/// Log to stderr; `RUST_LOG` wins over `-v`
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Look up a built-in stack
pub fn find_stack(key: &str) -> anyhow::Result<StackSpec> {
    catalog::find(key).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown stack '{}'\nAvailable stacks: {}",
            key,
            catalog::keys().join(", ")
        )
    })
}

/// Split `KEY=VALUE`
pub fn parse_param(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(anyhow::anyhow!(
            "Invalid parameter '{}': expected KEY=VALUE",
            raw
        )),
    }
}

/// Parameter value as printed; `NoEcho` parameters are masked
pub fn shown_value<'a>(graph: &ResourceGraph, key: &str, value: &'a str) -> &'a str {
    let masked = graph
        .parameters()
        .any(|(name, parameter)| name == key && parameter.no_echo);
    if masked { "****" } else { value }
}

/// Settings file values, then command-line flags
pub fn deploy_config(
    settings: &Settings,
    poll_interval: Option<u64>,
    max_wait: Option<u64>,
) -> DeployConfig {
    let defaults = DeployConfig::default();
    let retry_defaults = RetryConfig::default();
    let retry = &settings.retry;

    DeployConfig {
        poll_interval: poll_interval
            .or(settings.poll_interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval),
        max_wait: max_wait
            .or(settings.max_wait_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_wait),
        retry: RetryConfig {
            max_attempts: retry.max_attempts.unwrap_or(retry_defaults.max_attempts),
            initial_delay: retry
                .initial_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.initial_delay),
            max_delay: retry
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.max_delay),
            backoff_multiplier: retry
                .backoff_multiplier
                .unwrap_or(retry_defaults.backoff_multiplier),
        },
    }
}

/// One colored line per stack event
pub fn print_event(event: &StackEvent) {
    let status = event.status.as_str();
    let status = if event.status.is_failure() {
        status.red()
    } else if event.status.is_success_terminal() {
        status.green()
    } else {
        status.yellow()
    };

    print!(
        "  {} {:<45} {:<40} {}",
        event.timestamp.format("%H:%M:%S").to_string().dimmed(),
        status,
        event.resource_type,
        event.logical_name.cyan()
    );
    if let Some(reason) = &event.status_reason {
        print!(" {}", format!("({})", reason).dimmed());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_config::RetrySettings;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("VpcCidr=10.0.0.0/16").unwrap(),
            ("VpcCidr".to_string(), "10.0.0.0/16".to_string())
        );
        assert_eq!(
            parse_param("Token=a=b").unwrap(),
            ("Token".to_string(), "a=b".to_string())
        );
        assert!(parse_param("VpcCidr").is_err());
        assert!(parse_param("=value").is_err());
    }

    #[test]
    fn test_shown_value_masks_no_echo() {
        use stackflow_core::{Parameter, Resource, kinds};

        let mut graph = ResourceGraph::new("db-stack");
        graph
            .add_parameter("DbPassword", Parameter::string().with_no_echo(true))
            .unwrap();
        graph.add_parameter("VpcCidr", Parameter::string()).unwrap();
        graph.add("VPC", Resource::new(kinds::EC2_VPC)).unwrap();

        assert_eq!(shown_value(&graph, "DbPassword", "hunter2"), "****");
        assert_eq!(shown_value(&graph, "VpcCidr", "10.0.0.0/16"), "10.0.0.0/16");
        assert_eq!(shown_value(&graph, "Undeclared", "x"), "x");
    }

    #[test]
    fn test_deploy_config_defaults() {
        assert_eq!(deploy_config(&Settings::default(), None, None), DeployConfig::default());
    }

    #[test]
    fn test_deploy_config_precedence() {
        let settings = Settings {
            poll_interval_secs: Some(5),
            max_wait_secs: Some(600),
            retry: RetrySettings {
                max_attempts: Some(7),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = deploy_config(&settings, Some(2), None);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_wait, Duration::from_secs(600));
        assert_eq!(config.retry.max_attempts, 7);
        assert_eq!(config.retry.initial_delay, RetryConfig::default().initial_delay);
    }

    #[test]
    fn test_find_stack_unknown() {
        let err = find_stack("nope").err().unwrap();
        assert!(err.to_string().contains("sample, vpc"));
    }
}
