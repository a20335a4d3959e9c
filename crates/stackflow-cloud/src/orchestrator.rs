//! Deploy-and-wait orchestration
//!
//! Drives one stack deployment through
//! `Preparing -> Submitting -> InProgress -> {Succeeded | Failed | TimedOut | Cancelled}`.
//!
//! Local problems (render errors, missing parameter values) are returned as
//! `Err` before any remote call. Everything that happens after the first
//! remote call ends in a [`DeploymentOutcome`].

use crate::cancel::CancelToken;
use crate::error::{CloudError, Result};
use crate::event::{StackEvent, StackStatus};
use crate::outcome::{DeploymentOutcome, DeploymentReport, OperationKind};
use crate::poller::StatusPoller;
use crate::provider::{
    ParameterValue, ProvisioningClient, RetryConfig, Submission, UpdateResult,
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use stackflow_core::ResourceGraph;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Failure reason reported when another operation holds the stack
pub const CONCURRENT_OPERATION: &str = "concurrent operation";

/// Polling configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
    /// Wait between event fetches
    pub poll_interval: Duration,

    /// Give up waiting after this long
    pub max_wait: Duration,

    /// Retries for transient API failures
    pub retry: RetryConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(60 * 60),
            retry: RetryConfig::default(),
        }
    }
}

/// A graph plus the parameter values to deploy it with
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub graph: ResourceGraph,
    pub parameter_values: Vec<ParameterValue>,
}

impl DeploymentRequest {
    pub fn new(graph: ResourceGraph) -> Self {
        Self {
            graph,
            parameter_values: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameter_values.push(ParameterValue::new(key, value));
        self
    }

    pub fn with_parameters(mut self, values: impl IntoIterator<Item = ParameterValue>) -> Self {
        self.parameter_values.extend(values);
        self
    }

    pub fn stack_name(&self) -> &str {
        self.graph.name()
    }

    /// Required parameters (no default) without a supplied value, in declaration order
    pub fn missing_parameters(&self) -> Vec<String> {
        let supplied: HashSet<&str> = self
            .parameter_values
            .iter()
            .map(|p| p.key.as_str())
            .collect();
        self.graph
            .required_parameters()
            .filter(|name| !supplied.contains(name))
            .map(str::to_string)
            .collect()
    }
}

/// Orchestration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployPhase {
    Preparing,
    Submitting,
    InProgress,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl DeployPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            DeployPhase::Preparing | DeployPhase::Submitting | DeployPhase::InProgress
        )
    }

    fn of(outcome: &DeploymentOutcome) -> Self {
        match outcome {
            DeploymentOutcome::Succeeded { .. } => DeployPhase::Succeeded,
            DeploymentOutcome::Failed { .. } => DeployPhase::Failed,
            DeploymentOutcome::TimedOut => DeployPhase::TimedOut,
            DeploymentOutcome::Cancelled => DeployPhase::Cancelled,
        }
    }
}

impl std::fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployPhase::Preparing => write!(f, "preparing"),
            DeployPhase::Submitting => write!(f, "submitting"),
            DeployPhase::InProgress => write!(f, "in progress"),
            DeployPhase::Succeeded => write!(f, "succeeded"),
            DeployPhase::Failed => write!(f, "failed"),
            DeployPhase::TimedOut => write!(f, "timed out"),
            DeployPhase::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Progress notification passed to the observer
#[derive(Debug)]
pub enum DeployProgress<'a> {
    Phase(DeployPhase),
    Submitted(OperationKind),
    Event(&'a StackEvent),
}

type ProgressCallback = Arc<dyn Fn(&DeployProgress<'_>) + Send + Sync>;

/// Submits stacks and waits for them to converge
pub struct DeploymentOrchestrator {
    client: Arc<dyn ProvisioningClient>,
    config: DeployConfig,
    on_progress: Option<ProgressCallback>,
}

enum Submitted {
    /// Accepted; carries the stack's events from before the submission
    Started(OperationKind, Vec<StackEvent>),
    NoChanges,
}

impl DeploymentOrchestrator {
    pub fn new(client: Arc<dyn ProvisioningClient>, config: DeployConfig) -> Self {
        Self {
            client,
            config,
            on_progress: None,
        }
    }

    /// Register an observer for phase changes and stack events
    pub fn with_progress(
        mut self,
        callback: impl Fn(&DeployProgress<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Deploy and wait until the stack reaches a terminal status
    pub async fn deploy_and_wait(&self, request: DeploymentRequest) -> Result<DeploymentReport> {
        self.deploy_with_cancel(request, &CancelToken::new()).await
    }

    /// Like [`deploy_and_wait`](Self::deploy_and_wait), stopping early when `cancel` fires
    pub async fn deploy_with_cancel(
        &self,
        request: DeploymentRequest,
        cancel: &CancelToken,
    ) -> Result<DeploymentReport> {
        let started = Instant::now();
        let stack_name = request.stack_name().to_string();

        self.enter(DeployPhase::Preparing);
        let submission = prepare(&request)?;
        let declared_outputs: HashSet<String> = request
            .graph
            .outputs()
            .map(|(name, _)| name.to_string())
            .collect();

        if cancel.is_cancelled() {
            let outcome = DeploymentOutcome::Cancelled;
            return Ok(self.finish(stack_name, None, outcome, Vec::new(), started));
        }

        self.enter(DeployPhase::Submitting);
        let (operation, baseline) = match self.submit(&submission).await {
            Ok(Submitted::Started(kind, baseline)) => (kind, baseline),
            Ok(Submitted::NoChanges) => {
                tracing::info!("Stack '{}' is already up to date", stack_name);
                self.notify(&DeployProgress::Submitted(OperationKind::NoOp));
                let outcome = self.succeeded(&stack_name, &declared_outputs).await;
                return Ok(self.finish(
                    stack_name,
                    Some(OperationKind::NoOp),
                    outcome,
                    Vec::new(),
                    started,
                ));
            }
            Err(outcome) => {
                return Ok(self.finish(stack_name, None, outcome, Vec::new(), started));
            }
        };
        self.notify(&DeployProgress::Submitted(operation));

        self.enter(DeployPhase::InProgress);
        let (outcome, events) = self
            .wait(&stack_name, &baseline, &declared_outputs, cancel)
            .await;
        Ok(self.finish(stack_name, Some(operation), outcome, events, started))
    }

    async fn submit(
        &self,
        submission: &Submission,
    ) -> std::result::Result<Submitted, DeploymentOutcome> {
        let stack_name = submission.stack_name.as_str();
        let existing = self
            .config
            .retry
            .run("describe", || self.client.describe(stack_name))
            .await
            .map_err(rejection)?;

        match existing {
            None => {
                tracing::info!("Stack '{}' does not exist, creating", stack_name);
                let handle = self.client.create(submission).await.map_err(rejection)?;
                tracing::debug!("Create accepted: {}", handle.stack_id);
                Ok(Submitted::Started(OperationKind::Create, Vec::new()))
            }
            Some(current) if current.status.is_in_progress() => {
                tracing::warn!(
                    "Stack '{}' is busy ({}), not submitting",
                    stack_name,
                    current.status
                );
                Err(DeploymentOutcome::failed(CONCURRENT_OPERATION))
            }
            Some(current) if current.status == StackStatus::RollbackComplete => {
                Err(DeploymentOutcome::failed(format!(
                    "stack is in {} state and must be deleted before it can be updated",
                    current.status
                )))
            }
            Some(current) => {
                tracing::info!(
                    "Stack '{}' exists ({}), updating",
                    stack_name,
                    current.status
                );
                // Earlier operations' events, including their terminal one
                let baseline = self
                    .config
                    .retry
                    .run("recent_events", || self.client.recent_events(stack_name))
                    .await
                    .map_err(|e| {
                        DeploymentOutcome::failed(format!("failed to read stack events: {}", e))
                    })?;
                match self.client.update(submission).await.map_err(rejection)? {
                    UpdateResult::Started(handle) => {
                        tracing::debug!("Update accepted: {}", handle.stack_id);
                        Ok(Submitted::Started(OperationKind::Update, baseline))
                    }
                    UpdateResult::NoChanges => Ok(Submitted::NoChanges),
                }
            }
        }
    }

    async fn wait(
        &self,
        stack_name: &str,
        baseline: &[StackEvent],
        declared_outputs: &HashSet<String>,
        cancel: &CancelToken,
    ) -> (DeploymentOutcome, Vec<StackEvent>) {
        let deadline = tokio::time::Instant::now() + self.config.max_wait;
        let poller = StatusPoller::new(self.client.as_ref(), stack_name, None)
            .after(baseline)
            .with_retry(self.config.retry.clone());
        let mut stream = std::pin::pin!(poller.into_stream(self.config.poll_interval));
        let mut events: Vec<StackEvent> = Vec::new();

        loop {
            if cancel.is_cancelled() {
                tracing::warn!("Stopped waiting for '{}'; the remote operation continues", stack_name);
                return (DeploymentOutcome::Cancelled, events);
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => continue,
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!(
                        "Gave up waiting for '{}' after {:?}",
                        stack_name,
                        self.config.max_wait
                    );
                    return (DeploymentOutcome::TimedOut, events);
                }
                next = stream.next() => next,
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    let reason = format!("failed to read stack events: {}", e);
                    return (DeploymentOutcome::failed(reason), events);
                }
                None => {
                    let reason = "event stream ended before the stack reached a terminal status";
                    return (DeploymentOutcome::failed(reason), events);
                }
            };

            tracing::info!("{}", event);
            self.notify(&DeployProgress::Event(&event));
            let terminal = event.is_terminal_for(stack_name);
            events.push(event);

            if terminal {
                let outcome = self.resolve(stack_name, &events, declared_outputs).await;
                return (outcome, events);
            }
        }
    }

    /// Turn the terminal stack event (the last in `events`) into an outcome
    async fn resolve(
        &self,
        stack_name: &str,
        events: &[StackEvent],
        declared_outputs: &HashSet<String>,
    ) -> DeploymentOutcome {
        let Some(terminal) = events.last() else {
            return DeploymentOutcome::failed("no terminal event observed");
        };

        if terminal.status.is_success_terminal() {
            return self.succeeded(stack_name, declared_outputs).await;
        }

        let resource_failures: Vec<&StackEvent> = events
            .iter()
            .filter(|e| !e.is_stack_event(stack_name) && e.status.is_failure())
            .collect();
        for failure in &resource_failures {
            tracing::warn!("{}", failure);
        }

        let reason = terminal
            .status_reason
            .clone()
            .or_else(|| {
                resource_failures
                    .iter()
                    .find_map(|e| e.status_reason.clone())
            })
            .unwrap_or_else(|| format!("stack reached {}", terminal.status));

        DeploymentOutcome::Failed {
            reason,
            last_event: Some(terminal.clone()),
        }
    }

    async fn succeeded(
        &self,
        stack_name: &str,
        declared_outputs: &HashSet<String>,
    ) -> DeploymentOutcome {
        let outputs = self
            .config
            .retry
            .run("get_outputs", || self.client.get_outputs(stack_name))
            .await;

        match outputs {
            Ok(outputs) => DeploymentOutcome::Succeeded {
                outputs: outputs
                    .into_iter()
                    .filter(|(key, _)| declared_outputs.contains(key))
                    .collect::<BTreeMap<_, _>>(),
            },
            Err(e) => DeploymentOutcome::failed(format!(
                "stack converged but its outputs could not be read: {}",
                e
            )),
        }
    }

    fn finish(
        &self,
        stack_name: String,
        operation: Option<OperationKind>,
        outcome: DeploymentOutcome,
        events: Vec<StackEvent>,
        started: Instant,
    ) -> DeploymentReport {
        self.enter(DeployPhase::of(&outcome));
        let report = DeploymentReport {
            stack_name,
            operation,
            outcome,
            events,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Deployment of '{}' {} in {}ms",
            report.stack_name,
            report.outcome,
            report.duration_ms
        );
        report
    }

    fn enter(&self, phase: DeployPhase) {
        tracing::debug!("Deployment phase: {}", phase);
        self.notify(&DeployProgress::Phase(phase));
    }

    fn notify(&self, progress: &DeployProgress<'_>) {
        if let Some(callback) = &self.on_progress {
            callback(progress);
        }
    }
}

/// Render the graph and check parameter values; no remote calls
fn prepare(request: &DeploymentRequest) -> Result<Submission> {
    let graph = &request.graph;
    let document = stackflow_core::render(graph)?;

    let missing = request.missing_parameters();
    if !missing.is_empty() {
        return Err(CloudError::MissingParameters(missing));
    }

    for value in &request.parameter_values {
        if !graph.parameters().any(|(name, _)| name == value.key) {
            tracing::warn!(
                "Parameter '{}' is not declared by '{}'",
                value.key,
                graph.name()
            );
        }
    }

    Ok(Submission {
        stack_name: graph.name().to_string(),
        template_body: document.to_json()?,
        parameters: request.parameter_values.clone(),
    })
}

/// Map a synchronous rejection to a failed outcome
fn rejection(err: CloudError) -> DeploymentOutcome {
    match err {
        CloudError::Conflict(_) => DeploymentOutcome::failed(CONCURRENT_OPERATION),
        other => DeploymentOutcome::failed(other.to_string()),
    }
}
