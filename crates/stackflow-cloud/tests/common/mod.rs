#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use stackflow_cloud::{
    CancelToken, CloudError, OperationHandle, ProvisioningClient, Result, RetryConfig,
    STACK_RESOURCE_TYPE, StackDescription, StackEvent, StackStatus, Submission, UpdateResult,
};
use stackflow_core::{Parameter, Resource, ResourceGraph, get_att, kinds, reference};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub const STACK: &str = "sample-stack";

/// Sample graph: one VPC with a CIDR parameter and two outputs
pub fn sample_graph() -> ResourceGraph {
    let mut graph = ResourceGraph::new(STACK).with_description("Sample CloudFormation Stack");
    graph.add_parameter("VpcCidr", Parameter::string()).unwrap();
    graph
        .add(
            "VPC",
            Resource::new(kinds::EC2_VPC).with("CidrBlock", reference("VpcCidr")),
        )
        .unwrap();
    graph.add_output("VpcId", reference("VPC")).unwrap();
    graph
        .add_output("VpcCidrBlock", get_att("VPC", "CidrBlock"))
        .unwrap();
    graph
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        backoff_multiplier: 2.0,
    }
}

/// One scripted `list_events` response
pub enum Step {
    /// Append these events (logical name, status, reason) to the history
    Events(Vec<(&'static str, StackStatus, Option<&'static str>)>),
    Fail(CloudError),
}

/// Shorthand for a stack-level event
pub fn stack(status: StackStatus) -> (&'static str, StackStatus, Option<&'static str>) {
    (STACK, status, None)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub describe: u32,
    pub create: u32,
    pub update: u32,
    pub list_events: u32,
    pub recent_events: u32,
    pub get_outputs: u32,
}

impl Calls {
    pub fn submissions(&self) -> u32 {
        self.create + self.update
    }
}

struct StoredStack {
    status: StackStatus,
    template_body: String,
    parameters: Vec<(String, String)>,
}

#[derive(Default)]
struct State {
    stacks: HashMap<String, StoredStack>,
    history: Vec<StackEvent>,
    steps: VecDeque<Step>,
    outputs: BTreeMap<String, String>,
    reject_create: Option<CloudError>,
    reject_update: Option<CloudError>,
    cancel_on_poll: Option<(u32, CancelToken)>,
    calls: Calls,
    next_event: u32,
    /// Service clock minus local clock, in seconds
    clock_offset: i64,
}

impl State {
    fn record(&mut self, stack_name: &str, batch: Vec<(&str, StackStatus, Option<&str>)>) {
        for (logical_name, status, reason) in batch {
            self.next_event += 1;
            let is_stack = logical_name == stack_name;
            let event = StackEvent {
                event_id: format!("event-{}", self.next_event),
                timestamp: Utc::now() + chrono::Duration::seconds(self.clock_offset),
                logical_name: logical_name.to_string(),
                resource_type: if is_stack {
                    STACK_RESOURCE_TYPE.to_string()
                } else {
                    "AWS::EC2::VPC".to_string()
                },
                status: status.clone(),
                status_reason: reason.map(str::to_string),
                physical_id: None,
            };
            if is_stack {
                if let Some(stored) = self.stacks.get_mut(stack_name) {
                    stored.status = status;
                }
            }
            self.history.push(event);
        }
    }
}

/// In-memory provisioning service driven by a script of event batches
#[derive(Default)]
pub struct ScriptedClient {
    state: Mutex<State>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack(self, status: StackStatus) -> Self {
        self.state.lock().unwrap().stacks.insert(
            STACK.to_string(),
            StoredStack {
                status,
                template_body: String::new(),
                parameters: Vec::new(),
            },
        );
        self
    }

    /// Stamp events with a service clock running `secs` ahead of the local one
    pub fn with_clock_offset(self, secs: i64) -> Self {
        self.state.lock().unwrap().clock_offset = secs;
        self
    }

    /// Events already in the history before any deployment
    pub fn with_history(self, batch: Vec<(&'static str, StackStatus, Option<&'static str>)>) -> Self {
        self.state.lock().unwrap().record(STACK, batch);
        self
    }

    pub fn with_steps(self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.state.lock().unwrap().steps.extend(steps);
        self
    }

    pub fn with_output(self, key: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .outputs
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn reject_create(self, err: CloudError) -> Self {
        self.state.lock().unwrap().reject_create = Some(err);
        self
    }

    pub fn reject_update(self, err: CloudError) -> Self {
        self.state.lock().unwrap().reject_update = Some(err);
        self
    }

    /// Fire `token` while serving the `poll`-th `list_events` call
    pub fn cancel_on_poll(self, poll: u32, token: CancelToken) -> Self {
        self.state.lock().unwrap().cancel_on_poll = Some((poll, token));
        self
    }

    /// Queue more event batches after a deployment has run
    pub fn push_steps(&self, steps: impl IntoIterator<Item = Step>) {
        self.state.lock().unwrap().steps.extend(steps);
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    pub fn status(&self) -> Option<StackStatus> {
        self.state
            .lock()
            .unwrap()
            .stacks
            .get(STACK)
            .map(|s| s.status.clone())
    }

    pub fn template_body(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .stacks
            .get(STACK)
            .map(|s| s.template_body.clone())
    }
}

fn params(submission: &Submission) -> Vec<(String, String)> {
    submission
        .parameters
        .iter()
        .map(|p| (p.key.clone(), p.value.clone()))
        .collect()
}

#[async_trait]
impl ProvisioningClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn describe(&self, stack_name: &str) -> Result<Option<StackDescription>> {
        let mut state = self.state.lock().unwrap();
        state.calls.describe += 1;
        Ok(state.stacks.get(stack_name).map(|s| StackDescription {
            stack_id: format!("arn:aws:cloudformation:stack/{}", stack_name),
            stack_name: stack_name.to_string(),
            status: s.status.clone(),
            status_reason: None,
        }))
    }

    async fn create(&self, submission: &Submission) -> Result<OperationHandle> {
        let mut state = self.state.lock().unwrap();
        state.calls.create += 1;
        if let Some(err) = state.reject_create.take() {
            return Err(err);
        }
        if state.stacks.contains_key(&submission.stack_name) {
            return Err(CloudError::Validation(format!(
                "Stack [{}] already exists",
                submission.stack_name
            )));
        }
        state.stacks.insert(
            submission.stack_name.clone(),
            StoredStack {
                status: StackStatus::CreateInProgress,
                template_body: submission.template_body.clone(),
                parameters: params(submission),
            },
        );
        Ok(OperationHandle {
            stack_id: format!("arn:aws:cloudformation:stack/{}", submission.stack_name),
        })
    }

    async fn update(&self, submission: &Submission) -> Result<UpdateResult> {
        let mut state = self.state.lock().unwrap();
        state.calls.update += 1;
        if let Some(err) = state.reject_update.take() {
            return Err(err);
        }
        let Some(stored) = state.stacks.get_mut(&submission.stack_name) else {
            return Err(CloudError::StackNotFound(submission.stack_name.clone()));
        };
        if stored.status.is_in_progress() {
            return Err(CloudError::Conflict(stored.status.to_string()));
        }
        if stored.template_body == submission.template_body
            && stored.parameters == params(submission)
        {
            return Ok(UpdateResult::NoChanges);
        }
        stored.status = StackStatus::UpdateInProgress;
        stored.template_body = submission.template_body.clone();
        stored.parameters = params(submission);
        Ok(UpdateResult::Started(OperationHandle {
            stack_id: format!("arn:aws:cloudformation:stack/{}", submission.stack_name),
        }))
    }

    async fn list_events(
        &self,
        stack_name: &str,
        since: Option<chrono::DateTime<Utc>>,
    ) -> Result<Vec<StackEvent>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_events += 1;

        let poll = state.calls.list_events;
        if let Some((at, token)) = &state.cancel_on_poll {
            if *at == poll {
                token.cancel();
            }
        }

        match state.steps.pop_front() {
            Some(Step::Fail(err)) => return Err(err),
            Some(Step::Events(batch)) => state.record(stack_name, batch),
            None => {}
        }

        // Like the real service, every call returns the whole matching history
        Ok(state
            .history
            .iter()
            .filter(|e| since.is_none_or(|since| e.timestamp >= since))
            .cloned()
            .collect())
    }

    async fn recent_events(&self, _stack_name: &str) -> Result<Vec<StackEvent>> {
        let mut state = self.state.lock().unwrap();
        state.calls.recent_events += 1;
        Ok(state.history.clone())
    }

    async fn get_outputs(&self, stack_name: &str) -> Result<BTreeMap<String, String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_outputs += 1;
        if !state.stacks.contains_key(stack_name) {
            return Err(CloudError::StackNotFound(stack_name.to_string()));
        }
        Ok(state.outputs.clone())
    }
}
