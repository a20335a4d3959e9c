//! Provisioning client trait definition

use crate::error::Result;
use crate::event::{StackEvent, StackStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

/// Remote provisioning service abstraction
///
/// The orchestrator only talks to the service through this trait, so the
/// transport (SDK, CLI wrapper, test double) is interchangeable.
#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    /// Returns the client name (e.g., "cloudformation")
    fn name(&self) -> &str;

    /// Current state of the stack, or `None` if it does not exist
    async fn describe(&self, stack_name: &str) -> Result<Option<StackDescription>>;

    /// Start creating a new stack
    async fn create(&self, submission: &Submission) -> Result<OperationHandle>;

    /// Start updating an existing stack
    async fn update(&self, submission: &Submission) -> Result<UpdateResult>;

    /// Events for the stack, oldest first, optionally only those at or after `since`
    async fn list_events(
        &self,
        stack_name: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<StackEvent>>;

    /// The newest events for the stack, oldest first.
    ///
    /// Taken before an update so its events can be told apart from earlier
    /// operations without comparing against the local clock. The default
    /// reads the whole history.
    async fn recent_events(&self, stack_name: &str) -> Result<Vec<StackEvent>> {
        self.list_events(stack_name, None).await
    }

    /// Output values of a deployed stack
    async fn get_outputs(&self, stack_name: &str) -> Result<BTreeMap<String, String>>;
}

/// Stack state as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackDescription {
    pub stack_id: String,
    pub stack_name: String,
    pub status: StackStatus,
    pub status_reason: Option<String>,
}

/// A deploy-time parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub key: String,
    pub value: String,
}

impl ParameterValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Template and parameters sent with a create or update call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub stack_name: String,

    /// Rendered template body
    pub template_body: String,

    pub parameters: Vec<ParameterValue>,
}

/// Handle to an operation the service accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationHandle {
    pub stack_id: String,
}

/// Result of an update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    Started(OperationHandle),
    /// The template and parameters match what is deployed
    NoChanges,
}

/// Retry configuration for transient provider failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Initial delay between retries
    #[serde(with = "duration_millis")]
    pub initial_delay: Duration,

    /// Maximum delay between retries
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Delay to wait after the given (zero-based) failed attempt.
    ///
    /// Never exceeds `max_delay`; a multiplier that yields a negative or
    /// non-finite delay falls back to `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        match Duration::try_from_secs_f64(delay) {
            Ok(delay) => delay.min(self.max_delay),
            Err(_) => self.max_delay,
        }
    }

    /// Run `op`, retrying transient failures with exponential backoff.
    ///
    /// Non-transient errors are returned immediately. After `max_attempts`
    /// the last transient error is returned.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what,
                        attempt + 1,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
