//! Deployment results

use crate::event::StackEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of operation submitted to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Create a new stack
    Create,
    /// Update an existing stack
    Update,
    /// Update with nothing to change
    NoOp,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Create => write!(f, "create"),
            OperationKind::Update => write!(f, "update"),
            OperationKind::NoOp => write!(f, "no-op"),
        }
    }
}

/// How a deployment ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeploymentOutcome {
    /// The stack converged; carries the declared outputs' deployed values
    Succeeded { outputs: BTreeMap<String, String> },

    /// The service rejected or failed the operation (rollbacks included)
    Failed {
        reason: String,
        /// Most relevant failure event, absent for synchronous rejections
        last_event: Option<StackEvent>,
    },

    /// The local wait budget ran out while the stack was still converging
    TimedOut,

    /// The caller stopped waiting; the remote operation keeps running
    Cancelled,
}

impl DeploymentOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            last_event: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

impl std::fmt::Display for DeploymentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded { outputs } => write!(f, "succeeded ({} outputs)", outputs.len()),
            Self::Failed { reason, .. } => write!(f, "failed: {}", reason),
            Self::TimedOut => write!(f, "timed out"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome plus what happened on the way there
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub stack_name: String,

    /// Submitted operation; `None` when nothing was submitted
    pub operation: Option<OperationKind>,

    pub outcome: DeploymentOutcome,

    /// Events observed while polling, oldest first
    pub events: Vec<StackEvent>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl DeploymentReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Number of resource-level events observed
    pub fn resource_event_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| !e.is_stack_event(&self.stack_name))
            .count()
    }
}
