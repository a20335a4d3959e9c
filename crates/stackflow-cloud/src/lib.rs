//! StackFlow Cloud
//!
//! Deploy-and-wait orchestration against a remote provisioning service.
//!
//! A [`DeploymentOrchestrator`] renders a resource graph, decides whether
//! the stack must be created or updated, submits it through a
//! [`ProvisioningClient`], and follows the stack's event stream until it
//! reaches a terminal status, the wait budget runs out, or the caller
//! cancels.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  StackFlow CLI                   │
//! │               (stackflow deploy)                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               stackflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │         DeploymentOrchestrator            │   │
//! │  │  prepare → submit → wait → outcome        │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────────────┐    │
//! │  │ StatusPoller │  │ trait                │    │
//! │  │ (events)     │  │ ProvisioningClient   │    │
//! │  └──────────────┘  └──────────────────────┘    │
//! └─────────────────────────┬───────────────────────┘
//!                           │
//!                   ┌───────▼────────┐
//!                   │ CloudFormation │
//!                   │ (aws-sdk)      │
//!                   └────────────────┘
//! ```

pub mod cancel;
pub mod error;
pub mod event;
pub mod orchestrator;
pub mod outcome;
pub mod poller;
pub mod provider;

// Re-exports
pub use cancel::CancelToken;
pub use error::{CloudError, Result};
pub use event::{STACK_RESOURCE_TYPE, StackEvent, StackStatus};
pub use orchestrator::{
    CONCURRENT_OPERATION, DeployConfig, DeployPhase, DeployProgress, DeploymentOrchestrator,
    DeploymentRequest,
};
pub use outcome::{DeploymentOutcome, DeploymentReport, OperationKind};
pub use poller::StatusPoller;
pub use provider::{
    OperationHandle, ParameterValue, ProvisioningClient, RetryConfig, StackDescription,
    Submission, UpdateResult,
};
