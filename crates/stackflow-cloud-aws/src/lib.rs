//! AWS CloudFormation client for StackFlow
//!
//! Implements [`stackflow_cloud::ProvisioningClient`] on top of
//! `aws-sdk-cloudformation`. Credentials and region come from the usual AWS
//! sources (environment, shared config files, instance metadata), optionally
//! narrowed to a named profile or an explicit region.

mod convert;
mod error;
pub mod client;

pub use client::CloudFormationClient;
