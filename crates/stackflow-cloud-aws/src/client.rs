//! CloudFormation-backed provisioning client

use crate::convert::{self, Present};
use crate::error::{self, from_sdk};
use async_trait::async_trait;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::config::Region;
use aws_sdk_cloudformation::types::{Parameter, Stack};
use chrono::{DateTime, Utc};
use stackflow_cloud::{
    CloudError, OperationHandle, ParameterValue, ProvisioningClient, Result, StackDescription,
    StackEvent, Submission, UpdateResult,
};
use std::collections::BTreeMap;

/// [`ProvisioningClient`] talking to AWS CloudFormation
pub struct CloudFormationClient {
    client: Client,
}

impl CloudFormationClient {
    /// Build a client from the default AWS credential and region chain
    pub async fn from_env(region: Option<&str>, profile: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        tracing::debug!(
            "CloudFormation client for region {}",
            config
                .region()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "<unset>".to_string())
        );
        Self::from_client(Client::new(&config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn describe_raw(&self, stack_name: &str) -> Result<Option<Stack>> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(from_sdk);

        match response {
            Ok(output) => Ok(output.stacks().first().cloned()),
            Err(e) if error::is_missing_stack(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn sdk_parameters(values: &[ParameterValue]) -> Vec<Parameter> {
    values
        .iter()
        .map(|p| {
            Parameter::builder()
                .parameter_key(&p.key)
                .parameter_value(&p.value)
                .build()
        })
        .collect()
}

#[async_trait]
impl ProvisioningClient for CloudFormationClient {
    fn name(&self) -> &str {
        "cloudformation"
    }

    async fn describe(&self, stack_name: &str) -> Result<Option<StackDescription>> {
        Ok(self
            .describe_raw(stack_name)
            .await?
            .as_ref()
            .map(convert::stack_description))
    }

    async fn create(&self, submission: &Submission) -> Result<OperationHandle> {
        tracing::debug!("CreateStack {}", submission.stack_name);
        let output = self
            .client
            .create_stack()
            .stack_name(&submission.stack_name)
            .template_body(&submission.template_body)
            .set_parameters(Some(sdk_parameters(&submission.parameters)))
            .send()
            .await
            .map_err(from_sdk)?;

        Ok(OperationHandle {
            stack_id: output
                .stack_id()
                .unwrap_or(&submission.stack_name)
                .to_string(),
        })
    }

    async fn update(&self, submission: &Submission) -> Result<UpdateResult> {
        tracing::debug!("UpdateStack {}", submission.stack_name);
        let response = self
            .client
            .update_stack()
            .stack_name(&submission.stack_name)
            .template_body(&submission.template_body)
            .set_parameters(Some(sdk_parameters(&submission.parameters)))
            .send()
            .await
            .map_err(from_sdk);

        match response {
            Ok(output) => Ok(UpdateResult::Started(OperationHandle {
                stack_id: output
                    .stack_id()
                    .unwrap_or(&submission.stack_name)
                    .to_string(),
            })),
            Err(e) if error::is_no_changes(&e) => Ok(UpdateResult::NoChanges),
            Err(e) => Err(e),
        }
    }

    async fn list_events(
        &self,
        stack_name: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<StackEvent>> {
        // Pages come newest first; stop once a page reaches past `since`
        let mut events = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_stack_events()
                .stack_name(stack_name)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(from_sdk)?;

            let mut reached_since = false;
            for raw in output.stack_events() {
                let event = convert::stack_event(raw);
                if since.is_some_and(|since| event.timestamp < since) {
                    reached_since = true;
                    break;
                }
                events.push(event);
            }

            match output.next_token() {
                Some(token) if !reached_since => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        events.reverse();
        Ok(events)
    }

    async fn recent_events(&self, stack_name: &str) -> Result<Vec<StackEvent>> {
        // The first page holds the newest events
        let output = self
            .client
            .describe_stack_events()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(from_sdk)?;

        let mut events: Vec<StackEvent> = output
            .stack_events()
            .iter()
            .map(convert::stack_event)
            .collect();
        events.reverse();
        Ok(events)
    }

    async fn get_outputs(&self, stack_name: &str) -> Result<BTreeMap<String, String>> {
        let stack = self
            .describe_raw(stack_name)
            .await?
            .ok_or_else(|| CloudError::StackNotFound(stack_name.to_string()))?;

        Ok(stack
            .outputs()
            .iter()
            .filter_map(|output| {
                let key = output.output_key().present()?;
                let value = output.output_value().present()?;
                Some((key.to_string(), value.to_string()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_parameters() {
        let params = sdk_parameters(&[ParameterValue::new("VpcCidr", "10.0.0.0/16")]);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].parameter_key(), Some("VpcCidr"));
        assert_eq!(params[0].parameter_value(), Some("10.0.0.0/16"));
    }
}
