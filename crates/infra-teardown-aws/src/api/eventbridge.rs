//! EventBridge API surface used by the rule wrapper

use crate::context::AwsContext;
use crate::error::Result;
use aws_sdk_eventbridge::Client;

/// EventBridge client for detaching targets and deleting rules
pub struct EventBridgeClient {
    client: Client,
}

impl EventBridgeClient {
    /// Create an EventBridge client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.eventbridge_client(),
        }
    }

    /// Wrap an existing SDK client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// One page of `ListTargetsByRule`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetPage {
    pub target_ids: Vec<String>,
    pub next_token: Option<String>,
}

/// A target `RemoveTargets` could not detach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveTargetsFailure {
    pub target_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

/// Trait for EventBridge operations that can be mocked in tests.
///
/// Note: The pagination token uses `Option<String>` instead of `Option<&str>`
/// to work around mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait EventBridgeApi: Send + Sync {
    async fn describe_rule(&self, rule_name: &str, event_bus_name: &str) -> Result<()>;

    async fn list_targets_by_rule(
        &self,
        rule_name: &str,
        event_bus_name: &str,
        next_token: Option<String>,
    ) -> Result<TargetPage>;

    /// Detach targets, returning the entries that failed
    async fn remove_targets(
        &self,
        rule_name: &str,
        event_bus_name: &str,
        target_ids: Vec<String>,
    ) -> Result<Vec<RemoveTargetsFailure>>;

    async fn delete_rule(&self, rule_name: &str, event_bus_name: &str) -> Result<()>;
}

impl EventBridgeApi for EventBridgeClient {
    async fn describe_rule(&self, rule_name: &str, event_bus_name: &str) -> Result<()> {
        self.client
            .describe_rule()
            .name(rule_name)
            .event_bus_name(event_bus_name)
            .send()
            .await?;
        Ok(())
    }

    async fn list_targets_by_rule(
        &self,
        rule_name: &str,
        event_bus_name: &str,
        next_token: Option<String>,
    ) -> Result<TargetPage> {
        let output = self
            .client
            .list_targets_by_rule()
            .rule(rule_name)
            .event_bus_name(event_bus_name)
            .set_next_token(next_token)
            .send()
            .await?;
        Ok(TargetPage {
            target_ids: output.targets().iter().map(|t| t.id().to_string()).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn remove_targets(
        &self,
        rule_name: &str,
        event_bus_name: &str,
        target_ids: Vec<String>,
    ) -> Result<Vec<RemoveTargetsFailure>> {
        let output = self
            .client
            .remove_targets()
            .rule(rule_name)
            .event_bus_name(event_bus_name)
            .set_ids(Some(target_ids))
            .send()
            .await?;
        Ok(output
            .failed_entries()
            .iter()
            .map(|e| RemoveTargetsFailure {
                target_id: e.target_id().map(str::to_string),
                error_code: e.error_code().map(str::to_string),
                error_message: e.error_message().map(str::to_string),
            })
            .collect())
    }

    async fn delete_rule(&self, rule_name: &str, event_bus_name: &str) -> Result<()> {
        self.client
            .delete_rule()
            .name(rule_name)
            .event_bus_name(event_bus_name)
            .send()
            .await?;
        Ok(())
    }
}
